//! # Two-Sample Kolmogorov–Smirnov Test on Sketches
//!
//! ## Statistic
//!
//! For two distributions summarized by quantile sketches A and B:
//!
//! ```text
//! D = sup_x |F_A(x) − F_B(x)|
//! ```
//!
//! evaluated at every retained item of either sketch. Between retained items
//! both step CDFs are constant, so the supremum is attained on that set.
//!
//! ## Asymptotic p-value
//!
//! With effective sample sizes n, m the scaled statistic is
//! `t = D · sqrt(n·m / (n + m))` and
//!
//! ```text
//! P(T > t) = 2 Σ_{i≥1} (−1)^{i−1} exp(−2 i² t²)
//! ```
//!
//! The alternating series converges slowly for small t, so below
//! `SMALL_T_SWITCH` the Jacobi-theta form of the CDF is used instead:
//!
//! ```text
//! K(t) = sqrt(2π)/t · Σ_{i≥1} exp(−(2i−1)² π² / (8 t²)),   P = 1 − K(t)
//! ```

use std::cmp::Ordering;

use super::quantile_sketch::QuantileSketch;

/// Below this t the theta-function form converges in four terms.
const SMALL_T_SWITCH: f64 = 1.18;

/// Terms summed on either branch; both are below 1e-16 past this.
const SERIES_TERMS: u32 = 4;

/// Outcome of one sketch-vs-sketch KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub n_reference: u64,
    pub n_window: u64,
}

/// Maximum CDF gap between two sketches. Zero if either is empty.
#[must_use]
pub fn ks_delta(a: &QuantileSketch, b: &QuantileSketch) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let va = a.sorted_view();
    let vb = b.sorted_view();
    let na = a.n() as f64;
    let nb = b.n() as f64;
    let (mut i, mut j) = (0usize, 0usize);
    let (mut ca, mut cb) = (0u64, 0u64);
    let mut delta = 0.0f64;

    loop {
        let x = match (va.get(i), vb.get(j)) {
            (Some(&(x, _)), Some(&(y, _))) => {
                if x.total_cmp(&y) == Ordering::Greater {
                    y
                } else {
                    x
                }
            }
            (Some(&(x, _)), None) => x,
            (None, Some(&(y, _))) => y,
            (None, None) => break,
        };
        while let Some(&(v, w)) = va.get(i) {
            if v.total_cmp(&x) == Ordering::Greater {
                break;
            }
            ca += w;
            i += 1;
        }
        while let Some(&(v, w)) = vb.get(j) {
            if v.total_cmp(&x) == Ordering::Greater {
                break;
            }
            cb += w;
            j += 1;
        }
        delta = delta.max((ca as f64 / na - cb as f64 / nb).abs());
    }
    delta
}

/// Survival function of the Kolmogorov distribution, `P(T > t)`.
#[must_use]
pub fn kolmogorov_survival(t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return 1.0;
    }
    if t < SMALL_T_SWITCH {
        let y = (-std::f64::consts::PI * std::f64::consts::PI / (8.0 * t * t)).exp();
        let mut sum = 0.0;
        for i in 1..=SERIES_TERMS {
            let odd = f64::from(2 * i - 1);
            sum += y.powf(odd * odd);
        }
        let cdf = (2.0 * std::f64::consts::PI).sqrt() / t * sum;
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let x = (-2.0 * t * t).exp();
        let mut sum = 0.0;
        let mut sign = 1.0;
        for i in 1..=SERIES_TERMS {
            sum += sign * x.powf(f64::from(i * i));
            sign = -sign;
        }
        (2.0 * sum).clamp(0.0, 1.0)
    }
}

/// Asymptotic two-sample p-value for statistic `d` at sample sizes `n`, `m`.
#[must_use]
pub fn ks_p_value(d: f64, n: u64, m: u64) -> f64 {
    if n == 0 || m == 0 {
        return 1.0;
    }
    let (n, m) = (n as f64, m as f64);
    kolmogorov_survival(d * (n * m / (n + m)).sqrt())
}

/// Compare a window sketch against a long-running reference sketch.
///
/// The reference's effective size is capped at its `k`: beyond that the
/// sketch no longer carries independent per-item information. Returns
/// `None` when either side is empty.
#[must_use]
pub fn ks_test(reference: &QuantileSketch, window: &QuantileSketch) -> Option<KsOutcome> {
    if reference.is_empty() || window.is_empty() {
        return None;
    }
    let statistic = ks_delta(reference, window);
    let n_reference = (reference.k() as u64).min(reference.n());
    let n_window = window.n();
    Some(KsOutcome {
        statistic,
        p_value: ks_p_value(statistic, n_reference, n_window),
        n_reference,
        n_window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sketches_have_zero_gap() {
        let a = QuantileSketch::from_values(64, (0..100).map(f64::from));
        let b = QuantileSketch::from_values(64, (0..100).map(f64::from));
        assert_eq!(ks_delta(&a, &b), 0.0);
        let out = ks_test(&a, &b).unwrap();
        assert_eq!(out.p_value, 1.0);
    }

    #[test]
    fn disjoint_supports_have_unit_gap() {
        let a = QuantileSketch::from_values(64, (0..50).map(f64::from));
        let b = QuantileSketch::from_values(64, (100..150).map(f64::from));
        assert!((ks_delta(&a, &b) - 1.0).abs() < 1e-12);
        assert!(ks_test(&a, &b).unwrap().p_value < 1e-9);
    }

    #[test]
    fn half_shift_gives_half_gap() {
        let a = QuantileSketch::from_values(64, (0..100).map(f64::from));
        let b = QuantileSketch::from_values(64, (50..150).map(f64::from));
        assert!((ks_delta(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn gap_is_symmetric() {
        let a = QuantileSketch::from_values(64, [1.0, 2.0, 2.0, 7.0]);
        let b = QuantileSketch::from_values(64, [2.0, 3.0, 9.0]);
        assert_eq!(ks_delta(&a, &b), ks_delta(&b, &a));
    }

    #[test]
    fn survival_matches_critical_values() {
        // Classical asymptotic critical values.
        assert!((kolmogorov_survival(1.358_1) - 0.05).abs() < 1e-3);
        assert!((kolmogorov_survival(1.627_6) - 0.01).abs() < 5e-4);
        assert!((kolmogorov_survival(1.223_9) - 0.10).abs() < 1e-3);
    }

    #[test]
    fn survival_is_continuous_at_branch_switch() {
        let below = kolmogorov_survival(SMALL_T_SWITCH - 1e-9);
        let above = kolmogorov_survival(SMALL_T_SWITCH);
        assert!((below - above).abs() < 1e-6, "{below} vs {above}");
    }

    #[test]
    fn survival_is_monotone_and_bounded() {
        let mut prev = 1.0;
        for step in 0..400 {
            let t = f64::from(step) * 0.01;
            let p = kolmogorov_survival(t);
            assert!((0.0..=1.0).contains(&p));
            assert!(p <= prev + 1e-12, "t={t}");
            prev = p;
        }
        assert_eq!(kolmogorov_survival(0.0), 1.0);
        assert_eq!(kolmogorov_survival(f64::NAN), 1.0);
    }

    #[test]
    fn reference_size_is_capped_at_k() {
        let reference = QuantileSketch::from_values(16, (0..1_000).map(f64::from));
        let window = QuantileSketch::from_values(64, (0..50).map(f64::from));
        let out = ks_test(&reference, &window).unwrap();
        assert_eq!(out.n_reference, 16);
        assert_eq!(out.n_window, 50);
    }

    #[test]
    fn empty_side_yields_no_test() {
        let empty = QuantileSketch::new(8);
        let full = QuantileSketch::from_values(8, [1.0]);
        assert!(ks_test(&empty, &full).is_none());
        assert!(ks_test(&full, &empty).is_none());
        assert_eq!(ks_p_value(0.9, 0, 10), 1.0);
    }
}
