//! # Quantile Sketch
//!
//! Bounded-memory, mergeable summary of a stream of `f64` values supporting
//! rank/CDF queries and a two-sample KS distance (see `ks.rs`).
//!
//! ## Structure
//!
//! The sketch follows the classic compacting-buffer layout:
//!
//! ```text
//! base buffer : up to 2k unsorted items, weight 1
//! level i     : exactly k sorted items or empty, weight 2^(i+1)
//! ```
//!
//! When the base buffer reaches 2k items it is sorted and **compacted**:
//! every other item is kept (alternating the starting offset between
//! compactions), yielding k items of weight 2 that are carried into level 0.
//! A carry landing on an occupied level is merged with the resident items
//! (2k sorted items of equal weight), compacted again and carried upward,
//! exactly like incrementing a binary counter.
//!
//! ## Key Invariants
//!
//! 1. Total retained weight equals `n`: each compaction halves the item
//!    count and doubles the weight.
//! 2. Retained items ≤ 2k + k·L where L = number of levels ≤ ⌈log₂(n/2k)⌉ + 1.
//!    Since `n` is a `u64`, L < 64 and the footprint is bounded by a
//!    function of `k` alone.
//! 3. Rank error is O(1/k) of `n` with the alternating offset.

use std::cmp::Ordering;

use thiserror::Error;

/// Smallest accepted `k`.
pub const MIN_K: usize = 2;

/// Largest `k` a run configuration accepts.
pub const MAX_K: usize = 1 << 20;

/// Base buffer slots reserved up front; larger buffers grow on demand.
const BASE_RESERVE: usize = 4096;

/// Levels that a `u64` count can ever occupy.
const MAX_LEVELS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot merge a k={other} sketch into a k={this} sketch")]
pub struct SketchMismatch {
    pub this: usize,
    pub other: usize,
}

/// Compacting quantile sketch over finite `f64` values.
#[derive(Debug, Clone)]
pub struct QuantileSketch {
    k: usize,
    n: u64,
    /// Unsorted recent items, weight 1.
    base: Vec<f64>,
    /// Level i holds k sorted items of weight 2^(i+1), or nothing.
    levels: Vec<Vec<f64>>,
    min: f64,
    max: f64,
    /// Which half a compaction keeps; flips on every compaction.
    odd_offset: bool,
}

impl QuantileSketch {
    /// Create an empty sketch. `k` below [`MIN_K`] is raised to it.
    #[must_use]
    pub fn new(k: usize) -> Self {
        let k = k.max(MIN_K);
        Self {
            k,
            n: 0,
            base: Vec::with_capacity(k.saturating_mul(2).min(BASE_RESERVE)),
            levels: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            odd_offset: false,
        }
    }

    /// Build a sketch from a batch of values.
    #[must_use]
    pub fn from_values(k: usize, values: impl IntoIterator<Item = f64>) -> Self {
        let mut sketch = Self::new(k);
        for v in values {
            sketch.update(v);
        }
        sketch
    }

    /// Upper bound on retained items for a sketch with parameter `k`.
    #[must_use]
    pub fn retained_bound(k: usize) -> usize {
        let k = k.max(MIN_K);
        k.saturating_mul(2 + MAX_LEVELS)
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of values absorbed.
    #[must_use]
    pub fn n(&self) -> u64 {
        self.n
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Items currently held in memory.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.base.len() + self.levels.iter().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn min(&self) -> Option<f64> {
        (self.n > 0).then_some(self.min)
    }

    #[must_use]
    pub fn max(&self) -> Option<f64> {
        (self.n > 0).then_some(self.max)
    }

    /// Insert one value. Non-finite values are ignored.
    pub fn update(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.n += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.base.push(value);
        if self.base.len() >= self.k.saturating_mul(2) {
            let mut full = std::mem::take(&mut self.base);
            full.sort_by(f64::total_cmp);
            let carry = self.halve(&full);
            full.clear();
            self.base = full;
            self.carry_into(carry, 0);
        }
    }

    /// Fold `other` into `self`. Both sketches must share `k`.
    pub fn merge(&mut self, other: &Self) -> Result<(), SketchMismatch> {
        if other.k != self.k {
            return Err(SketchMismatch {
                this: self.k,
                other: other.k,
            });
        }
        if other.is_empty() {
            return Ok(());
        }
        for (level, items) in other.levels.iter().enumerate() {
            if !items.is_empty() {
                self.n += (items.len() as u64) << (level + 1);
                self.carry_into(items.clone(), level);
            }
        }
        for &v in &other.base {
            self.update(v);
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        Ok(())
    }

    /// Drop all state, keeping `k`.
    pub fn reset(&mut self) {
        self.n = 0;
        self.base.clear();
        self.levels.clear();
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
        self.odd_offset = false;
    }

    /// Retained `(value, weight)` pairs sorted by value.
    #[must_use]
    pub fn sorted_view(&self) -> Vec<(f64, u64)> {
        let mut view: Vec<(f64, u64)> = Vec::with_capacity(self.retained());
        view.extend(self.base.iter().map(|&v| (v, 1)));
        for (level, items) in self.levels.iter().enumerate() {
            let weight = 1u64 << (level + 1);
            view.extend(items.iter().map(|&v| (v, weight)));
        }
        view.sort_by(|a, b| a.0.total_cmp(&b.0));
        view
    }

    /// Approximate fraction of absorbed values `<= value`.
    #[must_use]
    pub fn cdf(&self, value: f64) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let below: u64 = self
            .sorted_view()
            .iter()
            .take_while(|(v, _)| v.total_cmp(&value) != Ordering::Greater)
            .map(|&(_, w)| w)
            .sum();
        below as f64 / self.n as f64
    }

    /// Approximate value at normalized rank `rank` in `[0, 1]`.
    #[must_use]
    pub fn quantile(&self, rank: f64) -> Option<f64> {
        if self.n == 0 {
            return None;
        }
        let rank = rank.clamp(0.0, 1.0);
        if rank == 0.0 {
            return Some(self.min);
        }
        if rank == 1.0 {
            return Some(self.max);
        }
        let target = (rank * self.n as f64).ceil() as u64;
        let mut cumulative = 0u64;
        for (v, w) in self.sorted_view() {
            cumulative += w;
            if cumulative >= target {
                return Some(v);
            }
        }
        Some(self.max)
    }

    fn halve(&mut self, sorted: &[f64]) -> Vec<f64> {
        let offset = usize::from(self.odd_offset);
        self.odd_offset = !self.odd_offset;
        sorted.iter().skip(offset).step_by(2).copied().collect()
    }

    fn carry_into(&mut self, mut carry: Vec<f64>, mut level: usize) {
        loop {
            while self.levels.len() <= level {
                self.levels.push(Vec::new());
            }
            if self.levels[level].is_empty() {
                self.levels[level] = carry;
                return;
            }
            let resident = std::mem::take(&mut self.levels[level]);
            let merged = merge_sorted(&resident, &carry);
            carry = self.halve(&merged);
            level += 1;
        }
    }
}

fn merge_sorted(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].total_cmp(&b[j]) != Ordering::Greater {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
