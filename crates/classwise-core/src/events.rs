//! Engine events and the bounded ring that buffers them.
//!
//! The engine performs no I/O; callers drain events after each step (or
//! whenever convenient) and log them. When the ring is full the oldest
//! event is discarded and counted.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Result of one scheduled drift check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Stable,
    Drift,
    /// Fewer admissible tests than the configured minimum.
    InsufficientEvidence,
}

impl CheckOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Drift => "drift",
            Self::InsufficientEvidence => "insufficient_evidence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    DriftCheck {
        step: u64,
        class: usize,
        positive_seen: u64,
        tests: usize,
        skipped: usize,
        rejected: usize,
        min_adjusted_p: f64,
        outcome: CheckOutcome,
    },
    DriftReset {
        step: u64,
        class: usize,
        class_drifts: u64,
        total_drifts: u64,
        retrained_on: usize,
        negatives_trained: usize,
        negatives_skipped: usize,
    },
}

impl EngineEvent {
    #[must_use]
    pub fn step(&self) -> u64 {
        match self {
            Self::DriftCheck { step, .. } | Self::DriftReset { step, .. } => *step,
        }
    }

    #[must_use]
    pub fn class(&self) -> usize {
        match self {
            Self::DriftCheck { class, .. } | Self::DriftReset { class, .. } => *class,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DriftCheck { .. } => "drift_check",
            Self::DriftReset { .. } => "drift_reset",
        }
    }
}

/// Slots reserved up front; larger rings grow on demand.
const RESERVE: usize = 1024;

/// Fixed-capacity event ring.
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    events: VecDeque<EngineEvent>,
    dropped: u64,
}

impl EventLog {
    /// `capacity` below 1 is raised to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity.min(RESERVE)),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: EngineEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because the ring was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset(step: u64) -> EngineEvent {
        EngineEvent::DriftReset {
            step,
            class: 1,
            class_drifts: 1,
            total_drifts: 1,
            retrained_on: 50,
            negatives_trained: 50,
            negatives_skipped: 0,
        }
    }

    #[test]
    fn ring_discards_oldest() {
        let mut log = EventLog::new(2);
        log.push(reset(1));
        log.push(reset(2));
        log.push(reset(3));
        assert_eq!(log.dropped(), 1);
        let steps: Vec<u64> = log.drain().iter().map(EngineEvent::step).collect();
        assert_eq!(steps, vec![2, 3]);
        assert!(log.is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = EngineEvent::DriftCheck {
            step: 500,
            class: 0,
            positive_seen: 250,
            tests: 3,
            skipped: 1,
            rejected: 0,
            min_adjusted_p: 0.4,
            outcome: CheckOutcome::Stable,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "drift_check");
        assert_eq!(json["outcome"], "stable");
        let back: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(reset(7).kind(), "drift_reset");
    }
}
