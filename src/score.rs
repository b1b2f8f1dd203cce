//! Composite quality score of a finished run.
//!
//! ```text
//! score = satisfiedSlices / totalSlices + latency_numerator / maxDelay
//! ```
//!
//! `maxDelay` is the worst `endTime - arrivalTime` over all committed packets. A slice is satisfied
//! when every one of its packets was committed within the slice's own bound. The score is 0 when
//! the schedule is incomplete, when verification failed, or when `maxDelay` is 0.

use crate::config::ScoreConfig;
use crate::scheduler::Outcome;
use crate::verifier::Verification;
use serde::{Deserialize, Serialize};

/// Why a run scored 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZeroReason {
    /// Fewer packets were committed than submitted.
    IncompleteSchedule { committed: usize, submitted: usize },
    /// The verifier reported at least one violation.
    VerificationFailed { violations: usize },
    /// No committed packet had a positive delay.
    NoDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub satisfied_slices: usize,
    pub total_slices: usize,
    /// Worst observed delay in nanoseconds over committed packets.
    pub max_delay: u64,
    /// Set when `value` was forced to 0.
    pub zero_reason: Option<ZeroReason>,
}

impl Score {
    /// Fraction of slices whose packets all met their own bound.
    pub fn satisfied_ratio(&self) -> f64 {
        if self.total_slices == 0 {
            0.0
        } else {
            self.satisfied_slices as f64 / self.total_slices as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCalculator {
    config: ScoreConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, outcome: &Outcome, verification: &Verification) -> Score {
        let max_delay = outcome
            .log
            .iter()
            .map(|entry| {
                let arrival = outcome.slices[entry.slice_id]
                    .packet(entry.packet_id)
                    .arrival_time;
                entry.end_time.saturating_sub(arrival)
            })
            .max()
            .unwrap_or(0);

        let satisfied_slices = outcome
            .slices
            .iter()
            .filter(|slice| {
                slice.packets().iter().all(|packet| {
                    packet
                        .delay()
                        .is_some_and(|delay| delay <= slice.max_delay)
                })
            })
            .count();

        let submitted = outcome.submitted();
        let committed = outcome.committed();
        let zero_reason = if committed < submitted {
            Some(ZeroReason::IncompleteSchedule {
                committed,
                submitted,
            })
        } else if !verification.passed() {
            Some(ZeroReason::VerificationFailed {
                violations: verification.violations.len(),
            })
        } else if max_delay == 0 {
            Some(ZeroReason::NoDelay)
        } else {
            None
        };

        let mut score = Score {
            value: 0.0,
            satisfied_slices,
            total_slices: outcome.slices.len(),
            max_delay,
            zero_reason,
        };
        if zero_reason.is_none() {
            score.value =
                score.satisfied_ratio() + self.config.latency_numerator / max_delay as f64;
        }
        score
    }
}
