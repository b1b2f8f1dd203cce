//! Priority scoring and admission feasibility.
//!
//! Priority of an admissible packet at clock `now`:
//!
//! ```text
//! deadlineSlack = max(1, maxDelay - (now - arrival))
//! priority      = Wu / deadlineSlack + We * sizeBits / transmissionTime + Wf * (1 - usageRatio)
//! ```
//!
//! Feasibility projects the packet onto the port at the earliest instant it could legally start
//! (`max(now, arrival, slice.lastDeparture)`) and accepts it only if the projected delay stays
//! within the slice's bound and the projected achieved bandwidth stays above the tolerated fraction
//! of its guarantee.

use crate::config::{FeasibilityConfig, PriorityWeights};
use crate::packet::{Packet, Transmission};
use crate::slice::SliceState;
use crate::transmission::TransmissionModel;
use serde::{Deserialize, Serialize};

/// Why a candidate cannot be admitted at the current clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Infeasibility {
    /// The packet would finish after its slice's latency bound.
    Deadline { projected_delay: u64, max_delay: u64 },
    /// The slice's achieved bandwidth would fall below the tolerated floor.
    Bandwidth { projected_bps: f64, required_bps: f64 },
}

/// Scores packets and decides whether they may enter the ready queue.
#[derive(Debug, Clone, Copy)]
pub struct PriorityEvaluator {
    model: TransmissionModel,
    weights: PriorityWeights,
    feasibility: FeasibilityConfig,
}

impl PriorityEvaluator {
    pub fn new(
        model: TransmissionModel,
        weights: PriorityWeights,
        feasibility: FeasibilityConfig,
    ) -> Self {
        Self {
            model,
            weights,
            feasibility,
        }
    }

    pub fn model(&self) -> &TransmissionModel {
        &self.model
    }

    /// Combined urgency/efficiency/fairness score; higher is scheduled sooner.
    pub fn priority(&self, slice: &SliceState, packet: &Packet, now: u64) -> f64 {
        let waited = now.saturating_sub(packet.arrival_time) as i128;
        let slack = (slice.max_delay as i128 - waited).max(1);
        let urgency = 1.0 / slack as f64;
        let efficiency = self.model.efficiency(packet.size_bits);
        let fairness = 1.0 - slice.bandwidth_usage_ratio();

        self.weights.urgency * urgency
            + self.weights.efficiency * efficiency
            + self.weights.fairness * fairness
    }

    /// Where `packet` would sit on the port if committed as early as legally possible.
    pub fn project(&self, slice: &SliceState, packet: &Packet, now: u64) -> Transmission {
        let start = slice.earliest_start(now, packet);
        let end = start.saturating_add(self.model.transmission_time(packet.size_bits));
        Transmission { start, end }
    }

    /// Admission test: deadline first, then the bandwidth floor.
    ///
    /// # Returns
    /// The projected transmission when admissible, the first failed constraint otherwise.
    pub fn check(
        &self,
        slice: &SliceState,
        packet: &Packet,
        now: u64,
    ) -> Result<Transmission, Infeasibility> {
        let projected = self.project(slice, packet, now);

        let projected_delay = projected.end - packet.arrival_time;
        let allowed_delay = slice.max_delay as f64 * self.feasibility.deadline_tolerance;
        if projected_delay as f64 > allowed_delay {
            return Err(Infeasibility::Deadline {
                projected_delay,
                max_delay: slice.max_delay,
            });
        }

        if let Some(projected_bps) = slice.projected_bandwidth(packet, projected.end) {
            let required_bps = slice.guaranteed_bps * self.feasibility.bandwidth_tolerance;
            if projected_bps < required_bps {
                return Err(Infeasibility::Bandwidth {
                    projected_bps,
                    required_bps,
                });
            }
        }

        Ok(projected)
    }
}
