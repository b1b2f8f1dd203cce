//! Post-run constraint checker.
//!
//! The verifier works from the schedule log alone (plus the immutable slice descriptions), so it
//! re-derives every fact instead of trusting the scheduler's own bookkeeping. It checks:
//! - every packet of every slice appears exactly once in the log
//! - per slice, end times are nondecreasing in packet-id order
//! - no packet ends before it arrives
//! - end times are nondecreasing in commit order (single-port serialization)
//! - per slice, the achieved bandwidth reaches the tolerated fraction of the guarantee

use crate::config::VerifierConfig;
use crate::scheduler::{Outcome, ScheduleEntry};
use crate::slice::{bandwidth_bps, SliceState};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A single broken invariant found by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A packet has no entry in the log.
    MissingPacket { slice_id: usize, packet_id: usize },
    /// A packet appears more than once, or the entry names a packet that does not exist.
    UnknownOrDuplicateEntry { slice_id: usize, packet_id: usize },
    /// A packet finished before the previous packet of its slice.
    OutOfOrder {
        slice_id: usize,
        packet_id: usize,
        end_time: u64,
        previous_end: u64,
    },
    /// A packet finished before it arrived.
    DepartureBeforeArrival {
        slice_id: usize,
        packet_id: usize,
        end_time: u64,
        arrival_time: u64,
    },
    /// Commit `position` ends earlier than the commit before it.
    CommitOrderRegression {
        position: usize,
        end_time: u64,
        previous_end: u64,
    },
    /// The slice's achieved bandwidth fell below the tolerated floor.
    BandwidthShortfall {
        slice_id: usize,
        achieved_bps: f64,
        required_bps: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Violation::MissingPacket {
                slice_id,
                packet_id,
            } => write!(f, "packet {slice_id}/{packet_id} was never scheduled"),
            Violation::UnknownOrDuplicateEntry {
                slice_id,
                packet_id,
            } => write!(f, "log entry {slice_id}/{packet_id} is unknown or repeated"),
            Violation::OutOfOrder {
                slice_id,
                packet_id,
                end_time,
                previous_end,
            } => write!(
                f,
                "packet {slice_id}/{packet_id} ends at {end_time}ns, before its predecessor ({previous_end}ns)"
            ),
            Violation::DepartureBeforeArrival {
                slice_id,
                packet_id,
                end_time,
                arrival_time,
            } => write!(
                f,
                "packet {slice_id}/{packet_id} ends at {end_time}ns but arrives at {arrival_time}ns"
            ),
            Violation::CommitOrderRegression {
                position,
                end_time,
                previous_end,
            } => write!(
                f,
                "commit #{position} ends at {end_time}ns, before the previous commit ({previous_end}ns)"
            ),
            Violation::BandwidthShortfall {
                slice_id,
                achieved_bps,
                required_bps,
            } => write!(
                f,
                "slice {slice_id} achieved {achieved_bps:.0} bps, below the required {required_bps:.0} bps"
            ),
        }
    }
}

/// Result of verifying one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub violations: Vec<Violation>,
}

impl Verification {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks a finished schedule against the ordering, deadline and bandwidth constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn verify_outcome(&self, outcome: &Outcome) -> Verification {
        self.verify(&outcome.slices, &outcome.log)
    }

    /// Verify `log` (in commit order) against the slices it was produced from.
    pub fn verify(&self, slices: &[SliceState], log: &[ScheduleEntry]) -> Verification {
        let mut violations = Vec::new();

        // (c) single-port serialization in commit order
        for (position, pair) in log.windows(2).enumerate() {
            if pair[1].end_time < pair[0].end_time {
                violations.push(Violation::CommitOrderRegression {
                    position: position + 1,
                    end_time: pair[1].end_time,
                    previous_end: pair[0].end_time,
                });
            }
        }

        // Per-slice end times indexed by packet id.
        let mut end_times: Vec<Vec<Option<u64>>> =
            slices.iter().map(|slice| vec![None; slice.len()]).collect();
        for entry in log {
            let slot = end_times
                .get_mut(entry.slice_id)
                .and_then(|ends| ends.get_mut(entry.packet_id));
            match slot {
                Some(slot) if slot.is_none() => *slot = Some(entry.end_time),
                _ => violations.push(Violation::UnknownOrDuplicateEntry {
                    slice_id: entry.slice_id,
                    packet_id: entry.packet_id,
                }),
            }
        }

        for (slice, ends) in slices.iter().zip(&end_times) {
            self.verify_slice(slice, ends, &mut violations);
        }

        for violation in &violations {
            warn!(%violation, "schedule verification failed");
        }
        Verification { violations }
    }

    fn verify_slice(
        &self,
        slice: &SliceState,
        ends: &[Option<u64>],
        violations: &mut Vec<Violation>,
    ) {
        let slice_id = slice.slice_id;
        let mut previous_end = 0;
        let mut total_bits = 0u128;
        let mut first_arrival: Option<u64> = None;
        let mut last_departure = 0;

        // (a) completeness and per-slice monotonicity, (b) no departure before arrival
        for (packet, end) in slice.packets().iter().zip(ends) {
            let Some(end_time) = *end else {
                violations.push(Violation::MissingPacket {
                    slice_id,
                    packet_id: packet.packet_id,
                });
                continue;
            };
            if end_time < packet.arrival_time {
                violations.push(Violation::DepartureBeforeArrival {
                    slice_id,
                    packet_id: packet.packet_id,
                    end_time,
                    arrival_time: packet.arrival_time,
                });
            }
            if end_time < previous_end {
                violations.push(Violation::OutOfOrder {
                    slice_id,
                    packet_id: packet.packet_id,
                    end_time,
                    previous_end,
                });
            }
            previous_end = previous_end.max(end_time);
            total_bits += u128::from(packet.size_bits);
            let arrival = packet.arrival_time;
            first_arrival = Some(first_arrival.map_or(arrival, |first| first.min(arrival)));
            last_departure = last_departure.max(end_time);
        }

        // (d) bandwidth guarantee
        let Some(first_arrival) = first_arrival else {
            return;
        };
        let duration = last_departure.saturating_sub(first_arrival);
        if duration == 0 {
            return;
        }
        let achieved_bps = bandwidth_bps(total_bits, duration);
        let required_bps = self.config.bandwidth_tolerance * slice.guaranteed_bps;
        if achieved_bps < required_bps {
            violations.push(Violation::BandwidthShortfall {
                slice_id,
                achieved_bps,
                required_bps,
            });
        }
    }
}
