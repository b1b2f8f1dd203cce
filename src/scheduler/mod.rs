//! Discrete-event scheduler for slices sharing one output port.
//!
//! The scheduler owns every slice (and through them every packet) and drives a logical clock in
//! nanoseconds. Each [`Scheduler::step`] goes through the same phases:
//!
//! 1. **Admitting**: every slice whose legal next packet has arrived hands it to the feasibility
//!    check. Admissible packets enter the [`ReadyQueue`], the others the [`DeferralSet`]. The
//!    cursor advances either way, and the slice stays blocked until that packet is resolved.
//! 2. **Re-admitting**: deferred packets are checked again against the current clock.
//! 3. **Committing**: the best ready packet is placed on the port at
//!    `max(now, arrival, slice.lastDeparture)` and the clock jumps to its end time.
//! 4. **Idle-advancing**: with nothing ready, the clock jumps to the next arrival among unblocked
//!    slices. When no arrival is left but packets are still deferred, those packets (and every later
//!    packet of their slices) are finalized as missed.
//!
//! The run ends once every packet is either committed or missed.

pub mod deferral;
pub mod priority;
pub mod ready_queue;

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::packet::{Packet, PacketRef, Transmission};
use crate::scenario::Scenario;
use crate::slice::SliceState;
use crate::transmission::TransmissionModel;
use deferral::DeferralSet;
use priority::{Infeasibility, PriorityEvaluator};
use ready_queue::{ReadyEntry, ReadyQueue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One committed transmission as it appears in the schedule log.
///
/// Field order matters: the derived ordering sorts by end time, then slice, then packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub end_time: u64,
    pub slice_id: usize,
    pub packet_id: usize,
}

/// Why a packet was never committed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissReason {
    /// Its projected delay exceeded the slice's bound at every reachable start time.
    DeadlineUnattainable { projected_delay: u64, max_delay: u64 },
    /// Committing it would have left the slice below its bandwidth floor.
    BandwidthShortfall { projected_bps: f64, required_bps: f64 },
    /// An earlier packet of the same slice was missed, so FIFO order forbids sending it.
    BlockedBehindMiss { blocking_packet: usize },
}

impl From<Infeasibility> for MissReason {
    fn from(reason: Infeasibility) -> Self {
        match reason {
            Infeasibility::Deadline {
                projected_delay,
                max_delay,
            } => MissReason::DeadlineUnattainable {
                projected_delay,
                max_delay,
            },
            Infeasibility::Bandwidth {
                projected_bps,
                required_bps,
            } => MissReason::BandwidthShortfall {
                projected_bps,
                required_bps,
            },
        }
    }
}

/// A packet reported as missed at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissedPacket {
    pub slice_id: usize,
    pub packet_id: usize,
    pub arrival_time: u64,
    pub reason: MissReason,
}

/// What a single [`Scheduler::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A packet was committed to the port.
    Committed(ScheduleEntry),
    /// Nothing was ready; the clock jumped forward to the next arrival.
    Advanced { from: u64, to: u64 },
    /// No progress was possible; this many packets were finalized as missed.
    Finalized { missed: usize },
    /// Every packet is committed or missed.
    Finished,
}

/// Single-port scheduler state for one run.
#[derive(Debug)]
pub struct Scheduler {
    evaluator: PriorityEvaluator,
    slices: Vec<SliceState>,
    current_time: u64,
    log: Vec<ScheduleEntry>,
    ready: ReadyQueue,
    deferred: DeferralSet,
    missed: Vec<MissedPacket>,
}

impl Scheduler {
    /// Create a scheduler over `slices`, which must be listed by slice id
    /// (`slices[i].slice_id == i`).
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] when the configuration fails validation or a slice is out of place.
    pub fn new(
        model: TransmissionModel,
        slices: Vec<SliceState>,
        config: &SchedulerConfig,
    ) -> Result<Self> {
        config.validate()?;
        if let Some((position, slice)) = slices
            .iter()
            .enumerate()
            .find(|(position, slice)| slice.slice_id != *position)
        {
            return Err(Error::InvalidConfig(format!(
                "slice with id {} listed at position {position}",
                slice.slice_id
            )));
        }

        let total: usize = slices.iter().map(SliceState::len).sum();
        Ok(Self {
            evaluator: PriorityEvaluator::new(model, config.weights, config.feasibility),
            slices,
            current_time: 0,
            log: Vec::with_capacity(total),
            ready: ReadyQueue::new(),
            deferred: DeferralSet::new(),
            missed: Vec::new(),
        })
    }

    /// Build a scheduler from a parsed scenario, validating every bandwidth and arrival order.
    pub fn from_scenario(scenario: &Scenario, config: &SchedulerConfig) -> Result<Self> {
        let model = TransmissionModel::from_gbps(scenario.port_bandwidth_gbps)?;
        let slices = scenario
            .slices
            .iter()
            .enumerate()
            .map(|(slice_id, spec)| {
                SliceState::new(
                    slice_id,
                    spec.bandwidth_gbps,
                    spec.max_delay_ns,
                    &spec.packets,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(model, slices, config)
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn slices(&self) -> &[SliceState] {
        &self.slices
    }

    /// Committed entries in commit order.
    pub fn log(&self) -> &[ScheduleEntry] {
        &self.log
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Run one iteration of the event loop.
    pub fn step(&mut self) -> Step {
        self.admit_candidates();
        self.readmit_deferred();

        if let Some(entry) = self.ready.pop() {
            return Step::Committed(self.commit(entry));
        }

        if let Some(next) = self.next_arrival() {
            let from = self.current_time;
            self.current_time = from.max(next);
            debug!(from, to = self.current_time, "port idle, advancing clock");
            return Step::Advanced {
                from,
                to: self.current_time,
            };
        }

        if !self.deferred.is_empty() {
            let missed = self.finalize_missed();
            return Step::Finalized { missed };
        }

        Step::Finished
    }

    /// Drive the event loop to completion and hand back the finished run.
    pub fn run(mut self) -> Outcome {
        let span = tracing::debug_span!("schedule", slices = self.slices.len());
        let _guard = span.enter();

        while self.step() != Step::Finished {}

        info!(
            committed = self.log.len(),
            missed = self.missed.len(),
            end_time = self.current_time,
            "scheduling finished"
        );

        Outcome {
            port_bps: self.evaluator.model().port_bps(),
            slices: self.slices,
            log: self.log,
            missed: self.missed,
            final_time: self.current_time,
        }
    }

    /// Hand every arrived, legal-next packet to the feasibility check.
    fn admit_candidates(&mut self) {
        let now = self.current_time;
        for slice in &mut self.slices {
            let Some(packet) = slice.candidate() else {
                continue;
            };
            if packet.arrival_time > now {
                continue;
            }

            let id = packet.id();
            let verdict = self.evaluator.check(slice, packet, now);
            match verdict {
                Ok(_) => {
                    let entry = ReadyEntry {
                        priority: self.evaluator.priority(slice, packet, now),
                        arrival_time: packet.arrival_time,
                        id,
                    };
                    debug!(packet = %id, priority = entry.priority, now, "admitted");
                    self.ready.push(entry);
                }
                Err(reason) => {
                    debug!(packet = %id, ?reason, now, "deferred");
                    self.deferred.defer(id, reason);
                }
            }
            slice.claim_candidate();
        }
    }

    /// Move deferred packets that became feasible at the current clock into the ready queue.
    fn readmit_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let now = self.current_time;
        let evaluator = &self.evaluator;
        let slices = &self.slices;
        let readmitted = self.deferred.readmit(|id| {
            let slice = &slices[id.slice];
            let packet = slice.packet(id.packet);
            evaluator.check(slice, packet, now).map(|_| ReadyEntry {
                priority: evaluator.priority(slice, packet, now),
                arrival_time: packet.arrival_time,
                id,
            })
        });
        for (id, _) in &readmitted {
            debug!(packet = %id, now, "re-admitted from deferral");
        }
        self.ready.extend(readmitted.into_iter().map(|(_, entry)| entry));
    }

    /// Place `entry` on the port and advance the clock to its end time.
    fn commit(&mut self, entry: ReadyEntry) -> ScheduleEntry {
        let now = self.current_time;
        let slice = &mut self.slices[entry.id.slice];
        let packet = slice.packet(entry.id.packet);
        let start = slice.earliest_start(now, packet);
        let end = start.saturating_add(self.evaluator.model().transmission_time(packet.size_bits));
        slice.commit(entry.id.packet, Transmission { start, end });

        let logged = ScheduleEntry {
            end_time: end,
            slice_id: entry.id.slice,
            packet_id: entry.id.packet,
        };
        self.log.push(logged);
        self.current_time = end;
        debug!(packet = %entry.id, start, end, "committed");
        logged
    }

    /// Earliest arrival among the legal next packets of unblocked slices.
    fn next_arrival(&self) -> Option<u64> {
        self.slices
            .iter()
            .filter_map(SliceState::candidate)
            .map(|packet| packet.arrival_time)
            .min()
    }

    /// Report every deferred packet, and everything queued behind it in its slice, as missed.
    fn finalize_missed(&mut self) -> usize {
        let before = self.missed.len();
        for (id, reason) in self.deferred.drain() {
            let slice = &mut self.slices[id.slice];
            let packet = slice.packet(id.packet);
            warn!(packet = %id, ?reason, "no feasible slot left, packet missed");
            self.missed.push(MissedPacket {
                slice_id: id.slice,
                packet_id: id.packet,
                arrival_time: packet.arrival_time,
                reason: reason.into(),
            });

            for blocked in slice.abandon() {
                warn!(
                    slice = id.slice,
                    packet = blocked,
                    blocking = id.packet,
                    "packet missed behind earlier miss"
                );
                self.missed.push(MissedPacket {
                    slice_id: id.slice,
                    packet_id: blocked,
                    arrival_time: slice.packet(blocked).arrival_time,
                    reason: MissReason::BlockedBehindMiss {
                        blocking_packet: id.packet,
                    },
                });
            }
        }
        self.missed.len() - before
    }
}

/// The finished run: final slice states, the schedule log and the missed packets.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Port rate the run was scheduled for, in bits per second.
    pub port_bps: u64,
    pub slices: Vec<SliceState>,
    /// Committed entries in commit order.
    pub log: Vec<ScheduleEntry>,
    pub missed: Vec<MissedPacket>,
    /// Clock value when the loop terminated.
    pub final_time: u64,
}

impl Outcome {
    /// Total number of packets handed to the run.
    pub fn submitted(&self) -> usize {
        self.slices.iter().map(SliceState::len).sum()
    }

    pub fn committed(&self) -> usize {
        self.log.len()
    }

    /// The log sorted by `(endTime, sliceId, packetId)`, as written to the output.
    pub fn sorted_log(&self) -> Vec<ScheduleEntry> {
        let mut sorted = self.log.clone();
        sorted.sort_unstable();
        sorted
    }

    pub fn packet(&self, id: PacketRef) -> &Packet {
        self.slices[id.slice].packet(id.packet)
    }

    /// Transmission of the packet behind a log entry.
    pub fn transmission(&self, entry: &ScheduleEntry) -> Option<Transmission> {
        self.slices[entry.slice_id]
            .packet(entry.packet_id)
            .transmission()
    }
}
