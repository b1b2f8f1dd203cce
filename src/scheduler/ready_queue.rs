//! Ready queue: admitted, feasible packets ordered by priority.
//!
//! The queue is a `BinaryHeap` (max-heap) over [`ReadyEntry`], whose ordering is written out
//! explicitly so that the pop order is fully deterministic:
//! 1. higher priority first
//! 2. then earlier arrival
//! 3. then lower slice id
//! 4. then lower packet id

use crate::packet::PacketRef;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Packet waiting in the ready queue, referenced by index.
#[derive(Debug, Clone, Copy)]
pub struct ReadyEntry {
    /// Score computed by the priority evaluator at admission time
    pub priority: f64,
    /// Arrival time of the packet (first tie-break)
    pub arrival_time: u64,
    /// Location of the packet in the scheduler's storage (second and third tie-breaks)
    pub id: PacketRef,
}

impl Ord for ReadyEntry {
    /// "Greater" means "scheduled sooner", so the max-heap pops the best candidate.
    ///
    /// Priorities are compared with `total_cmp`, giving a total order even for values the
    /// evaluator never produces (NaN). Every tie-break is reversed: the smaller arrival time, slice
    /// id and packet id win.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.arrival_time.cmp(&self.arrival_time))
            .then_with(|| other.id.slice.cmp(&self.id.slice))
            .then_with(|| other.id.packet.cmp(&self.id.packet))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyEntry {}

/// Max-priority queue of ready packets.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<ReadyEntry>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ReadyEntry) {
        self.heap.push(entry);
    }

    /// Re-insert a batch of entries, e.g. deferred packets that became feasible.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ReadyEntry>) {
        self.heap.extend(entries);
    }

    /// Remove and return the best candidate.
    pub fn pop(&mut self) -> Option<ReadyEntry> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&ReadyEntry> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
