//! Packet representation shared by all scheduler stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable address of a packet inside the scheduler's storage.
///
/// The ready queue, the deferral set and the schedule log only ever hold these indices, so each
/// packet has a single owner (its slice) and a single source of truth for its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PacketRef {
    /// Index of the owning slice (its slice id).
    pub slice: usize,
    /// Index of the packet inside the slice (its packet id and FIFO ticket).
    pub packet: usize,
}

impl PacketRef {
    pub const fn new(slice: usize, packet: usize) -> Self {
        Self { slice, packet }
    }
}

impl fmt::Display for PacketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.slice, self.packet)
    }
}

/// Committed occupation of the port by one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmission {
    /// First nanosecond the packet holds the port.
    pub start: u64,
    /// Nanosecond at which the last bit has left.
    pub end: u64,
}

impl Transmission {
    pub fn duration(&self) -> u64 {
        self.end - self.start
    }
}

/// One packet of a slice.
///
/// `packet_id` equals the packet's position in its slice's arrival-ordered sequence: it is the FIFO
/// ticket, not an arbitrary label. The only mutable part is `transmission`, filled once by the
/// scheduler when the packet is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub slice_id: usize,
    pub packet_id: usize,
    /// Arrival time in nanoseconds.
    pub arrival_time: u64,
    pub size_bits: u64,
    transmission: Option<Transmission>,
}

impl Packet {
    pub fn new(slice_id: usize, packet_id: usize, arrival_time: u64, size_bits: u64) -> Self {
        Self {
            slice_id,
            packet_id,
            arrival_time,
            size_bits,
            transmission: None,
        }
    }

    pub fn id(&self) -> PacketRef {
        PacketRef::new(self.slice_id, self.packet_id)
    }

    /// Whether the packet has been committed to the port.
    pub fn is_scheduled(&self) -> bool {
        self.transmission.is_some()
    }

    pub fn transmission(&self) -> Option<Transmission> {
        self.transmission
    }

    pub fn start_time(&self) -> Option<u64> {
        self.transmission.map(|t| t.start)
    }

    pub fn end_time(&self) -> Option<u64> {
        self.transmission.map(|t| t.end)
    }

    /// End-to-end delay (`endTime - arrivalTime`) once committed.
    pub fn delay(&self) -> Option<u64> {
        self.transmission
            .map(|t| t.end.saturating_sub(self.arrival_time))
    }

    pub(crate) fn commit(&mut self, transmission: Transmission) {
        debug_assert!(self.transmission.is_none(), "packet {} committed twice", self.id());
        self.transmission = Some(transmission);
    }
}
