//! Per-slice state: the arrival-ordered packet sequence, the admission cursor and the departure
//! bookkeeping the feasibility check and the fairness term read.

use crate::error::{Error, Result};
use crate::packet::{Packet, Transmission};
use crate::transmission::{BPS_PER_GBPS, NANOS_PER_SEC};

/// A logical traffic class sharing the port, with its bandwidth guarantee and latency bound.
///
/// Packets are stored in arrival order and `packets[i].packet_id == i`. The cursor `next_index`
/// marks the first packet not yet admitted. At most one packet of a slice is outstanding (admitted
/// but not committed) at any time, which keeps commits in FIFO order per slice.
#[derive(Debug, Clone)]
pub struct SliceState {
    pub slice_id: usize,
    /// Guaranteed bandwidth in bits per second.
    pub guaranteed_bps: f64,
    /// Latency bound in nanoseconds.
    pub max_delay: u64,
    packets: Vec<Packet>,
    next_index: usize,
    outstanding: Option<usize>,
    last_departure_time: u64,
    committed_bits: u128,
    committed_count: usize,
}

impl SliceState {
    /// Build a slice from `(arrival_ns, size_bits)` pairs listed in arrival order.
    ///
    /// # Errors
    /// - [`Error::InvalidSliceBandwidth`] if `guaranteed_gbps` is not a positive finite number.
    /// - [`Error::UnorderedArrivals`] if an arrival time is earlier than its predecessor's.
    pub fn new(
        slice_id: usize,
        guaranteed_gbps: f64,
        max_delay: u64,
        arrivals: &[(u64, u64)],
    ) -> Result<Self> {
        if !guaranteed_gbps.is_finite() || guaranteed_gbps <= 0.0 {
            return Err(Error::InvalidSliceBandwidth {
                slice: slice_id,
                value: guaranteed_gbps,
            });
        }
        if let Some(index) = arrivals.windows(2).position(|pair| pair[1].0 < pair[0].0) {
            return Err(Error::UnorderedArrivals {
                slice: slice_id,
                packet: index + 1,
                arrival: arrivals[index + 1].0,
                previous: arrivals[index].0,
            });
        }

        let packets = arrivals
            .iter()
            .enumerate()
            .map(|(packet_id, &(arrival, size))| Packet::new(slice_id, packet_id, arrival, size))
            .collect();

        Ok(Self {
            slice_id,
            guaranteed_bps: guaranteed_gbps * BPS_PER_GBPS,
            max_delay,
            packets,
            next_index: 0,
            outstanding: None,
            last_departure_time: 0,
            committed_bits: 0,
            committed_count: 0,
        })
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn packet(&self, index: usize) -> &Packet {
        &self.packets[index]
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Index of the first packet not yet admitted.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Latest committed end time of this slice, 0 before the first commit.
    pub fn last_departure_time(&self) -> u64 {
        self.last_departure_time
    }

    /// Sum of committed packet sizes, widened so it cannot overflow.
    pub fn committed_bits(&self) -> u128 {
        self.committed_bits
    }

    pub fn committed_count(&self) -> usize {
        self.committed_count
    }

    /// Whether a packet of this slice is admitted but not yet committed.
    pub fn is_blocked(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn has_unadmitted(&self) -> bool {
        self.next_index < self.packets.len()
    }

    /// The packet at the cursor, if it is the legal next one to admit.
    ///
    /// Returns `None` while another packet of the slice is outstanding or when the slice is
    /// exhausted.
    pub fn candidate(&self) -> Option<&Packet> {
        if self.is_blocked() {
            return None;
        }
        self.packets.get(self.next_index)
    }

    /// Claim the candidate: advance the cursor and mark the packet outstanding.
    pub(crate) fn claim_candidate(&mut self) -> Option<usize> {
        if self.is_blocked() || !self.has_unadmitted() {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        self.outstanding = Some(index);
        Some(index)
    }

    /// Earliest instant `packet` could legally start given the clock and this slice's departures.
    pub fn earliest_start(&self, now: u64, packet: &Packet) -> u64 {
        now.max(packet.arrival_time).max(self.last_departure_time)
    }

    /// Arrival time of the first committed packet (always packet 0, commits being FIFO).
    fn first_committed_arrival(&self) -> Option<u64> {
        (self.committed_count > 0).then(|| self.packets[0].arrival_time)
    }

    /// Achieved bandwidth of the committed packets divided by the guarantee, clamped to `[0, 1]`.
    ///
    /// Zero when nothing has been committed yet or no time has elapsed.
    pub fn bandwidth_usage_ratio(&self) -> f64 {
        let Some(first_arrival) = self.first_committed_arrival() else {
            return 0.0;
        };
        let duration = self.last_departure_time.saturating_sub(first_arrival);
        if duration == 0 {
            return 0.0;
        }
        let achieved = bandwidth_bps(self.committed_bits, duration);
        (achieved / self.guaranteed_bps).clamp(0.0, 1.0)
    }

    /// Achieved bandwidth of the slice if `packet` were committed to end at `end_time`.
    ///
    /// Returns `None` when the projected window is empty.
    pub fn projected_bandwidth(&self, packet: &Packet, end_time: u64) -> Option<f64> {
        let first_arrival = self
            .first_committed_arrival()
            .map_or(packet.arrival_time, |first| first.min(packet.arrival_time));
        let duration = end_time.saturating_sub(first_arrival);
        if duration == 0 {
            return None;
        }
        let bits = self.committed_bits + u128::from(packet.size_bits);
        Some(bandwidth_bps(bits, duration))
    }

    /// Record the commit of the outstanding packet and release the slice.
    pub(crate) fn commit(&mut self, index: usize, transmission: Transmission) {
        debug_assert_eq!(self.outstanding, Some(index));
        let packet = &mut self.packets[index];
        packet.commit(transmission);
        self.committed_bits += u128::from(packet.size_bits);
        self.committed_count += 1;
        self.last_departure_time = self.last_departure_time.max(transmission.end);
        self.outstanding = None;
    }

    /// Release the outstanding packet without committing it (used when it is declared missed),
    /// and return the indices of every packet that will now never be admitted.
    pub(crate) fn abandon(&mut self) -> std::ops::Range<usize> {
        self.outstanding = None;
        let rest = self.next_index..self.packets.len();
        self.next_index = self.packets.len();
        rest
    }
}

/// Bandwidth in bits per second for `bits` sent over `duration_ns`.
pub(crate) fn bandwidth_bps(bits: u128, duration_ns: u64) -> f64 {
    bits as f64 * NANOS_PER_SEC as f64 / duration_ns as f64
}
