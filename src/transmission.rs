//! Serialization delay of packets on the shared output port.

use crate::error::{Error, Result};

/// Nanoseconds per second, the time base of the whole scheduler.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Bits per second in one Gbps.
pub const BPS_PER_GBPS: f64 = 1e9;

/// Converts packet sizes into transmission durations for a port of fixed bit-rate.
///
/// The port rate is held as an integer number of bits per second so that every duration is computed
/// with exact integer arithmetic. Durations are rounded up: a packet is never modelled as leaving the
/// wire before its last bit has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionModel {
    port_bps: u64,
}

impl TransmissionModel {
    /// Build a model from a port rate expressed in Gbps.
    ///
    /// # Errors
    /// [`Error::InvalidPortBandwidth`] if the rate is not a positive finite number, or rounds to
    /// zero bits per second.
    pub fn from_gbps(port_gbps: f64) -> Result<Self> {
        if !port_gbps.is_finite() || port_gbps <= 0.0 {
            return Err(Error::InvalidPortBandwidth(port_gbps));
        }
        let bps = (port_gbps * BPS_PER_GBPS).round();
        if bps < 1.0 || bps > u64::MAX as f64 {
            return Err(Error::InvalidPortBandwidth(port_gbps));
        }
        Self::from_bps(bps as u64)
    }

    /// Build a model from a port rate in bits per second.
    pub fn from_bps(port_bps: u64) -> Result<Self> {
        if port_bps == 0 {
            return Err(Error::InvalidPortBandwidth(0.0));
        }
        Ok(Self { port_bps })
    }

    /// Port rate in bits per second.
    pub fn port_bps(&self) -> u64 {
        self.port_bps
    }

    /// Time in nanoseconds needed to put `size_bits` on the wire: `ceil(size * 1e9 / portBps)`.
    pub fn transmission_time(&self, size_bits: u64) -> u64 {
        let numerator = size_bits as u128 * NANOS_PER_SEC as u128;
        let denominator = self.port_bps as u128;
        let nanos = numerator.div_ceil(denominator);
        // A u64 worth of bits at >= 1 bps can exceed u64 nanoseconds only for absurd inputs.
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    /// Bits per nanosecond achieved when sending `size_bits`, 0 for an empty packet.
    pub fn efficiency(&self, size_bits: u64) -> f64 {
        match self.transmission_time(size_bits) {
            0 => 0.0,
            nanos => size_bits as f64 / nanos as f64,
        }
    }
}
