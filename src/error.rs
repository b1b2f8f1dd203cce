//! Error types shared by the scheduler core, the input reader and the binary.
//!
//! Infeasible packets are not errors: they surface as [`crate::scheduler::MissedPacket`] values in
//! the run outcome. Only configuration and input problems are rejected here, always before the
//! first scheduling decision is taken.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or configuring a scheduling run.
#[derive(Debug, Error)]
pub enum Error {
    /// Port bandwidth is zero, negative, or not a number.
    #[error("invalid port bandwidth: {0} Gbps (must be positive)")]
    InvalidPortBandwidth(f64),

    /// A slice declared a non-positive guaranteed bandwidth.
    #[error("slice {slice}: invalid guaranteed bandwidth {value} Gbps (must be positive)")]
    InvalidSliceBandwidth {
        /// Offending slice
        slice: usize,
        /// Declared bandwidth in Gbps
        value: f64,
    },

    /// Packets of a slice are not listed in arrival order.
    #[error("slice {slice}: packet {packet} arrives at {arrival}ns, before its predecessor at {previous}ns")]
    UnorderedArrivals {
        /// Offending slice
        slice: usize,
        /// Index of the first packet that arrives too early
        packet: usize,
        /// Its arrival time
        arrival: u64,
        /// Arrival time of the packet before it
        previous: u64,
    },

    /// Scheduler configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input text could not be parsed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// A batch worker thread panicked.
    #[error("batch worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Problems found while reading the line-oriented scenario format.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    /// The input ended before the expected line.
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof {
        /// Description of the missing line
        expected: &'static str,
    },

    /// A line had the wrong number of fields.
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A token is not a valid number for its field.
    #[error("line {line}: invalid {field} {token:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        token: String,
    },

    /// A slice's packet line does not hold `packetCount` arrival/size pairs.
    #[error("slice {slice}: declared {expected} packets, packet line holds {found} values")]
    PacketCountMismatch {
        slice: usize,
        expected: usize,
        found: usize,
    },

    /// Non-blank content after the last declared slice.
    #[error("line {line}: trailing data after {slices} slices")]
    TrailingData { line: usize, slices: usize },
}
