//! Reader for the line-oriented scenario format.
//!
//! ```text
//! N portBandwidthGbps
//! packetCount sliceBandwidthGbps maxDelayNs      (repeated N times,
//! arrival_0 size_0 arrival_1 size_1 ...           each followed by its packet line)
//! ```
//!
//! Parsing only checks the shape of the input; bandwidth and ordering rules are enforced when the
//! scheduler is built from the resulting [`Scenario`].

use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// One slice as described by the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceSpec {
    pub bandwidth_gbps: f64,
    pub max_delay_ns: u64,
    /// `(arrival_ns, size_bits)` pairs in arrival order.
    pub packets: Vec<(u64, u64)>,
}

/// A complete scheduling problem: the port rate and every slice's traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub port_bandwidth_gbps: f64,
    pub slices: Vec<SliceSpec>,
}

impl Scenario {
    pub fn packet_count(&self) -> usize {
        self.slices.iter().map(|s| s.packets.len()).sum()
    }

    /// Read and parse a whole scenario from `reader`.
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text.parse()?)
    }
}

impl FromStr for Scenario {
    type Err = InputError;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let mut lines = Lines::new(text);

        let (line, fields) = lines.next_nonblank("header line")?;
        expect_fields(line, &fields, 2)?;
        let slice_count = parse_integer(line, "slice count", fields[0])? as usize;
        let port_bandwidth_gbps = parse_float(line, "port bandwidth", fields[1])?;

        // The declared count is untrusted; the vector grows with the slices actually present.
        let mut slices = Vec::new();
        for slice in 0..slice_count {
            let (line, fields) = lines.next_nonblank("slice header line")?;
            expect_fields(line, &fields, 3)?;
            let packet_count = parse_integer(line, "packet count", fields[0])? as usize;
            let bandwidth_gbps = parse_float(line, "slice bandwidth", fields[1])?;
            let max_delay_ns = parse_integer(line, "max delay", fields[2])?;

            let packets = match lines.next_line() {
                Some((line, fields)) => parse_packets(slice, line, &fields, packet_count)?,
                None if packet_count == 0 => Vec::new(),
                None => {
                    return Err(InputError::UnexpectedEof {
                        expected: "packet line",
                    })
                }
            };

            slices.push(SliceSpec {
                bandwidth_gbps,
                max_delay_ns,
                packets,
            });
        }

        if let Ok((line, _)) = lines.next_nonblank("end of input") {
            return Err(InputError::TrailingData {
                line,
                slices: slice_count,
            });
        }

        Ok(Scenario {
            port_bandwidth_gbps,
            slices,
        })
    }
}

impl fmt::Display for Scenario {
    /// Writes the scenario back in the input format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.slices.len(), self.port_bandwidth_gbps)?;
        for slice in &self.slices {
            writeln!(
                f,
                "{} {} {}",
                slice.packets.len(),
                slice.bandwidth_gbps,
                slice.max_delay_ns
            )?;
            let pairs: Vec<String> = slice
                .packets
                .iter()
                .map(|(arrival, size)| format!("{arrival} {size}"))
                .collect();
            writeln!(f, "{}", pairs.join(" "))?;
        }
        Ok(())
    }
}

/// Line cursor that tracks 1-based line numbers.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }

    /// Next line, blank or not, split into whitespace-separated fields.
    fn next_line(&mut self) -> Option<(usize, Vec<&'a str>)> {
        self.inner
            .next()
            .map(|(index, line)| (index + 1, line.split_whitespace().collect()))
    }

    fn next_nonblank(
        &mut self,
        expected: &'static str,
    ) -> std::result::Result<(usize, Vec<&'a str>), InputError> {
        loop {
            match self.next_line() {
                Some((_, fields)) if fields.is_empty() => continue,
                Some(found) => return Ok(found),
                None => return Err(InputError::UnexpectedEof { expected }),
            }
        }
    }
}

fn expect_fields(
    line: usize,
    fields: &[&str],
    expected: usize,
) -> std::result::Result<(), InputError> {
    if fields.len() != expected {
        return Err(InputError::FieldCount {
            line,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn parse_packets(
    slice: usize,
    line: usize,
    fields: &[&str],
    packet_count: usize,
) -> std::result::Result<Vec<(u64, u64)>, InputError> {
    if packet_count.checked_mul(2) != Some(fields.len()) {
        return Err(InputError::PacketCountMismatch {
            slice,
            expected: packet_count,
            found: fields.len(),
        });
    }
    fields
        .chunks_exact(2)
        .map(|pair| {
            Ok((
                parse_integer(line, "arrival time", pair[0])?,
                parse_integer(line, "packet size", pair[1])?,
            ))
        })
        .collect()
}

/// Non-negative integer, also accepting an integral float spelling such as `"3.0"`.
fn parse_integer(
    line: usize,
    field: &'static str,
    token: &str,
) -> std::result::Result<u64, InputError> {
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    match token.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value < u64::MAX as f64 =>
        {
            Ok(value as u64)
        }
        _ => Err(InputError::InvalidNumber {
            line,
            field,
            token: token.to_string(),
        }),
    }
}

fn parse_float(
    line: usize,
    field: &'static str,
    token: &str,
) -> std::result::Result<f64, InputError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| InputError::InvalidNumber {
            line,
            field,
            token: token.to_string(),
        })
}
