//! Delay and bandwidth statistics of a finished run.
//!
//! Metrics are computed once from the [`Outcome`] after the loop terminates; nothing here is on the
//! scheduling path. Percentiles use the nearest-rank method over all committed packets of a slice.

use crate::scheduler::Outcome;
use crate::slice::{bandwidth_bps, SliceState};
use serde::{Deserialize, Serialize};

/// Per-slice statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceMetrics {
    pub slice_id: usize,
    pub submitted: usize,
    pub committed: usize,
    pub missed: usize,
    /// Latency bound of the slice in nanoseconds.
    pub max_delay_bound: u64,
    pub max_delay: Option<u64>,
    pub mean_delay: Option<f64>,
    pub p50_delay: Option<u64>,
    pub p99_delay: Option<u64>,
    /// Committed packets whose delay exceeded the slice's bound.
    pub late: usize,
    pub guaranteed_bps: f64,
    /// Committed bits over `lastDeparture - firstArrival`, when that window is non-empty.
    pub achieved_bps: Option<f64>,
    /// Every packet committed within the slice's bound.
    pub satisfied: bool,
}

/// Port-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortMetrics {
    pub port_bps: u64,
    /// Sum of all committed transmission durations.
    pub busy_ns: u64,
    /// Last committed end time.
    pub makespan_ns: u64,
    /// `busy_ns / makespan_ns`, 0 for an empty run.
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub port: PortMetrics,
    pub slices: Vec<SliceMetrics>,
}

impl RunMetrics {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        let slices = outcome
            .slices
            .iter()
            .map(|slice| {
                let missed = outcome
                    .missed
                    .iter()
                    .filter(|m| m.slice_id == slice.slice_id)
                    .count();
                slice_metrics(slice, missed)
            })
            .collect();

        let busy_ns = outcome
            .log
            .iter()
            .filter_map(|entry| outcome.transmission(entry))
            .map(|t| t.duration())
            .fold(0u64, u64::saturating_add);
        let makespan_ns = outcome.log.iter().map(|e| e.end_time).max().unwrap_or(0);
        let utilization = if makespan_ns == 0 {
            0.0
        } else {
            busy_ns as f64 / makespan_ns as f64
        };

        Self {
            port: PortMetrics {
                port_bps: outcome.port_bps,
                busy_ns,
                makespan_ns,
                utilization,
            },
            slices,
        }
    }
}

fn slice_metrics(slice: &SliceState, missed: usize) -> SliceMetrics {
    let mut delays: Vec<u64> = slice.packets().iter().filter_map(|p| p.delay()).collect();
    delays.sort_unstable();

    let committed = delays.len();
    let mean_delay = (committed > 0).then(|| {
        let total: u128 = delays.iter().map(|&d| u128::from(d)).sum();
        total as f64 / committed as f64
    });
    let late = delays.iter().filter(|&&d| d > slice.max_delay).count();

    let achieved_bps = slice
        .packets()
        .iter()
        .find(|p| p.is_scheduled())
        .map(|first| slice.last_departure_time().saturating_sub(first.arrival_time))
        .filter(|&duration| duration > 0)
        .map(|duration| bandwidth_bps(slice.committed_bits(), duration));

    SliceMetrics {
        slice_id: slice.slice_id,
        submitted: slice.len(),
        committed,
        missed,
        max_delay_bound: slice.max_delay,
        max_delay: delays.last().copied(),
        mean_delay,
        p50_delay: percentile(&delays, 50.0),
        p99_delay: percentile(&delays, 99.0),
        late,
        guaranteed_bps: slice.guaranteed_bps,
        achieved_bps,
        satisfied: committed == slice.len() && late == 0,
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[u64], pct: f64) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    let len = sorted.len();
    let rank = ((len as f64 * pct / 100.0).ceil() as usize).max(1);
    Some(sorted[(rank - 1).min(len - 1)])
}
