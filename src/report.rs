//! End-to-end evaluation of a scenario and the writers for its results.
//!
//! [`evaluate`] chains scheduler, verifier, score and metrics. [`write_schedule`] produces the
//! plain-text output (scheduled count, then `endTime sliceId packetId` triples sorted by end time);
//! [`RunReport`] is the JSON form with every diagnostic attached.

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::metrics::RunMetrics;
use crate::scenario::Scenario;
use crate::scheduler::{MissedPacket, Outcome, ScheduleEntry, Scheduler};
use crate::score::{Score, ScoreCalculator};
use crate::verifier::{Verification, Verifier};
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Everything known about a finished run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub outcome: Outcome,
    pub verification: Verification,
    pub score: Score,
    pub metrics: RunMetrics,
}

impl Evaluation {
    /// Serializable summary of this evaluation.
    pub fn report(&self) -> RunReport<'_> {
        RunReport {
            scheduled: self.outcome.committed(),
            submitted: self.outcome.submitted(),
            schedule: self.outcome.sorted_log(),
            missed: &self.outcome.missed,
            verification: &self.verification,
            score: &self.score,
            metrics: &self.metrics,
        }
    }
}

/// Schedule `scenario`, verify the result and score it.
///
/// # Errors
/// Configuration errors only; infeasible packets and verifier failures are part of the returned
/// [`Evaluation`].
pub fn evaluate(scenario: &Scenario, config: &SchedulerConfig) -> Result<Evaluation> {
    let outcome = Scheduler::from_scenario(scenario, config)?.run();
    let verification = Verifier::new(config.verifier).verify_outcome(&outcome);
    let score = ScoreCalculator::new(config.score).score(&outcome, &verification);
    let metrics = RunMetrics::from_outcome(&outcome);

    info!(
        score = score.value,
        satisfied = score.satisfied_slices,
        slices = score.total_slices,
        max_delay = score.max_delay,
        violations = verification.violations.len(),
        "run evaluated"
    );

    Ok(Evaluation {
        outcome,
        verification,
        score,
        metrics,
    })
}

/// JSON view of an [`Evaluation`].
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub scheduled: usize,
    pub submitted: usize,
    /// Committed entries sorted by end time.
    pub schedule: Vec<ScheduleEntry>,
    pub missed: &'a [MissedPacket],
    pub verification: &'a Verification,
    pub score: &'a Score,
    pub metrics: &'a RunMetrics,
}

impl RunReport<'_> {
    pub fn write_json(&self, mut writer: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Write the schedule in the plain-text output format.
pub fn write_schedule(mut writer: impl Write, outcome: &Outcome) -> std::io::Result<()> {
    let sorted = outcome.sorted_log();
    writeln!(writer, "{}", sorted.len())?;
    let triples: Vec<String> = sorted
        .iter()
        .map(|e| format!("{} {} {}", e.end_time, e.slice_id, e.packet_id))
        .collect();
    writeln!(writer, "{}", triples.join(" "))
}
