//! Scheduler configuration.
//!
//! Every tunable constant of a run lives here: the priority weights, the feasibility tolerances used
//! at admission time, the verifier's bandwidth tolerance and the score numerator. All groups
//! implement [`Default`] with the reference values, and the whole tree can be loaded from a partial
//! JSON document where missing fields keep their defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weights combined by the priority evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Weight of `1 / deadlineSlack`.
    pub urgency: f64,
    /// Weight of `sizeBits / transmissionTime`.
    pub efficiency: f64,
    /// Weight of `1 - bandwidthUsageRatio`.
    pub fairness: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            urgency: 0.4,
            efficiency: 0.3,
            fairness: 0.3,
        }
    }
}

/// Tolerances applied by the admission feasibility check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityConfig {
    /// Projected delay must stay `<= maxDelay * deadline_tolerance`.
    pub deadline_tolerance: f64,
    /// Projected achieved bandwidth must stay `>= guaranteedBandwidth * bandwidth_tolerance`.
    pub bandwidth_tolerance: f64,
}

impl Default for FeasibilityConfig {
    fn default() -> Self {
        Self {
            deadline_tolerance: 1.0,
            // 90% of the verifier's 95% floor.
            bandwidth_tolerance: 0.9 * 0.95,
        }
    }
}

/// Post-run verifier settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Minimum fraction of the guaranteed bandwidth each slice must achieve.
    pub bandwidth_tolerance: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            bandwidth_tolerance: 0.95,
        }
    }
}

/// Score formula settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Numerator of the latency term `latency_numerator / maxDelay`.
    pub latency_numerator: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            latency_numerator: 10_000.0,
        }
    }
}

/// Top-level configuration for one scheduling run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub weights: PriorityWeights,
    pub feasibility: FeasibilityConfig,
    pub verifier: VerifierConfig,
    pub score: ScoreConfig,
}

impl SchedulerConfig {
    /// Load a configuration from a JSON file, filling omitted fields with defaults.
    ///
    /// The loaded configuration is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SchedulerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject weights and tolerances that would make the run meaningless.
    ///
    /// Weights must be finite and non-negative; tolerances and the score numerator must be finite
    /// and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("weights.urgency", self.weights.urgency),
            ("weights.efficiency", self.weights.efficiency),
            ("weights.fairness", self.weights.fairness),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        let positives = [
            (
                "feasibility.deadline_tolerance",
                self.feasibility.deadline_tolerance,
            ),
            (
                "feasibility.bandwidth_tolerance",
                self.feasibility.bandwidth_tolerance,
            ),
            (
                "verifier.bandwidth_tolerance",
                self.verifier.bandwidth_tolerance,
            ),
            ("score.latency_numerator", self.score.latency_numerator),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}
