//! Decision threshold and confidence banding

use crate::error::{ExplainerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary lending decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Class 0: loan can be granted
    Grant,
    /// Class 1: high risk of default
    HighRisk,
}

impl Decision {
    /// Predicted class label (1 = default)
    pub fn class(&self) -> u8 {
        match self {
            Decision::Grant => 0,
            Decision::HighRisk => 1,
        }
    }

    /// Verdict used in reports
    pub fn verdict(&self) -> &'static str {
        match self {
            Decision::Grant => "Loan Can Be Granted",
            Decision::HighRisk => "High Risk of Default",
        }
    }

    /// Risk level used in the explanation heading
    pub fn risk_level(&self) -> &'static str {
        match self {
            Decision::Grant => "Low Risk of Default",
            Decision::HighRisk => "High Risk of Default",
        }
    }

    /// Longer result message for the result page
    pub fn summary(&self) -> &'static str {
        match self {
            Decision::Grant => "Loan can be granted (Good borrower)",
            Decision::HighRisk => "High risk of default (Loan not recommended)",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Decision::Grant => "✅",
            Decision::HighRisk => "❌",
        }
    }
}

/// Three-level bucketing of distance from the decision boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
}

impl ConfidenceBand {
    pub fn message(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High confidence in prediction",
            ConfidenceBand::Moderate => "Moderate confidence in prediction",
            ConfidenceBand::Low => "Low confidence: borderline case",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "🟢",
            ConfidenceBand::Moderate => "🟡",
            ConfidenceBand::Low => "🔴",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceBand::High => "High",
            ConfidenceBand::Moderate => "Moderate",
            ConfidenceBand::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Threshold and band boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Probabilities strictly above this are classified as default
    pub threshold: f64,
    /// Confidence strictly above this is `High`
    pub high_confidence: f64,
    /// Confidence strictly above this (and not High) is `Moderate`
    pub moderate_confidence: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            high_confidence: 0.75,
            moderate_confidence: 0.5,
        }
    }
}

impl DecisionPolicy {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ExplainerError::ConfigError(format!(
                "policy.threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        let ordered = 0.0 <= self.moderate_confidence
            && self.moderate_confidence < self.high_confidence
            && self.high_confidence <= 1.0;
        if !ordered {
            return Err(ExplainerError::ConfigError(format!(
                "policy bands must satisfy 0 <= moderate < high <= 1, got moderate={} high={}",
                self.moderate_confidence, self.high_confidence
            )));
        }
        Ok(())
    }

    pub fn decide(&self, probability: f64) -> Decision {
        if probability > self.threshold {
            Decision::HighRisk
        } else {
            Decision::Grant
        }
    }

    /// Distance from the threshold, normalised to [0, 1] on each side.
    /// With the default threshold this is `|p - 0.5| * 2`.
    pub fn confidence(&self, probability: f64) -> f64 {
        let t = self.threshold;
        let c = if probability > t {
            (probability - t) / (1.0 - t)
        } else {
            (t - probability) / t
        };
        c.clamp(0.0, 1.0)
    }

    pub fn band(&self, confidence: f64) -> ConfidenceBand {
        if confidence > self.high_confidence {
            ConfidenceBand::High
        } else if confidence > self.moderate_confidence {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }
}
