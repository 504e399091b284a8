// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permanent-failure classification rules
//!
//! The markers are substring matches against third-party tool output,
//! which makes them a maintenance hazard; they live in configuration so
//! deployments can extend them without a code change.

use serde::{Deserialize, Serialize};

/// Declarative allow-list deciding which failures are never retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRules {
    /// Failure-message substrings that are never worth retrying
    #[serde(default = "default_permanent_markers")]
    pub permanent_markers: Vec<String>,
    /// Scene-name substrings for source formats the pipeline cannot process
    #[serde(default = "default_unsupported_formats")]
    pub unsupported_formats: Vec<String>,
}

fn default_permanent_markers() -> Vec<String> {
    [
        "could not locate required auxiliary data",
        "unable to locate required auxiliary data",
        "no coverage of input by auxiliary data",
        "permission denied",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_unsupported_formats() -> Vec<String> {
    vec!["RAW".to_string()]
}

impl Default for FailureRules {
    fn default() -> Self {
        Self {
            permanent_markers: default_permanent_markers(),
            unsupported_formats: default_unsupported_formats(),
        }
    }
}

impl FailureRules {
    /// Whether this failure should go straight to FAILED regardless of
    /// the retry policy
    pub fn is_permanent(&self, message: &str, scene: &str) -> bool {
        if self
            .permanent_markers
            .iter()
            .any(|marker| message.contains(marker.as_str()))
        {
            return true;
        }
        self.unsupported_formats
            .iter()
            .any(|format| scene.contains(format.as_str()))
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
