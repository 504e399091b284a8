// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority bands and labels
//!
//! Three independent signals rank a job: subscription priority, user
//! priority, and per-item priority. The band restricts which slice of the
//! subscription-priority range a worker deployment serves.

use crate::job::JobRow;
use serde::{Deserialize, Serialize};

/// Subscription priority used in ordering when the job has none
pub const DEFAULT_SUB_PRIORITY: i32 = 5;

/// The explicit "normal" subscription priority
pub const NORMAL_SUB_PRIORITY: i32 = 10;

/// Which slice of the subscription-priority range a worker serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityBand {
    /// Scheduled capacity: one-time jobs, or subscriptions with positive
    /// priority
    #[default]
    Standard,
    /// Interruptible capacity: positive item priority, and subscription
    /// priority at or below normal
    Spot,
    /// On-premise capacity: no restriction
    OnPrem,
}

impl PriorityBand {
    pub fn admits(&self, row: &JobRow) -> bool {
        let sub_priority = row.sub_priority();
        match self {
            PriorityBand::Standard => match sub_priority {
                None => true,
                Some(p) => p > 0,
            },
            PriorityBand::Spot => {
                row.item_priority > 0
                    && match sub_priority {
                        None => true,
                        Some(p) => p > 0 && p <= NORMAL_SUB_PRIORITY,
                    }
            }
            PriorityBand::OnPrem => true,
        }
    }
}

/// Human label for a subscription priority, used when logging claims
pub fn priority_label(sub_priority: Option<i32>) -> &'static str {
    match sub_priority {
        None => "NORMAL",
        Some(p) if p == NORMAL_SUB_PRIORITY => "NORMAL",
        Some(p) if p > NORMAL_SUB_PRIORITY => "EXPEDITED",
        Some(_) => "LOW",
    }
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
