use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-run counters of what the applier changed on production
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyCounters {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
    pub meta_added: usize,
    pub meta_updated: usize,
    pub meta_deleted: usize,
}

impl ApplyCounters {
    pub fn meta_writes(&self) -> usize {
        self.meta_added + self.meta_updated + self.meta_deleted
    }
}

/// Aggregate result of one transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub success: bool,
    pub any_applied: bool,
    pub message: String,
    pub applied: ApplyCounters,
    pub completed_at: DateTime<Utc>,
}

impl TransferOutcome {
    pub fn new(success: bool, any_applied: bool, applied: ApplyCounters) -> Self {
        Self {
            success,
            any_applied,
            message: outcome_message(success, any_applied).to_string(),
            applied,
            completed_at: Utc::now(),
        }
    }

    /// Outcome of a transfer that had nothing to apply
    pub fn nothing_to_deploy() -> Self {
        Self::new(true, false, ApplyCounters::default())
    }
}

pub fn outcome_message(success: bool, any_applied: bool) -> &'static str {
    match (success, any_applied) {
        (true, true) => "Connections were successfully deployed",
        (true, false) => "No Posts to Posts connections to deploy",
        (false, true) => {
            "Some connections were deployed, but others could not be because they referred to missing post or page IDs"
        }
        (false, false) => {
            "No connections could be deployed, probably because of missing post or page IDs"
        }
    }
}
