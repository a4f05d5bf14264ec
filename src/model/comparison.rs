use serde::{Deserialize, Serialize};

use crate::model::ConnectionRecord;

/// What reconciling one connection would do on production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    Unchanged,
}

impl ChangeKind {
    /// Classify a staging/production pair. `None` when neither side has a row.
    pub fn between(
        local: Option<&ConnectionRecord>,
        remote: Option<&ConnectionRecord>,
    ) -> Option<Self> {
        match (local, remote) {
            (Some(local), Some(remote)) if local.same_meta(remote) => Some(ChangeKind::Unchanged),
            (Some(_), Some(_)) => Some(ChangeKind::Update),
            (Some(_), None) => Some(ChangeKind::Create),
            (None, Some(_)) => Some(ChangeKind::Delete),
            (None, None) => None,
        }
    }
}

/// One candidate row of the "new batch" comparison, pairing the staging
/// record (`status`) with the production record (`remote_status`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    #[serde(default)]
    pub status: Option<ConnectionRecord>,
    #[serde(default)]
    pub remote_status: Option<ConnectionRecord>,
    /// Whether the row's checkbox was checked previously
    #[serde(default)]
    pub in_batch: bool,
}

/// A row to display on the new batch screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRow {
    pub action: ChangeKind,
    /// Default checkbox state
    pub selected: bool,
    /// Whether the checkbox is disabled
    pub forced: bool,
    pub title: String,
    pub message: String,
}
