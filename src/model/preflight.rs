use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DELETION_ROW: &str = "P2P Link Deletion";
pub const SYNC_ROW: &str = "P2P Link Update";

/// Sub-row of a preflight report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightRow {
    pub messages: Vec<String>,
}

/// Result of checking a selection against production before transfer.
///
/// Any error blocks the whole batch; messages are informational.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
    pub errors: Vec<String>,
    pub messages: Vec<String>,
    pub rows: BTreeMap<String, PreflightRow>,
}

impl PreflightReport {
    pub fn is_blocking(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn push_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn push_row_message(&mut self, row: &str, message: String) {
        self.rows
            .entry(row.to_string())
            .or_default()
            .messages
            .push(message);
    }

    pub fn row(&self, row: &str) -> Option<&PreflightRow> {
        self.rows.get(row)
    }
}
