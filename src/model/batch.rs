use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::model::{ConnectionKey, ConnectionRecord};

/// One selected connection in a batch.
///
/// A bare key means the connection no longer exists on the sending side and
/// should be removed; a full payload means it should be created or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SelectionEntry {
    BareKey(ConnectionKey),
    FullPayload(ConnectionRecord),
}

impl SelectionEntry {
    pub fn key(&self) -> &ConnectionKey {
        match self {
            SelectionEntry::BareKey(key) => key,
            SelectionEntry::FullPayload(record) => &record.key,
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, SelectionEntry::BareKey(_))
    }

    pub fn record(&self) -> Option<&ConnectionRecord> {
        match self {
            SelectionEntry::BareKey(_) => None,
            SelectionEntry::FullPayload(record) => Some(record),
        }
    }
}

/// A batch narrowed to one extra: present records first, then missing keys
pub type Selection = Vec<SelectionEntry>;

/// The batch the orchestrator hands to every phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchContext {
    /// Callback id -> entries selected for that extra
    #[serde(default)]
    pub extras: HashMap<String, Vec<SelectionEntry>>,
    /// Content kind -> stable keys of the items transferred in this batch
    #[serde(default)]
    pub post_types: HashMap<String, HashSet<String>>,
}

impl BatchContext {
    /// A batch that carries only `selection` for `extra_id`
    pub fn for_extra(extra_id: impl Into<String>, selection: Selection) -> Self {
        let mut extras = HashMap::new();
        extras.insert(extra_id.into(), selection);
        Self {
            extras,
            post_types: HashMap::new(),
        }
    }

    pub fn with_content(mut self, kind: impl Into<String>, stable_key: impl Into<String>) -> Self {
        self.post_types
            .entry(kind.into())
            .or_default()
            .insert(stable_key.into());
        self
    }

    /// Entries selected for `extra_id`, or `None` if the batch has no entry for it
    pub fn selection_for(&self, extra_id: &str) -> Option<&[SelectionEntry]> {
        self.extras.get(extra_id).map(Vec::as_slice)
    }

    /// Whether a content item with this stable key travels in the same batch
    pub fn contains_content(&self, stable_key: &str) -> bool {
        self.post_types
            .values()
            .any(|keys| keys.contains(stable_key))
    }
}
