use itertools::Itertools;
use std::collections::HashSet;

use crate::model::{BatchContext, ConnectionKey, Selection, SelectionEntry, Snapshot};

/// Narrows a snapshot to the connections selected in a batch
pub struct BatchFilter;

impl BatchFilter {
    /// Select the records named by `selection` from `snapshot`.
    ///
    /// Present keys come back as full payloads in snapshot order; keys the
    /// snapshot does not have follow as bare keys in selection order, marking
    /// connections that no longer exist here.
    pub fn filter(snapshot: &Snapshot, selection: &[SelectionEntry]) -> Selection {
        let keys: Vec<&ConnectionKey> = selection.iter().map(SelectionEntry::key).unique().collect();
        let wanted: HashSet<&ConnectionKey> = keys.iter().copied().collect();

        let mut filtered: Selection = snapshot
            .records()
            .filter(|record| wanted.contains(&record.key))
            .cloned()
            .map(SelectionEntry::FullPayload)
            .collect();

        filtered.extend(
            keys.into_iter()
                .filter(|key| !snapshot.contains(key))
                .cloned()
                .map(SelectionEntry::BareKey),
        );

        filtered
    }

    /// Filter for the entries `batch` holds under `extra_id`.
    ///
    /// `None` means the batch has nothing for this extra and later phases
    /// must be skipped.
    pub fn for_batch(snapshot: &Snapshot, batch: &BatchContext, extra_id: &str) -> Option<Selection> {
        batch
            .selection_for(extra_id)
            .map(|selection| Self::filter(snapshot, selection))
    }
}
