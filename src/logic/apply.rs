use anyhow::Result;
use log::{debug, error, info, warn};
use std::collections::HashMap;

use crate::model::{
    first_value, ApplyCounters, ConnectionId, ConnectionKey, ConnectionRecord, Meta,
    SelectionEntry, TransferOutcome,
};
use crate::store::traits::Store;

/// What happened to a single selection entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryResult {
    /// Endpoints could not be resolved on production
    Unresolved,
    /// Deletion of a connection production does not have
    Skipped,
    Applied,
}

/// Writes a selection to the production store
pub struct Applier;

impl Applier {
    /// Apply `selection` to `store`.
    ///
    /// `resolved` is the selection re-filtered against production: a bare key
    /// is turned into a deletion of the production record it names. Entries
    /// are applied one by one; a failed entry marks the run unsuccessful but
    /// does not stop the remaining entries.
    pub async fn apply<S: Store>(
        store: &S,
        selection: &[SelectionEntry],
        resolved: &[SelectionEntry],
    ) -> TransferOutcome {
        let production: HashMap<&ConnectionKey, &ConnectionRecord> = resolved
            .iter()
            .filter_map(SelectionEntry::record)
            .map(|record| (&record.key, record))
            .collect();

        let mut success = true;
        let mut counters = ApplyCounters::default();

        for entry in selection {
            let (record, delete) = match entry {
                SelectionEntry::FullPayload(record) => (record, false),
                SelectionEntry::BareKey(key) => match production.get(key) {
                    Some(record) => (*record, true),
                    None => {
                        debug!("Connection {} is not on production, nothing to delete", key);
                        continue;
                    }
                },
            };

            match Self::apply_entry(store, record, delete, &mut counters).await {
                Ok(EntryResult::Applied) | Ok(EntryResult::Skipped) => {}
                Ok(EntryResult::Unresolved) => {
                    success = false;
                    counters.failed += 1;
                }
                Err(e) => {
                    error!("Failed to apply connection {}: {:#}", record.key, e);
                    success = false;
                    counters.failed += 1;
                }
            }
        }

        let any_applied = counters.created + counters.deleted + counters.meta_writes() > 0;
        info!(
            "Transfer finished: {} created, {} updated, {} deleted, {} failed",
            counters.created, counters.updated, counters.deleted, counters.failed
        );
        TransferOutcome::new(success, any_applied, counters)
    }

    async fn apply_entry<S: Store>(
        store: &S,
        record: &ConnectionRecord,
        delete: bool,
        counters: &mut ApplyCounters,
    ) -> Result<EntryResult> {
        let from = store.find_by_stable_key(&record.from_key).await?;
        let to = store.find_by_stable_key(&record.to_key).await?;

        let (Some(from), Some(to)) = (from, to) else {
            warn!(
                "Cannot apply {} connection {} -> {}: endpoint missing on production",
                record.connection_type, record.from_name, record.to_name
            );
            return Ok(EntryResult::Unresolved);
        };

        let existing = store
            .find_connections(&record.connection_type, from.id, to.id)
            .await?;

        if delete {
            let Some(connection) = existing.first() else {
                return Ok(EntryResult::Skipped);
            };
            store.delete_connection(connection.id).await?;
            counters.deleted += 1;
            return Ok(EntryResult::Applied);
        }

        let id = match existing.first() {
            Some(connection) => connection.id,
            None => {
                let id = store
                    .create_connection(&record.connection_type, from.id, to.id)
                    .await?;
                counters.created += 1;
                id
            }
        };

        let meta_writes = Self::sync_meta(store, id, &record.meta, counters).await?;
        if !existing.is_empty() && meta_writes > 0 {
            counters.updated += 1;
        }

        Ok(EntryResult::Applied)
    }

    /// Make the metadata of connection `id` equal to `incoming`: add missing
    /// keys, update changed ones, delete keys `incoming` does not have.
    /// Returns the number of writes.
    async fn sync_meta<S: Store>(
        store: &S,
        id: ConnectionId,
        incoming: &Meta,
        counters: &mut ApplyCounters,
    ) -> Result<usize> {
        let existing = store.get_meta(id).await?;
        let mut writes = 0;

        for (key, values) in incoming {
            let value = first_value(values);
            match existing.get(key) {
                Some(current) if current.len() == 1 && first_value(current) == value => {}
                Some(_) => {
                    debug!("Updating meta '{}' on connection {}", key, id);
                    store.update_meta(id, key, value).await?;
                    counters.meta_updated += 1;
                    writes += 1;
                }
                None => {
                    debug!("Adding meta '{}' to connection {}", key, id);
                    store.add_meta(id, key, value).await?;
                    counters.meta_added += 1;
                    writes += 1;
                }
            }
        }

        for key in existing.keys().filter(|key| !incoming.contains_key(*key)) {
            debug!("Deleting meta '{}' from connection {}", key, id);
            store.delete_meta(id, key).await?;
            counters.meta_deleted += 1;
            writes += 1;
        }

        Ok(writes)
    }
}
