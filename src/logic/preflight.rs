use anyhow::Result;
use log::debug;

use crate::model::{
    BatchContext, ConnectionRecord, ContentItem, PreflightReport, SelectionEntry, Snapshot,
    DELETION_ROW, SYNC_ROW,
};
use crate::store::traits::Store;

pub const SYNC_MESSAGE: &str = "Selected connections will be synced";

/// Where a connection endpoint can be found when the batch lands
#[derive(Debug, Clone, PartialEq)]
enum Endpoint {
    /// Already present on production
    InTarget(ContentItem),
    /// Not on production yet, but transferred in the same batch
    InBatch,
    Missing,
}

impl Endpoint {
    fn is_resolvable(&self) -> bool {
        !matches!(self, Endpoint::Missing)
    }

    fn target(&self) -> Option<&ContentItem> {
        match self {
            Endpoint::InTarget(item) => Some(item),
            _ => None,
        }
    }
}

/// Checks on production that a selection can be applied
pub struct PreflightValidator;

impl PreflightValidator {
    /// Validate `selection` against `store`.
    ///
    /// `production` is the production snapshot, used to describe deletions.
    /// Unresolvable endpoints and deletions of unknown connections are
    /// blocking errors.
    pub async fn check<S: Store>(
        store: &S,
        selection: &[SelectionEntry],
        batch: &BatchContext,
        production: &Snapshot,
    ) -> Result<PreflightReport> {
        let mut report = PreflightReport::default();

        for entry in selection {
            match entry {
                SelectionEntry::BareKey(key) => match production.get(key) {
                    Some(existing) => report.push_row_message(
                        DELETION_ROW,
                        format!(
                            "{} connection will be deleted: {} to {}",
                            existing.connection_type, existing.from_name, existing.to_name
                        ),
                    ),
                    None => report.push_error(format!("Could not find the connection (key {})", key)),
                },
                SelectionEntry::FullPayload(record) => {
                    Self::check_record(store, record, batch, &mut report).await?;
                }
            }
        }

        if !report.is_blocking() {
            report.messages.push(SYNC_MESSAGE.to_string());
        }

        debug!(
            "Preflight checked {} entries: {} errors",
            selection.len(),
            report.errors.len()
        );
        Ok(report)
    }

    async fn check_record<S: Store>(
        store: &S,
        record: &ConnectionRecord,
        batch: &BatchContext,
        report: &mut PreflightReport,
    ) -> Result<()> {
        let from = Self::resolve(store, batch, &record.from_key).await?;
        let to = Self::resolve(store, batch, &record.to_key).await?;

        for (endpoint, kind, name) in [
            (&from, &record.from_kind, &record.from_name),
            (&to, &record.to_kind, &record.to_name),
        ] {
            if !endpoint.is_resolvable() {
                report.push_error(format!(
                    "A selected \"{}\" connection requires that you send {} '{}'",
                    record.connection_type, kind, name
                ));
            }
        }

        if !from.is_resolvable() || !to.is_resolvable() {
            return Ok(());
        }

        let exists = match (from.target(), to.target()) {
            (Some(from), Some(to)) => !store
                .find_connections(&record.connection_type, from.id, to.id)
                .await?
                .is_empty(),
            _ => false,
        };

        let verb = if exists { "updated" } else { "created" };
        report.push_row_message(
            SYNC_ROW,
            format!(
                "{} connection will be {}: {} to {}",
                record.connection_type, verb, record.from_name, record.to_name
            ),
        );
        Ok(())
    }

    async fn resolve<S: Store>(store: &S, batch: &BatchContext, stable_key: &str) -> Result<Endpoint> {
        if let Some(item) = store.find_by_stable_key(stable_key).await? {
            return Ok(Endpoint::InTarget(item));
        }
        if batch.contains_content(stable_key) {
            return Ok(Endpoint::InBatch);
        }
        Ok(Endpoint::Missing)
    }
}
