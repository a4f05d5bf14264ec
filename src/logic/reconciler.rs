use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::config::{SyncConfig, DEFAULT_EXTRA_DESCRIPTION, DEFAULT_EXTRA_NAME};
use crate::logic::apply::Applier;
use crate::logic::batch_filter::BatchFilter;
use crate::logic::classify::RowClassifier;
use crate::logic::extra::DeployExtra;
use crate::logic::preflight::PreflightValidator;
use crate::logic::snapshot::SnapshotBuilder;
use crate::model::{
    make_callback_id, BatchContext, ComparisonRow, PreflightReport, Selection, SelectionEntry,
    SelectionRow, Snapshot, TransferOutcome,
};
use crate::store::traits::Store;

/// Compares, validates and transfers connections between two environments.
///
/// The same reconciler runs on staging and on production; each phase only
/// reads from or writes to the store of the environment it runs in.
pub struct RelationshipReconciler<S: Store> {
    store: Arc<S>,
    name: String,
    description: String,
    callback_id: String,
}

impl<S: Store> RelationshipReconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_name(store, DEFAULT_EXTRA_NAME, DEFAULT_EXTRA_DESCRIPTION)
    }

    pub fn with_name(store: Arc<S>, name: &str, description: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
            description: description.to_string(),
            callback_id: make_callback_id(name),
        }
    }

    pub fn from_config(store: Arc<S>, config: &SyncConfig) -> Self {
        Self::with_name(store, &config.extra_name, &config.description)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every connection in this environment
    pub async fn snapshot(&self) -> Result<Snapshot> {
        SnapshotBuilder::build(self.store.as_ref()).await
    }

    /// The part of this environment's snapshot selected in `batch`.
    ///
    /// Checks the batch before touching the store.
    pub async fn send(&self, batch: &BatchContext) -> Result<Option<Selection>> {
        if batch.selection_for(&self.callback_id).is_none() {
            return Ok(None);
        }

        let snapshot = self.snapshot().await?;
        Ok(BatchFilter::for_batch(&snapshot, batch, &self.callback_id))
    }
}

#[async_trait::async_trait]
impl<S: Store + 'static> DeployExtra for RelationshipReconciler<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn callback_id(&self) -> String {
        self.callback_id.clone()
    }

    async fn comparison_send(&self, _batch: &BatchContext) -> Result<Snapshot> {
        self.snapshot().await
    }

    async fn comparison_check(&self, _data: &Snapshot, _batch: &BatchContext) -> Result<Snapshot> {
        self.snapshot().await
    }

    fn comparison_selection_row(&self, row: &ComparisonRow) -> Option<SelectionRow> {
        RowClassifier::classify(row)
    }

    async fn preflight_send(&self, batch: &BatchContext) -> Result<Option<Selection>> {
        self.send(batch).await
    }

    async fn preflight_check(
        &self,
        data: &[SelectionEntry],
        batch: &BatchContext,
    ) -> Result<PreflightReport> {
        if data.is_empty() {
            return Ok(PreflightReport::default());
        }

        let production = self.snapshot().await?;
        PreflightValidator::check(self.store.as_ref(), data, batch, &production).await
    }

    async fn transfer_send(&self, batch: &BatchContext) -> Result<Option<Selection>> {
        self.send(batch).await
    }

    async fn transfer_receive(&self, data: &[SelectionEntry]) -> Result<TransferOutcome> {
        if data.is_empty() {
            return Ok(TransferOutcome::nothing_to_deploy());
        }

        let own_batch = BatchContext::for_extra(self.callback_id.clone(), data.to_vec());
        let resolved = self.send(&own_batch).await?.unwrap_or_default();

        let outcome = Applier::apply(self.store.as_ref(), data, &resolved).await;
        info!("{}: {}", self.name, outcome.message);
        Ok(outcome)
    }
}
