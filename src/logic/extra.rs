use anyhow::Result;
use serde_json::Value;

use crate::model::{
    make_callback_id, BatchContext, ComparisonRow, PreflightReport, Selection, SelectionEntry,
    SelectionRow, Snapshot, TransferOutcome,
};

/// The callbacks a deployment orchestrator invokes on an extra, one per
/// lifecycle point.
///
/// Methods returning `Option<Selection>` return `None` when the batch holds
/// nothing for this extra; the orchestrator then skips the matching
/// receiving phase.
#[async_trait::async_trait]
pub trait DeployExtra: Send + Sync {
    /// Untranslated name; the callback id is derived from it
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn callback_id(&self) -> String {
        make_callback_id(self.name())
    }

    /// Staging: full state for the new batch comparison
    async fn comparison_send(&self, batch: &BatchContext) -> Result<Snapshot>;

    /// Production: full state to compare against `data` from staging
    async fn comparison_check(&self, data: &Snapshot, batch: &BatchContext) -> Result<Snapshot>;

    /// Staging: the row to display for one compiled comparison pair
    fn comparison_selection_row(&self, row: &ComparisonRow) -> Option<SelectionRow>;

    /// Staging: the selected subset to validate
    async fn preflight_send(&self, batch: &BatchContext) -> Result<Option<Selection>>;

    /// Production: validate `data` before transfer
    async fn preflight_check(
        &self,
        data: &[SelectionEntry],
        batch: &BatchContext,
    ) -> Result<PreflightReport>;

    /// Staging: adjust the combined preflight messages of every extra
    fn preflight_display(&self, messages: Value) -> Value {
        messages
    }

    /// Staging: the selected subset to transfer
    async fn transfer_send(&self, batch: &BatchContext) -> Result<Option<Selection>>;

    /// Production: apply `data`
    async fn transfer_receive(&self, data: &[SelectionEntry]) -> Result<TransferOutcome>;
}
