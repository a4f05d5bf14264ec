pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::SyncError;

// Export logic types
pub use logic::{
    compile_comparison_rows, Applier, BatchFilter, DeployExtra, ExtraDescriptor, ExtraRegistry,
    PreflightValidator, RelationshipReconciler, RowClassifier, SnapshotBuilder,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{ConnectionStore, ContentStore, MemoryStore, PostgresStore, Store};

use std::sync::Arc;

use crate::config::{AppConfig, StoreKind};

/// Build the registry for `config`, connecting to the configured store
pub async fn build_registry(config: &AppConfig) -> anyhow::Result<ExtraRegistry> {
    let mut registry = ExtraRegistry::new();

    match config.sync.store {
        StoreKind::Postgres => {
            let store = PostgresStore::new(
                &config.database_url(),
                config.max_connections(),
                &config.sync.table_prefix,
            )
            .await?;
            store.migrate().await?;
            registry.register(Arc::new(RelationshipReconciler::from_config(
                Arc::new(store),
                &config.sync,
            )))?;
        }
        StoreKind::Memory => {
            log::warn!("Using the in-memory store; nothing will be persisted");
            registry.register(Arc::new(RelationshipReconciler::from_config(
                Arc::new(MemoryStore::new()),
                &config.sync,
            )))?;
        }
    }

    Ok(registry)
}
