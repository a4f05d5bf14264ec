use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::SyncError;
use crate::logic::extra::DeployExtra;

/// Public description of a registered extra
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Extras known to this process, keyed by callback id.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct ExtraRegistry {
    extras: BTreeMap<String, Arc<dyn DeployExtra>>,
}

impl ExtraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extra: Arc<dyn DeployExtra>) -> Result<String, SyncError> {
        let id = extra.callback_id();
        if self.extras.contains_key(&id) {
            return Err(SyncError::DuplicateExtra(id));
        }

        info!("Registered extra '{}' as '{}'", extra.name(), id);
        self.extras.insert(id.clone(), extra);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn DeployExtra>, SyncError> {
        self.extras
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::UnknownExtra(id.to_string()))
    }

    pub fn descriptors(&self) -> Vec<ExtraDescriptor> {
        self.extras
            .iter()
            .map(|(id, extra)| ExtraDescriptor {
                id: id.clone(),
                name: extra.name().to_string(),
                description: extra.description().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.extras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::RelationshipReconciler;
    use crate::store::MemoryStore;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ExtraRegistry::new();
        let reconciler = RelationshipReconciler::new(Arc::new(MemoryStore::new()));

        let id = registry.register(Arc::new(reconciler)).unwrap();

        assert_eq!(id, "ramp-posts-to-posts-data-sync");
        assert!(registry.get(&id).is_ok());
        assert!(matches!(registry.get("nope"), Err(SyncError::UnknownExtra(_))));
        assert_eq!(registry.descriptors()[0].name, "RAMP Posts to Posts Data Sync");
    }

    #[test]
    fn test_duplicate_callback_id_is_rejected() {
        let mut registry = ExtraRegistry::new();
        let store = Arc::new(MemoryStore::new());

        registry
            .register(Arc::new(RelationshipReconciler::new(store.clone())))
            .unwrap();
        let result = registry.register(Arc::new(RelationshipReconciler::with_name(
            store,
            "ramp posts-to-posts data sync",
            "",
        )));

        assert!(matches!(result, Err(SyncError::DuplicateExtra(_))));
        assert_eq!(registry.len(), 1);
    }
}
