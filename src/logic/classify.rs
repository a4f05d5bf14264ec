use std::collections::{BTreeSet, HashSet};

use crate::model::{ChangeKind, ComparisonRow, ConnectionKey, SelectionRow, Snapshot};

/// Turns a staging/production pair into a new batch row
pub struct RowClassifier;

impl RowClassifier {
    /// Classify one comparison row.
    ///
    /// Returns `None` when there is nothing to reconcile: both sides carry the
    /// same metadata, or neither side has the connection.
    pub fn classify(row: &ComparisonRow) -> Option<SelectionRow> {
        let action = ChangeKind::between(row.status.as_ref(), row.remote_status.as_ref())?;

        let (title, message) = match (action, &row.status, &row.remote_status) {
            (ChangeKind::Update, Some(local), _) => (
                format!("Update metadata: {} -> {}", local.from_name, local.to_name),
                format!("{} Connection", local.connection_type),
            ),
            (ChangeKind::Create, Some(local), _) => (
                format!("{} -> {}", local.from_name, local.to_name),
                format!("{} Connection", local.connection_type),
            ),
            (ChangeKind::Delete, _, Some(remote)) => (
                format!("Remove {} -> {}", remote.from_name, remote.to_name),
                format!("{} Connection Deletion", remote.connection_type),
            ),
            _ => return None,
        };

        Some(SelectionRow {
            action,
            selected: row.in_batch,
            forced: false,
            title,
            message,
        })
    }
}

/// Pair a staging and a production snapshot by connection key.
///
/// `selected` holds the keys whose checkbox was checked before; rows come
/// back sorted by key.
pub fn compile_comparison_rows(
    staging: &Snapshot,
    production: &Snapshot,
    selected: &HashSet<ConnectionKey>,
) -> Vec<ComparisonRow> {
    let keys: BTreeSet<&ConnectionKey> = staging.keys().chain(production.keys()).collect();

    keys.into_iter()
        .map(|key| ComparisonRow {
            status: staging.get(key).cloned(),
            remote_status: production.get(key).cloned(),
            in_batch: selected.contains(key),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionRecord, Meta};

    fn record(meta: &[(&str, &str)]) -> ConnectionRecord {
        ConnectionRecord {
            key: ConnectionKey::derive("related", "guid-a", "guid-b"),
            connection_type: "related".to_string(),
            from_key: "guid-a".to_string(),
            to_key: "guid-b".to_string(),
            from_name: "A".to_string(),
            to_name: "B".to_string(),
            from_kind: "post".to_string(),
            to_kind: "post".to_string(),
            meta: meta
                .iter()
                .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
                .collect::<Meta>(),
        }
    }

    #[test]
    fn test_identical_meta_yields_no_row() {
        let row = ComparisonRow {
            status: Some(record(&[("color", "red"), ("size", "xl")])),
            remote_status: Some(record(&[("size", "xl"), ("color", "red")])),
            in_batch: true,
        };
        assert!(RowClassifier::classify(&row).is_none());
    }

    #[test]
    fn test_create_row() {
        let row = ComparisonRow {
            status: Some(record(&[("color", "red")])),
            remote_status: None,
            in_batch: false,
        };
        let result = RowClassifier::classify(&row).unwrap();
        assert_eq!(result.action, ChangeKind::Create);
        assert_eq!(result.title, "A -> B");
        assert_eq!(result.message, "related Connection");
        assert!(!result.selected);
        assert!(!result.forced);
    }

    #[test]
    fn test_update_row() {
        let row = ComparisonRow {
            status: Some(record(&[("color", "red")])),
            remote_status: Some(record(&[("color", "blue")])),
            in_batch: true,
        };
        let result = RowClassifier::classify(&row).unwrap();
        assert_eq!(result.action, ChangeKind::Update);
        assert_eq!(result.title, "Update metadata: A -> B");
        assert_eq!(result.message, "related Connection");
        assert!(result.selected);
    }

    #[test]
    fn test_delete_row() {
        let row = ComparisonRow {
            status: None,
            remote_status: Some(record(&[])),
            in_batch: true,
        };
        let result = RowClassifier::classify(&row).unwrap();
        assert_eq!(result.action, ChangeKind::Delete);
        assert_eq!(result.title, "Remove A -> B");
        assert_eq!(result.message, "related Connection Deletion");
        assert!(result.selected);
    }

    #[test]
    fn test_empty_row() {
        assert!(RowClassifier::classify(&ComparisonRow::default()).is_none());
    }

    #[test]
    fn test_compile_rows_pairs_by_key() {
        let shared = record(&[("color", "red")]);
        let mut staging_only = record(&[]);
        staging_only.key = ConnectionKey::from("staging-only");
        let mut production_only = record(&[]);
        production_only.key = ConnectionKey::from("production-only");

        let staging: Snapshot = vec![shared.clone(), staging_only.clone()].into_iter().collect();
        let production: Snapshot = vec![shared.clone(), production_only.clone()].into_iter().collect();
        let selected: HashSet<ConnectionKey> = [staging_only.key.clone()].into_iter().collect();

        let rows = compile_comparison_rows(&staging, &production, &selected);

        assert_eq!(rows.len(), 3);
        let by_key = |key: &ConnectionKey| {
            rows.iter()
                .find(|row| {
                    row.status.as_ref().map(|r| &r.key) == Some(key)
                        || row.remote_status.as_ref().map(|r| &r.key) == Some(key)
                })
                .unwrap()
        };
        assert!(by_key(&shared.key).status.is_some() && by_key(&shared.key).remote_status.is_some());
        assert!(by_key(&staging_only.key).in_batch);
        assert!(by_key(&production_only.key).status.is_none());
        assert!(!by_key(&production_only.key).in_batch);
    }
}
