use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ConnectionId, ConnectionKey, ContentId, ContentItem};

/// Connection metadata: key -> values.
///
/// Snapshots always carry each value wrapped in a single-element list and
/// consumers read index 0. Keys are kept ordered so two maps compare equal
/// regardless of the order their keys were inserted in.
pub type Meta = BTreeMap<String, Vec<String>>;

/// The value a metadata entry is applied with
pub fn first_value(values: &[String]) -> &str {
    values.first().map(String::as_str).unwrap_or_default()
}

/// Reduce stored metadata to the snapshot form: one value per key, the
/// one `first_value` reads
pub fn single_valued(meta: Meta) -> Meta {
    meta.into_iter()
        .map(|(key, values)| {
            let value = first_value(&values).to_string();
            (key, vec![value])
        })
        .collect()
}

/// A connection row as stored locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub from: ContentId,
    pub to: ContentId,
}

/// A connection augmented with environment-independent endpoint keys,
/// denormalised display fields and its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub key: ConnectionKey,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub from_key: String,
    pub to_key: String,
    pub from_name: String,
    pub to_name: String,
    pub from_kind: String,
    pub to_kind: String,
    #[serde(default)]
    pub meta: Meta,
}

impl ConnectionRecord {
    /// Build a record from a local connection and its resolved endpoints
    pub fn from_parts(
        connection: &Connection,
        from: &ContentItem,
        to: &ContentItem,
        meta: Meta,
    ) -> Self {
        Self {
            key: ConnectionKey::derive(&connection.connection_type, &from.stable_key, &to.stable_key),
            connection_type: connection.connection_type.clone(),
            from_key: from.stable_key.clone(),
            to_key: to.stable_key.clone(),
            from_name: from.title.clone(),
            to_name: to.title.clone(),
            from_kind: from.kind.clone(),
            to_kind: to.kind.clone(),
            meta,
        }
    }

    /// Metadata equality as applied: same keys, same first value per key
    pub fn same_meta(&self, other: &ConnectionRecord) -> bool {
        self.meta.len() == other.meta.len()
            && self.meta.iter().all(|(key, values)| {
                other
                    .meta
                    .get(key)
                    .is_some_and(|theirs| first_value(theirs) == first_value(values))
            })
    }
}

/// Every connection of an environment, keyed by connection key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<ConnectionKey, ConnectionRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record with the same key.
    /// Returns the replaced record.
    pub fn insert(&mut self, record: ConnectionRecord) -> Option<ConnectionRecord> {
        self.records.insert(record.key.clone(), record)
    }

    pub fn get(&self, key: &ConnectionKey) -> Option<&ConnectionRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ConnectionKey> {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &ConnectionRecord> {
        self.records.values()
    }
}

impl FromIterator<ConnectionRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ConnectionRecord>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}
