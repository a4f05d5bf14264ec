use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::{Connection, ConnectionId, ContentId, ContentItem, Meta, NewContentItem};
use crate::store::traits::{ConnectionStore, ContentStore};

#[derive(Debug, Default)]
struct Inner {
    content: BTreeMap<ContentId, ContentItem>,
    by_stable_key: HashMap<String, ContentId>,
    connections: BTreeMap<ConnectionId, Connection>,
    meta: HashMap<ConnectionId, Meta>,
    next_content_id: ContentId,
    next_connection_id: ConnectionId,
}

/// In-process store holding content items, connections and metadata.
///
/// Every trait call is counted so callers can check whether a phase touched
/// the store at all.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    accesses: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store trait calls made so far
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }

    /// Insert a content item, assigning a local id (and a stable key if none given)
    pub fn insert_content(&self, new_item: NewContentItem) -> ContentItem {
        let mut inner = self.inner.write();
        inner.next_content_id += 1;
        let item = new_item.into_item(inner.next_content_id);
        inner.by_stable_key.insert(item.stable_key.clone(), item.id);
        inner.content.insert(item.id, item.clone());
        item
    }

    pub fn remove_content(&self, id: ContentId) -> Option<ContentItem> {
        let mut inner = self.inner.write();
        let item = inner.content.remove(&id)?;
        inner.by_stable_key.remove(&item.stable_key);
        Some(item)
    }

    /// Insert a connection with metadata, bypassing the trait
    pub fn connect(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
        meta: &[(&str, &str)],
    ) -> ConnectionId {
        let mut inner = self.inner.write();
        let id = Self::push_connection(&mut inner, connection_type, from, to);
        let entry = inner.meta.entry(id).or_default();
        for (key, value) in meta {
            entry
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
        }
        id
    }

    /// Metadata of a connection, bypassing the trait
    pub fn meta_of(&self, id: ConnectionId) -> Meta {
        self.inner.read().meta.get(&id).cloned().unwrap_or_default()
    }

    /// All connections, bypassing the trait
    pub fn all_connections(&self) -> Vec<Connection> {
        self.inner.read().connections.values().cloned().collect()
    }

    fn push_connection(
        inner: &mut Inner,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> ConnectionId {
        inner.next_connection_id += 1;
        let id = inner.next_connection_id;
        inner.connections.insert(
            id,
            Connection {
                id,
                connection_type: connection_type.to_string(),
                from,
                to,
            },
        );
        id
    }
}

#[async_trait::async_trait]
impl ConnectionStore for MemoryStore {
    async fn list_connection_types(&self) -> Result<Vec<String>> {
        self.touch();
        let inner = self.inner.read();
        let mut types: Vec<String> = inner
            .connections
            .values()
            .map(|c| c.connection_type.clone())
            .collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn list_connections(&self, connection_type: &str) -> Result<Vec<Connection>> {
        self.touch();
        let inner = self.inner.read();
        Ok(inner
            .connections
            .values()
            .filter(|c| c.connection_type == connection_type)
            .cloned()
            .collect())
    }

    async fn find_connections(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> Result<Vec<Connection>> {
        self.touch();
        let inner = self.inner.read();
        Ok(inner
            .connections
            .values()
            .filter(|c| c.connection_type == connection_type && c.from == from && c.to == to)
            .cloned()
            .collect())
    }

    async fn create_connection(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> Result<ConnectionId> {
        self.touch();
        let mut inner = self.inner.write();
        if !inner.content.contains_key(&from) || !inner.content.contains_key(&to) {
            return Err(anyhow!(
                "Cannot connect {} -> {}: endpoint does not exist",
                from,
                to
            ));
        }
        Ok(Self::push_connection(&mut inner, connection_type, from, to))
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<bool> {
        self.touch();
        let mut inner = self.inner.write();
        inner.meta.remove(&id);
        Ok(inner.connections.remove(&id).is_some())
    }

    async fn get_meta(&self, id: ConnectionId) -> Result<Meta> {
        self.touch();
        Ok(self.meta_of(id))
    }

    async fn add_meta(&self, id: ConnectionId, key: &str, value: &str) -> Result<()> {
        self.touch();
        let mut inner = self.inner.write();
        let entry = inner.meta.entry(id).or_default();
        entry
            .entry(key.to_string())
            .or_insert_with(|| vec![value.to_string()]);
        Ok(())
    }

    async fn update_meta(&self, id: ConnectionId, key: &str, value: &str) -> Result<()> {
        self.touch();
        let mut inner = self.inner.write();
        inner
            .meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), vec![value.to_string()]);
        Ok(())
    }

    async fn delete_meta(&self, id: ConnectionId, key: &str) -> Result<()> {
        self.touch();
        let mut inner = self.inner.write();
        if let Some(meta) = inner.meta.get_mut(&id) {
            meta.remove(key);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>> {
        self.touch();
        Ok(self.inner.read().content.get(&id).cloned())
    }

    async fn find_by_stable_key(&self, stable_key: &str) -> Result<Option<ContentItem>> {
        self.touch();
        let inner = self.inner.read();
        Ok(inner
            .by_stable_key
            .get(stable_key)
            .and_then(|id| inner.content.get(id))
            .cloned())
    }
}
