use crate::model::{Connection, ConnectionId, ContentId, ContentItem, Meta};
use anyhow::Result;

/// The relationship store: typed connections between content items and
/// their metadata
#[async_trait::async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Every known connection type
    async fn list_connection_types(&self) -> Result<Vec<String>>;
    /// Every connection of one type
    async fn list_connections(&self, connection_type: &str) -> Result<Vec<Connection>>;
    /// Connections of one type between two specific items
    async fn find_connections(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> Result<Vec<Connection>>;
    async fn create_connection(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> Result<ConnectionId>;
    async fn delete_connection(&self, id: ConnectionId) -> Result<bool>;

    /// All metadata of a connection, every value of a key in insertion order
    async fn get_meta(&self, id: ConnectionId) -> Result<Meta>;
    /// Add a metadata key; does nothing if the key already exists
    async fn add_meta(&self, id: ConnectionId, key: &str, value: &str) -> Result<()>;
    /// Replace every value of a metadata key with `value`
    async fn update_meta(&self, id: ConnectionId, key: &str, value: &str) -> Result<()>;
    async fn delete_meta(&self, id: ConnectionId, key: &str) -> Result<()>;
}

/// The content store, used to resolve connection endpoints
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>>;
    async fn find_by_stable_key(&self, stable_key: &str) -> Result<Option<ContentItem>>;
}

pub trait Store: ConnectionStore + ContentStore + Send + Sync {}
impl<T: ConnectionStore + ContentStore + Send + Sync> Store for T {}
