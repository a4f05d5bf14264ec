use anyhow::Result;
use log::{debug, warn};

use crate::model::{single_valued, Connection, ConnectionRecord, Snapshot};
use crate::store::traits::Store;

/// Enumerates every connection of every type in one environment
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Build the snapshot of all connections in `store`.
    ///
    /// Connections whose endpoints cannot be resolved are left out. Two
    /// connections with the same type and endpoints collapse into one
    /// record; the one enumerated last wins.
    pub async fn build<S: Store>(store: &S) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();

        for connection_type in store.list_connection_types().await? {
            for connection in store.list_connections(&connection_type).await? {
                let Some(record) = Self::record_for(store, &connection).await? else {
                    continue;
                };

                if let Some(replaced) = snapshot.insert(record) {
                    debug!(
                        "Connection {} replaced an earlier {} connection with key {}",
                        connection.id, replaced.connection_type, replaced.key
                    );
                }
            }
        }

        debug!("Built snapshot of {} connections", snapshot.len());
        Ok(snapshot)
    }

    async fn record_for<S: Store>(
        store: &S,
        connection: &Connection,
    ) -> Result<Option<ConnectionRecord>> {
        let from = store.get_content(connection.from).await?;
        let to = store.get_content(connection.to).await?;

        let (Some(from), Some(to)) = (from, to) else {
            warn!(
                "Skipping {} connection {}: endpoint {} -> {} not found",
                connection.connection_type, connection.id, connection.from, connection.to
            );
            return Ok(None);
        };

        let meta = single_valued(store.get_meta(connection.id).await?);
        Ok(Some(ConnectionRecord::from_parts(connection, &from, &to, meta)))
    }
}
