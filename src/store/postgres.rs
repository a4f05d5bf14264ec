use anyhow::{anyhow, Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::model::{Connection, ConnectionId, ContentId, ContentItem, Meta};
use crate::store::traits::{ConnectionStore, ContentStore};

/// Relationship and content store backed by PostgreSQL.
///
/// Tables are `<prefix>posts`, `<prefix>p2p` and `<prefix>p2pmeta`; see
/// `migrations/` for the schema.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    table_prefix: String,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32, table_prefix: &str) -> Result<Self> {
        if !is_valid_table_prefix(table_prefix) {
            return Err(anyhow!("Invalid table prefix '{}'", table_prefix));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self {
            pool,
            table_prefix: table_prefix.to_string(),
        })
    }

    /// Run database migrations.
    ///
    /// The bundled migrations create the default `wp_` tables; any other
    /// prefix gets the same schema created directly.
    pub async fn migrate(&self) -> Result<()> {
        if self.table_prefix != "wp_" {
            return self.create_tables().await;
        }

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Create the prefixed tables if they do not exist
    pub async fn create_tables(&self) -> Result<()> {
        let posts = self.table("posts");
        let p2p = self.table("p2p");
        let p2pmeta = self.table("p2pmeta");

        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS {posts} (\
                 id BIGSERIAL PRIMARY KEY, \
                 guid TEXT NOT NULL, \
                 post_title TEXT NOT NULL DEFAULT '', \
                 post_type TEXT NOT NULL DEFAULT 'post')"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {p2p} (\
                 p2p_id BIGSERIAL PRIMARY KEY, \
                 p2p_from BIGINT NOT NULL REFERENCES {posts} (id) ON DELETE CASCADE, \
                 p2p_to BIGINT NOT NULL REFERENCES {posts} (id) ON DELETE CASCADE, \
                 p2p_type VARCHAR(44) NOT NULL)"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {p2pmeta} (\
                 meta_id BIGSERIAL PRIMARY KEY, \
                 p2p_id BIGINT NOT NULL REFERENCES {p2p} (p2p_id) ON DELETE CASCADE, \
                 meta_key VARCHAR(255) NOT NULL, \
                 meta_value TEXT)"
            ),
        ];

        for statement in &statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create tables with prefix '{}'", self.table_prefix))?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }

    fn content_from_row(row: &sqlx::postgres::PgRow) -> ContentItem {
        ContentItem {
            id: row.get("id"),
            stable_key: row.get("guid"),
            title: row.get("post_title"),
            kind: row.get("post_type"),
        }
    }

    fn connection_from_row(row: &sqlx::postgres::PgRow) -> Connection {
        Connection {
            id: row.get("p2p_id"),
            connection_type: row.get("p2p_type"),
            from: row.get("p2p_from"),
            to: row.get("p2p_to"),
        }
    }
}

/// Table prefixes are interpolated into SQL, so only `[A-Za-z0-9_]` is allowed
pub fn is_valid_table_prefix(prefix: &str) -> bool {
    prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait::async_trait]
impl ConnectionStore for PostgresStore {
    async fn list_connection_types(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT p2p_type FROM {} ORDER BY p2p_type",
            self.table("p2p")
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list connection types")?;

        Ok(rows.iter().map(|row| row.get("p2p_type")).collect())
    }

    async fn list_connections(&self, connection_type: &str) -> Result<Vec<Connection>> {
        let sql = format!(
            "SELECT p2p_id, p2p_from, p2p_to, p2p_type FROM {} WHERE p2p_type = $1 ORDER BY p2p_id",
            self.table("p2p")
        );
        let rows = sqlx::query(&sql)
            .bind(connection_type)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list connections")?;

        Ok(rows.iter().map(Self::connection_from_row).collect())
    }

    async fn find_connections(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> Result<Vec<Connection>> {
        let sql = format!(
            "SELECT p2p_id, p2p_from, p2p_to, p2p_type FROM {} \
             WHERE p2p_type = $1 AND p2p_from = $2 AND p2p_to = $3 ORDER BY p2p_id",
            self.table("p2p")
        );
        let rows = sqlx::query(&sql)
            .bind(connection_type)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .context("Failed to find connections")?;

        Ok(rows.iter().map(Self::connection_from_row).collect())
    }

    async fn create_connection(
        &self,
        connection_type: &str,
        from: ContentId,
        to: ContentId,
    ) -> Result<ConnectionId> {
        let sql = format!(
            "INSERT INTO {} (p2p_type, p2p_from, p2p_to) VALUES ($1, $2, $3) RETURNING p2p_id",
            self.table("p2p")
        );
        let row = sqlx::query(&sql)
            .bind(connection_type)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .context("Failed to create connection")?;

        Ok(row.get("p2p_id"))
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<bool> {
        let meta_sql = format!("DELETE FROM {} WHERE p2p_id = $1", self.table("p2pmeta"));
        sqlx::query(&meta_sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete connection metadata")?;

        let sql = format!("DELETE FROM {} WHERE p2p_id = $1", self.table("p2p"));
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete connection")?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_meta(&self, id: ConnectionId) -> Result<Meta> {
        let sql = format!(
            "SELECT meta_key, meta_value FROM {} WHERE p2p_id = $1 ORDER BY meta_id",
            self.table("p2pmeta")
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch connection metadata")?;

        let mut meta = Meta::new();
        for row in rows {
            let key: String = row.get("meta_key");
            let value: Option<String> = row.get("meta_value");
            meta.entry(key).or_default().push(value.unwrap_or_default());
        }
        Ok(meta)
    }

    async fn add_meta(&self, id: ConnectionId, key: &str, value: &str) -> Result<()> {
        let table = self.table("p2pmeta");
        let sql = format!(
            "INSERT INTO {table} (p2p_id, meta_key, meta_value) \
             SELECT $1, $2, $3 WHERE NOT EXISTS \
             (SELECT 1 FROM {table} WHERE p2p_id = $1 AND meta_key = $2)"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .context("Failed to add connection metadata")?;
        Ok(())
    }

    async fn update_meta(&self, id: ConnectionId, key: &str, value: &str) -> Result<()> {
        let table = self.table("p2pmeta");
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start metadata update")?;

        // A key may be stored more than once; collapse it to a single row
        sqlx::query(&format!("DELETE FROM {table} WHERE p2p_id = $1 AND meta_key = $2"))
            .bind(id)
            .bind(key)
            .execute(&mut *tx)
            .await
            .context("Failed to clear connection metadata")?;

        sqlx::query(&format!(
            "INSERT INTO {table} (p2p_id, meta_key, meta_value) VALUES ($1, $2, $3)"
        ))
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await
        .context("Failed to update connection metadata")?;

        tx.commit()
            .await
            .context("Failed to commit metadata update")?;
        Ok(())
    }

    async fn delete_meta(&self, id: ConnectionId, key: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE p2p_id = $1 AND meta_key = $2",
            self.table("p2pmeta")
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to delete connection metadata")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentStore for PostgresStore {
    async fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>> {
        let sql = format!(
            "SELECT id, guid, post_title, post_type FROM {} WHERE id = $1",
            self.table("posts")
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch content item")?;

        Ok(row.as_ref().map(Self::content_from_row))
    }

    async fn find_by_stable_key(&self, stable_key: &str) -> Result<Option<ContentItem>> {
        let sql = format!(
            "SELECT id, guid, post_title, post_type FROM {} WHERE guid = $1 ORDER BY id LIMIT 1",
            self.table("posts")
        );
        let row = sqlx::query(&sql)
            .bind(stable_key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch content item by guid")?;

        Ok(row.as_ref().map(Self::content_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_prefix_validation() {
        assert!(is_valid_table_prefix("wp_"));
        assert!(is_valid_table_prefix("site2_"));
        assert!(is_valid_table_prefix(""));
        assert!(!is_valid_table_prefix("wp; DROP TABLE x; --"));
        assert!(!is_valid_table_prefix("wp-"));
    }

    // The tests below need a database; they are skipped when DATABASE_URL
    // is not set. Each runs against its own freshly created tables.

    async fn scratch_store() -> Option<PostgresStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let prefix = format!("t{}_", uuid::Uuid::new_v4().simple());
        let store = PostgresStore::new(&url, 2, &prefix).await.unwrap();
        store.migrate().await.unwrap();
        Some(store)
    }

    async fn drop_tables(store: &PostgresStore) {
        for table in ["p2pmeta", "p2p", "posts"] {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", store.table(table)))
                .execute(store.pool())
                .await
                .unwrap();
        }
    }

    async fn insert_post(store: &PostgresStore, guid: &str, title: &str) -> ContentId {
        let row = sqlx::query(&format!(
            "INSERT INTO {} (guid, post_title, post_type) VALUES ($1, $2, 'post') RETURNING id",
            store.table("posts")
        ))
        .bind(guid)
        .bind(title)
        .fetch_one(store.pool())
        .await
        .unwrap();
        row.get("id")
    }

    async fn insert_raw_meta(store: &PostgresStore, id: ConnectionId, key: &str, value: Option<&str>) {
        sqlx::query(&format!(
            "INSERT INTO {} (p2p_id, meta_key, meta_value) VALUES ($1, $2, $3)",
            store.table("p2pmeta")
        ))
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(store.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_meta_collapses_repeated_key() {
        let Some(store) = scratch_store().await else {
            return;
        };
        let a = insert_post(&store, "guid-a", "A").await;
        let b = insert_post(&store, "guid-b", "B").await;
        let id = store.create_connection("related", a, b).await.unwrap();
        insert_raw_meta(&store, id, "color", Some("red")).await;
        insert_raw_meta(&store, id, "color", Some("blue")).await;

        store.update_meta(id, "color", "green").await.unwrap();
        store.update_meta(id, "size", "L").await.unwrap();

        let meta = store.get_meta(id).await.unwrap();
        assert_eq!(meta["color"], vec!["green".to_string()]);
        assert_eq!(meta["size"], vec!["L".to_string()]);

        drop_tables(&store).await;
    }

    #[tokio::test]
    async fn test_add_meta_keeps_existing_key() {
        let Some(store) = scratch_store().await else {
            return;
        };
        let a = insert_post(&store, "guid-a", "A").await;
        let b = insert_post(&store, "guid-b", "B").await;
        let id = store.create_connection("related", a, b).await.unwrap();

        store.add_meta(id, "color", "red").await.unwrap();
        store.add_meta(id, "color", "red").await.unwrap();
        store.add_meta(id, "color", "blue").await.unwrap();

        let meta = store.get_meta(id).await.unwrap();
        assert_eq!(meta["color"], vec!["red".to_string()]);

        store.delete_meta(id, "color").await.unwrap();
        assert!(store.get_meta(id).await.unwrap().is_empty());

        drop_tables(&store).await;
    }

    #[tokio::test]
    async fn test_null_meta_value_reads_as_empty() {
        let Some(store) = scratch_store().await else {
            return;
        };
        let a = insert_post(&store, "guid-a", "A").await;
        let b = insert_post(&store, "guid-b", "B").await;
        let id = store.create_connection("related", a, b).await.unwrap();
        insert_raw_meta(&store, id, "note", None).await;

        let meta = store.get_meta(id).await.unwrap();
        assert_eq!(meta["note"], vec![String::new()]);

        drop_tables(&store).await;
    }

    #[tokio::test]
    async fn test_connection_lifecycle() {
        let Some(store) = scratch_store().await else {
            return;
        };
        let a = insert_post(&store, "guid-a", "A").await;
        let b = insert_post(&store, "guid-b", "B").await;
        let id = store.create_connection("related", a, b).await.unwrap();
        store.add_meta(id, "color", "red").await.unwrap();

        assert_eq!(store.list_connection_types().await.unwrap(), vec!["related".to_string()]);
        let found = store.find_connections("related", a, b).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);

        let item = store.find_by_stable_key("guid-b").await.unwrap().unwrap();
        assert_eq!(item.id, b);
        assert_eq!(item.title, "B");
        assert!(store.find_by_stable_key("guid-x").await.unwrap().is_none());

        assert!(store.delete_connection(id).await.unwrap());
        assert!(!store.delete_connection(id).await.unwrap());
        assert!(store.list_connections("related").await.unwrap().is_empty());
        assert!(store.get_meta(id).await.unwrap().is_empty());

        drop_tables(&store).await;
    }

    #[tokio::test]
    async fn test_repeated_transfer_over_repeated_key_converges() {
        use crate::logic::{DeployExtra, RelationshipReconciler};
        use crate::model::{ConnectionRecord, SelectionEntry};
        use std::sync::Arc;

        let Some(store) = scratch_store().await else {
            return;
        };
        let a = insert_post(&store, "guid-a", "A").await;
        let b = insert_post(&store, "guid-b", "B").await;
        let id = store.create_connection("related", a, b).await.unwrap();
        insert_raw_meta(&store, id, "color", Some("red")).await;
        insert_raw_meta(&store, id, "color", Some("blue")).await;

        let connection = Connection {
            id,
            connection_type: "related".to_string(),
            from: a,
            to: b,
        };
        let from = store.get_content(a).await.unwrap().unwrap();
        let to = store.get_content(b).await.unwrap().unwrap();
        let mut incoming = Meta::new();
        incoming.insert("color".to_string(), vec!["green".to_string()]);
        let record = ConnectionRecord::from_parts(&connection, &from, &to, incoming.clone());
        let data = vec![SelectionEntry::FullPayload(record)];

        let store = Arc::new(store);
        let reconciler = RelationshipReconciler::new(store.clone());

        let first = reconciler.transfer_receive(&data).await.unwrap();
        assert!(first.success);
        assert!(first.any_applied);

        let second = reconciler.transfer_receive(&data).await.unwrap();
        assert!(second.success);
        assert!(!second.any_applied);
        assert_eq!(store.get_meta(id).await.unwrap(), incoming);

        drop_tables(&store).await;
    }
}
