//! Database connection management

use crate::error::{Error, Result};
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::migrations;

/// Configuration for an embedded replica of a remote libSQL database
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ReplicaConfig {
    /// Remote database URL (e.g., `libsql://lists.turso.io`)
    pub url: Option<String>,
    /// Authentication token for the remote database
    pub auth_token: Option<String>,
    /// Background pull interval; `None` means pull on demand only
    pub sync_interval: Option<Duration>,
}

impl std::fmt::Debug for ReplicaConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ReplicaConfig")
            .field("url", &self.url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl ReplicaConfig {
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            auth_token: Some(auth_token.into()),
            sync_interval: None,
        }
    }

    /// Pull remote changes in the background at the given interval
    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.auth_token.is_some()
    }
}

/// Database wrapper for libSQL connections
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    replicated: bool,
}

impl Database {
    /// Open a local database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::initialize(db, false).await
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::initialize(db, false).await
    }

    /// Open an embedded replica of a remote libSQL database.
    ///
    /// Reads are served from the local file, writes go to the remote and are
    /// pulled back on [`Database::sync`].
    pub async fn open_replica(local_path: impl AsRef<Path>, replica: ReplicaConfig) -> Result<Self> {
        let path_str = local_path.as_ref().to_string_lossy().to_string();
        let url = replica
            .url
            .clone()
            .ok_or_else(|| Error::InvalidInput("Replica URL is required".into()))?;
        let token = replica
            .auth_token
            .clone()
            .ok_or_else(|| Error::InvalidInput("Replica auth token is required".into()))?;

        let mut builder = Builder::new_remote_replica(&path_str, url, token);
        if let Some(interval) = replica.sync_interval {
            builder = builder.sync_interval(interval);
            tracing::debug!("Replica sync interval set to {:?}", interval);
        }

        let db = builder.build().await?;

        // Pull first so migrations see the remote schema
        db.sync().await?;
        tracing::debug!("Initial replica sync completed");

        Self::initialize(db, true).await
    }

    async fn initialize(db: LibSqlDatabase, replicated: bool) -> Result<Self> {
        let conn = db.connect()?;
        let database = Self {
            db,
            conn,
            replicated,
        };
        database.configure().await?;
        migrations::run(&database.conn).await?;
        Ok(database)
    }

    async fn configure(&self) -> Result<()> {
        // Some pragmas are rejected by remote replicas; only foreign keys are required.
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Pull remote changes into the local replica (no-op for local databases)
    pub async fn sync(&self) -> Result<()> {
        if self.replicated {
            self.db.sync().await?;
            tracing::debug!("Replica synced with remote");
        }
        Ok(())
    }

    pub const fn is_replica(&self) -> bool {
        self.replicated
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!db.is_replica());
        db.sync().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_file_creates_schema() {
        let tmp = tempdir().unwrap();
        let db = Database::open(tmp.path().join("lists.db")).await.unwrap();

        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM system_lists", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);
    }

    #[test]
    fn test_replica_config_new() {
        let config = ReplicaConfig::new("libsql://lists.turso.io", "test-token")
            .with_sync_interval(Duration::from_secs(30));
        assert!(config.is_configured());
        assert_eq!(config.sync_interval, Some(Duration::from_secs(30)));
        assert!(!format!("{config:?}").contains("test-token"));
    }

    #[test]
    fn test_replica_config_default_not_configured() {
        assert!(!ReplicaConfig::default().is_configured());
    }

    /// Only runs when a remote database is available:
    /// TURSO_DATABASE_URL=... TURSO_AUTH_TOKEN=... cargo test test_open_replica -- --ignored
    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires TURSO_DATABASE_URL and TURSO_AUTH_TOKEN"]
    async fn test_open_replica() {
        let url = env::var("TURSO_DATABASE_URL").expect("TURSO_DATABASE_URL must be set");
        let token = env::var("TURSO_AUTH_TOKEN").expect("TURSO_AUTH_TOKEN must be set");

        let tmp = tempdir().unwrap();
        let db = Database::open_replica(tmp.path().join("replica.db"), ReplicaConfig::new(url, token))
            .await
            .unwrap();
        assert!(db.is_replica());
        db.sync().await.expect("Sync should succeed");
    }
}
