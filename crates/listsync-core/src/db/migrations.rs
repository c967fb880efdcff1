//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        apply(conn, 1, &migration_v1()).await?;
    }
    if version < 2 {
        apply(conn, 2, &migration_v2()).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists = match rows.next().await? {
        Some(row) => row.get::<i32>(0)? != 0,
        None => false,
    };
    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

/// Run one migration's statements in a transaction and record its version
async fn apply(conn: &Connection, version: i32, statements: &[String]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute(
            "INSERT INTO schema_version (version) VALUES (?)",
            [i64::from(version)],
        )
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} (latest {CURRENT_VERSION})");
    Ok(())
}

/// Version 1: schema tracking and system lists
fn migration_v1() -> Vec<String> {
    let mut statements = vec!["CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )"
    .to_string()];
    statements.extend(list_tables("system_lists", "system_list_values"));
    statements
}

/// Version 2: autocomplete lists share the system lists' shape
fn migration_v2() -> Vec<String> {
    list_tables("autocomplete_lists", "autocomplete_list_values")
}

fn list_tables(lists: &str, values: &str) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {lists} (
                id TEXT PRIMARY KEY,
                list_code TEXT NOT NULL UNIQUE,
                list_name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                updated_at INTEGER NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {values} (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL REFERENCES {lists}(id) ON DELETE CASCADE,
                value_code TEXT NOT NULL,
                value_label TEXT NOT NULL,
                parent_value_code TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                UNIQUE (list_id, value_code)
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{values}_list ON {values}(list_id, sort_order)"),
    ]
}
