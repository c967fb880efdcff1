//! libSQL implementation of the list repository

use std::collections::HashMap;

use libsql::{params, Connection, Row, Value};

use crate::error::{Error, Result};
use crate::models::{
    ListId, ListRecord, ListSummary, ListTarget, ListUpdate, ListValue, NewList, StoredList,
    ValueChange, ValueDraft, ValueId,
};
use crate::repository::ListRepository;
use crate::util::unix_timestamp_millis;

/// libSQL implementation of `ListRepository`
pub struct LibSqlListRepository<'a> {
    conn: &'a Connection,
    target: ListTarget,
}

impl<'a> LibSqlListRepository<'a> {
    /// Create a new repository writing into `target`'s tables
    pub const fn new(conn: &'a Connection, target: ListTarget) -> Self {
        Self { conn, target }
    }

    async fn fetch_values(&self, list_id: &ListId) -> Result<Vec<ListValue>> {
        let sql = format!(
            "SELECT id, list_id, value_code, value_label, parent_value_code, sort_order, is_active
             FROM {}
             WHERE list_id = ?
             ORDER BY sort_order ASC, value_code ASC",
            self.target.tables().values
        );
        let mut rows = self.conn.query(&sql, [list_id.as_str()]).await?;

        let mut values = Vec::new();
        while let Some(row) = rows.next().await? {
            values.push(Self::parse_value(&row)?);
        }
        Ok(values)
    }

    async fn insert_value(&self, list_id: &ListId, draft: &ValueDraft) -> Result<ListValue> {
        let value = ListValue {
            id: ValueId::new(),
            list_id: *list_id,
            value_code: draft.value_code.clone(),
            value_label: draft.value_label.clone(),
            parent_value_code: draft.parent_value_code.clone(),
            sort_order: draft.sort_order,
            is_active: true,
        };

        let sql = format!(
            "INSERT INTO {} (id, list_id, value_code, value_label, parent_value_code, sort_order, is_active)
             VALUES (?, ?, ?, ?, ?, ?, 1)",
            self.target.tables().values
        );
        self.conn
            .execute(
                &sql,
                params![
                    value.id.as_str(),
                    list_id.as_str(),
                    value.value_code.clone(),
                    value.value_label.clone(),
                    optional_text(value.parent_value_code.as_deref()),
                    value.sort_order
                ],
            )
            .await?;

        Ok(value)
    }

    async fn update_value(&self, id: &ValueId, draft: &ValueDraft) -> Result<()> {
        let sql = format!(
            "UPDATE {}
             SET value_label = ?, parent_value_code = ?, sort_order = ?, is_active = 1
             WHERE id = ?",
            self.target.tables().values
        );
        let rows = self
            .conn
            .execute(
                &sql,
                params![
                    draft.value_label.clone(),
                    optional_text(draft.parent_value_code.as_deref()),
                    draft.sort_order,
                    id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn insert_rows(&self, list: &NewList) -> Result<StoredList> {
        let record = ListRecord {
            id: ListId::new(),
            list_code: list.list_code.clone(),
            list_name: list.list_name.clone(),
            is_active: true,
            updated_at: unix_timestamp_millis(),
        };

        let sql = format!(
            "INSERT INTO {} (id, list_code, list_name, is_active, updated_at) VALUES (?, ?, ?, 1, ?)",
            self.target.tables().lists
        );
        self.conn
            .execute(
                &sql,
                params![
                    record.id.as_str(),
                    record.list_code.clone(),
                    record.list_name.clone(),
                    record.updated_at
                ],
            )
            .await?;

        let mut values = Vec::with_capacity(list.values.len());
        for draft in &list.values {
            values.push(self.insert_value(&record.id, draft).await?);
        }

        Ok(StoredList { record, values })
    }

    async fn update_rows(&self, update: &ListUpdate) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET list_name = ?, is_active = 1, updated_at = ? WHERE id = ?",
            self.target.tables().lists
        );
        let rows = self
            .conn
            .execute(
                &sql,
                params![
                    update.list_name.clone(),
                    unix_timestamp_millis(),
                    update.list_id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(update.list_id.to_string()));
        }

        for change in &update.values {
            match change {
                ValueChange::Insert(draft) => {
                    self.insert_value(&update.list_id, draft).await?;
                }
                ValueChange::Update { id, draft } => self.update_value(id, draft).await?,
            }
        }

        Ok(())
    }

    /// Close the open transaction: commit on success, roll back on failure
    async fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                if let Err(e) = self.conn.execute("COMMIT", ()).await {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    fn parse_record(row: &Row) -> Result<ListRecord> {
        let id: String = row.get(0)?;
        Ok(ListRecord {
            id: parse_id(&id)?,
            list_code: row.get(1)?,
            list_name: row.get(2)?,
            is_active: row.get::<i32>(3)? != 0,
            updated_at: row.get(4)?,
        })
    }

    fn parse_value(row: &Row) -> Result<ListValue> {
        let id: String = row.get(0)?;
        let list_id: String = row.get(1)?;
        Ok(ListValue {
            id: parse_id(&id)?,
            list_id: parse_id(&list_id)?,
            value_code: row.get(2)?,
            value_label: row.get(3)?,
            parent_value_code: row.get::<Option<String>>(4)?,
            sort_order: row.get(5)?,
            is_active: row.get::<i32>(6)? != 0,
        })
    }
}

impl ListRepository for LibSqlListRepository<'_> {
    fn target(&self) -> ListTarget {
        self.target
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<StoredList>> {
        let sql = format!(
            "SELECT id, list_code, list_name, is_active, updated_at FROM {} WHERE list_code = ?",
            self.target.tables().lists
        );
        let mut rows = self.conn.query(&sql, [code]).await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let record = Self::parse_record(&row)?;
        let values = self.fetch_values(&record.id).await?;

        Ok(Some(StoredList { record, values }))
    }

    async fn insert(&self, list: &NewList) -> Result<StoredList> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = self.insert_rows(list).await;
        self.finish(result).await
    }

    async fn update(&self, update: &ListUpdate) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = self.update_rows(update).await;
        self.finish(result).await
    }

    async fn list_all(&self) -> Result<Vec<ListSummary>> {
        let tables = self.target.tables();

        let sql = format!(
            "SELECT list_id, COUNT(*) FROM {} GROUP BY list_id",
            tables.values
        );
        let mut rows = self.conn.query(&sql, ()).await?;
        let mut counts = HashMap::new();
        while let Some(row) = rows.next().await? {
            let list_id: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            counts.insert(list_id, usize::try_from(count).unwrap_or_default());
        }

        let sql = format!(
            "SELECT id, list_code, list_name, is_active, updated_at FROM {} ORDER BY list_code ASC",
            tables.lists
        );
        let mut rows = self.conn.query(&sql, ()).await?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            let record = Self::parse_record(&row)?;
            let value_count = counts.get(&record.id.as_str()).copied().unwrap_or_default();
            summaries.push(ListSummary {
                record,
                value_count,
            });
        }

        Ok(summaries)
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Database(format!("invalid identifier '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::ListDefinition;
    use crate::sync::ListSyncEngine;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn formats() -> NewList {
        NewList::from(
            &ListDefinition::new("formats", "Formats")
                .with_option("print", "Imprimé")
                .with_option("ebook", "Livre numérique"),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_find() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection(), ListTarget::System);

        let inserted = repo.insert(&formats()).await.unwrap();
        let fetched = repo.find_by_code("formats").await.unwrap().unwrap();

        assert_eq!(fetched, inserted);
        assert_eq!(fetched.values[0].value_code, "print");
        assert!(fetched.record.is_active);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_find_missing_returns_none() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection(), ListTarget::System);

        assert!(repo.find_by_code("countries").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_targets_are_isolated() {
        let db = setup().await;
        let system = LibSqlListRepository::new(db.connection(), ListTarget::System);
        let autocomplete = LibSqlListRepository::new(db.connection(), ListTarget::Autocomplete);

        system.insert(&formats()).await.unwrap();

        assert!(autocomplete.find_by_code("formats").await.unwrap().is_none());
        assert!(autocomplete.list_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_duplicate_insert_rolls_back() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection(), ListTarget::System);

        repo.insert(&formats()).await.unwrap();
        assert!(repo.insert(&formats()).await.is_err());

        let summaries = repo.list_all().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].value_count, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_changes_and_inserts_values() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection(), ListTarget::System);
        let stored = repo.insert(&formats()).await.unwrap();
        let print = stored.value("print").unwrap();

        repo.update(&ListUpdate {
            list_id: stored.record.id,
            list_name: "Formats de document".to_string(),
            values: vec![
                ValueChange::Update {
                    id: print.id,
                    draft: ValueDraft {
                        value_code: "print".to_string(),
                        value_label: "Imprimé (papier)".to_string(),
                        parent_value_code: None,
                        sort_order: 1,
                    },
                },
                ValueChange::Insert(ValueDraft {
                    value_code: "audio".to_string(),
                    value_label: "Livre audio".to_string(),
                    parent_value_code: Some("ebook".to_string()),
                    sort_order: 3,
                }),
            ],
        })
        .await
        .unwrap();

        let fetched = repo.find_by_code("formats").await.unwrap().unwrap();
        assert_eq!(fetched.record.list_name, "Formats de document");
        assert_eq!(fetched.values.len(), 3);
        assert_eq!(fetched.value("print").unwrap().value_label, "Imprimé (papier)");
        assert_eq!(
            fetched.value("audio").unwrap().parent_value_code.as_deref(),
            Some("ebook")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_unknown_list_fails() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection(), ListTarget::System);

        let result = repo
            .update(&ListUpdate {
                list_id: ListId::new(),
                list_name: "Ghost".to_string(),
                values: Vec::new(),
            })
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_engine_sync_is_idempotent() {
        let db = setup().await;
        let engine = ListSyncEngine::new(LibSqlListRepository::new(
            db.connection(),
            ListTarget::System,
        ));
        let definitions = vec![
            ListDefinition::new("formats", "Formats").with_option("print", "Imprimé"),
            ListDefinition::new("countries", "Pays").with_option("ma", "Maroc"),
        ];

        let first = engine.auto_sync(&definitions).await;
        let second = engine.auto_sync(&definitions).await;

        assert_eq!((first.created, first.failed), (2, 0));
        assert_eq!((second.created, second.updated, second.skipped), (0, 0, 2));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_engine_updates_changed_definition() {
        let db = setup().await;
        let engine = ListSyncEngine::new(LibSqlListRepository::new(
            db.connection(),
            ListTarget::Autocomplete,
        ));
        engine
            .auto_sync(&[ListDefinition::new("scripts", "Écritures").with_option("arabic", "Arabe")])
            .await;

        let report = engine
            .auto_sync(&[ListDefinition::new("scripts", "Écritures")
                .with_option("arabic", "Arabe")
                .with_option("tifinagh", "Tifinagh")])
            .await;
        assert_eq!(report.updated, 1);

        let stored = engine
            .repository()
            .find_by_code("scripts")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.values.len(), 2);
        assert_eq!(stored.value("tifinagh").unwrap().sort_order, 2);
    }
}
