use std::env;
use std::path::{Path, PathBuf};

use listsync_core::catalog;
use listsync_core::config::BackendConfig;
use listsync_core::db::Database;
use listsync_core::models::{ListSummary, ReportVariant};
use listsync_core::repository::RestClient;
use listsync_core::sync::{PlanAction, SyncPlan};
use listsync_core::{ListDefinition, ListTarget, SyncReport};
use serde::Serialize;

use crate::cli::Backend;
use crate::error::CliError;

/// Backend for this run: the explicit flag, else REST when it is configured
pub fn resolve_backend(selected: Option<Backend>, config: &BackendConfig) -> Backend {
    selected.unwrap_or_else(|| {
        if config.is_rest_configured() {
            Backend::Rest
        } else {
            Backend::Libsql
        }
    })
}

/// Where lists are read from and written to for one CLI invocation
pub enum Store {
    Local(Database),
    Rest(RestClient),
}

impl Store {
    pub async fn open(
        backend: Backend,
        db_path: &Path,
        config: &BackendConfig,
    ) -> Result<Self, CliError> {
        match backend {
            Backend::Libsql => Ok(Self::Local(open_database(db_path, config).await?)),
            Backend::Rest => {
                let client = RestClient::from_config(config)?;
                tracing::debug!("Using REST backend at {}", client.base_url());
                Ok(Self::Rest(client))
            }
        }
    }

    /// Push local replica writes and pull remote changes (no-op otherwise)
    pub async fn finish(&self) -> Result<(), CliError> {
        if let Self::Local(db) = self {
            db.sync().await?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ListItem {
    pub target: ListTarget,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub value_count: usize,
    pub updated_at: i64,
    pub updated_at_iso: String,
}

pub fn list_item(target: ListTarget, summary: &ListSummary) -> ListItem {
    ListItem {
        target,
        code: summary.record.list_code.clone(),
        name: summary.record.list_name.clone(),
        is_active: summary.record.is_active,
        value_count: summary.value_count,
        updated_at: summary.record.updated_at,
        updated_at_iso: format_timestamp(summary.record.updated_at),
    }
}

/// Definitions for `target`, from `file` when given, else the built-in catalog
pub fn resolve_definitions(
    target: ListTarget,
    file: Option<&Path>,
) -> Result<Vec<ListDefinition>, CliError> {
    match file {
        Some(path) => Ok(catalog::load_definitions(path)?),
        None => Ok(catalog::definitions_for(target)),
    }
}

/// A definitions file describes a single list family
pub fn ensure_single_target(targets: &[ListTarget], file: Option<&Path>) -> Result<(), CliError> {
    if file.is_some() && targets.len() > 1 {
        return Err(CliError::Config(
            "--file requires --target system or --target autocomplete".to_string(),
        ));
    }
    Ok(())
}

/// Banner for a finished run: status line followed by one line per failure
pub fn format_report_lines(report: &SyncReport) -> Vec<String> {
    let marker = match report.variant() {
        ReportVariant::Success => "✓",
        ReportVariant::Destructive => "✗",
    };
    let mut lines = vec![format!("{marker} {}", report.summary())];
    lines.extend(
        report
            .errors
            .iter()
            .map(|failure| format!("  - {}: {}", failure.code, failure.message)),
    );
    lines
}

pub fn format_plan_lines(plan: &SyncPlan) -> Vec<String> {
    let mut lines = vec![format!(
        "{} lists: {} to create, {} to update, {} unchanged, {} failed",
        plan.target,
        plan.creates(),
        plan.updates(),
        plan.unchanged(),
        plan.failures()
    )];

    for item in &plan.items {
        let mut line = match &item.action {
            PlanAction::Create { values } => format!("  + {} ({values} values)", item.code),
            PlanAction::Update { changes } => format!("  ~ {}: {}", item.code, changes.join(", ")),
            PlanAction::Unchanged => format!("  = {}", item.code),
            PlanAction::Failed { message } => format!("  ! {}: {message}", item.code),
        };
        if item.stale_values > 0 {
            line.push_str(&format!(" [{} stale values kept]", item.stale_values));
        }
        lines.push(line);
    }
    lines
}

pub fn format_list_lines(items: &[ListItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let status = if item.is_active { "" } else { " (inactive)" };
            format!(
                "{:<13} {:<26} {:>3} values  {}{}  {}",
                item.target.as_str(),
                item.code,
                item.value_count,
                item.name,
                status,
                item.updated_at_iso
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LISTSYNC_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("listsync")
        .join("lists.db")
}

pub async fn open_database(path: &Path, config: &BackendConfig) -> Result<Database, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let Some(replica) = config.replica()? else {
        return Ok(Database::open(path).await?);
    };

    tracing::info!("Using embedded replica of {}", replica.url.as_deref().unwrap_or_default());
    // Replica bootstrap needs a deeper stack than the default worker threads
    let path_buf = path.to_path_buf();
    let db = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|error| listsync_core::Error::Database(error.to_string()))?;
            runtime.block_on(Database::open_replica(&path_buf, replica))
        })
        .map_err(|error| CliError::DatabaseInit(error.to_string()))?
        .join()
        .map_err(|_| CliError::DatabaseInit("replica initialization thread panicked".into()))??;

    Ok(db)
}
