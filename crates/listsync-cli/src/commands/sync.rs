use std::path::Path;

use listsync_core::config::BackendConfig;
use listsync_core::db::LibSqlListRepository;
use listsync_core::repository::RestListRepository;
use listsync_core::{ListDefinition, ListRepository, ListSyncEngine, SessionSync, SyncReport};

use crate::cli::{Backend, TargetSelection};
use crate::commands::common::{
    ensure_single_target, format_report_lines, resolve_definitions, Store,
};
use crate::error::CliError;

pub struct SyncOptions<'a> {
    pub target: TargetSelection,
    pub file: Option<&'a Path>,
    pub startup: bool,
    pub as_json: bool,
}

pub async fn run_sync(
    options: &SyncOptions<'_>,
    backend: Backend,
    db_path: &Path,
    config: &BackendConfig,
) -> Result<(), CliError> {
    let targets = options.target.targets();
    ensure_single_target(&targets, options.file)?;

    let store = Store::open(backend, db_path, config).await?;
    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        let definitions = resolve_definitions(target, options.file)?;
        let session = options.startup.then(|| SessionSync::from_config(config));
        let report = match &store {
            Store::Local(db) => {
                let repository = LibSqlListRepository::new(db.connection(), target);
                sync_with(repository, &definitions, session.as_ref()).await
            }
            Store::Rest(client) => {
                let repository = RestListRepository::new(client.clone(), target);
                sync_with(repository, &definitions, session.as_ref()).await
            }
        };
        reports.extend(report);
    }
    store.finish().await?;

    if options.as_json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            for line in format_report_lines(report) {
                println!("{line}");
            }
        }
    }

    check_reports(&reports)
}

/// Run one engine over `definitions`, through the session trigger when given
pub async fn sync_with<R: ListRepository>(
    repository: R,
    definitions: &[ListDefinition],
    session: Option<&SessionSync>,
) -> Option<SyncReport> {
    let engine = ListSyncEngine::new(repository);
    match session {
        Some(session) => session.run_once(&engine, definitions).await,
        None => Some(engine.auto_sync(definitions).await),
    }
}

/// Fails when any definition in any report failed
pub fn check_reports(reports: &[SyncReport]) -> Result<(), CliError> {
    let failed = reports.iter().map(|report| report.failed).sum::<usize>();
    if failed > 0 {
        let total = reports.iter().map(SyncReport::total).sum();
        return Err(CliError::SyncFailed { failed, total });
    }
    Ok(())
}
