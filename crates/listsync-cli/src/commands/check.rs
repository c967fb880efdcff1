use std::path::Path;

use listsync_core::config::BackendConfig;
use listsync_core::db::LibSqlListRepository;
use listsync_core::repository::RestListRepository;
use listsync_core::sync::SyncPlan;
use listsync_core::{ListDefinition, ListRepository, ListSyncEngine};

use crate::cli::{Backend, TargetSelection};
use crate::commands::common::{ensure_single_target, format_plan_lines, resolve_definitions, Store};
use crate::error::CliError;

pub async fn run_check(
    target: TargetSelection,
    file: Option<&Path>,
    as_json: bool,
    backend: Backend,
    db_path: &Path,
    config: &BackendConfig,
) -> Result<(), CliError> {
    let targets = target.targets();
    ensure_single_target(&targets, file)?;

    let store = Store::open(backend, db_path, config).await?;
    let mut plans = Vec::with_capacity(targets.len());
    for target in targets {
        let definitions = resolve_definitions(target, file)?;
        let plan = match &store {
            Store::Local(db) => {
                plan_with(LibSqlListRepository::new(db.connection(), target), &definitions).await
            }
            Store::Rest(client) => {
                plan_with(RestListRepository::new(client.clone(), target), &definitions).await
            }
        };
        plans.push(plan);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        for plan in &plans {
            for line in format_plan_lines(plan) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub async fn plan_with<R: ListRepository>(repository: R, definitions: &[ListDefinition]) -> SyncPlan {
    ListSyncEngine::new(repository).check(definitions).await
}
