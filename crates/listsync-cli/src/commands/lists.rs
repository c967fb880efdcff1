use std::path::Path;

use listsync_core::config::BackendConfig;
use listsync_core::db::LibSqlListRepository;
use listsync_core::repository::RestListRepository;
use listsync_core::ListRepository;

use crate::cli::{Backend, TargetSelection};
use crate::commands::common::{format_list_lines, list_item, Store};
use crate::error::CliError;

pub async fn run_lists(
    target: TargetSelection,
    as_json: bool,
    backend: Backend,
    db_path: &Path,
    config: &BackendConfig,
) -> Result<(), CliError> {
    let store = Store::open(backend, db_path, config).await?;

    let mut items = Vec::new();
    for target in target.targets() {
        let summaries = match &store {
            Store::Local(db) => {
                LibSqlListRepository::new(db.connection(), target)
                    .list_all()
                    .await?
            }
            Store::Rest(client) => {
                RestListRepository::new(client.clone(), target)
                    .list_all()
                    .await?
            }
        };
        items.extend(summaries.iter().map(|summary| list_item(target, summary)));
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No lists stored yet. Run `listsync sync` first.");
    } else {
        for line in format_list_lines(&items) {
            println!("{line}");
        }
    }

    Ok(())
}

