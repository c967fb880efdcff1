use std::collections::BTreeMap;

use listsync_core::{catalog, ListDefinition};

use crate::cli::TargetSelection;
use crate::error::CliError;

/// Print built-in definitions.
///
/// A single family prints as a plain array so the output can be edited and
/// fed back through `sync --file`.
pub fn run_definitions(target: TargetSelection) -> Result<(), CliError> {
    println!("{}", render_definitions(target)?);
    Ok(())
}

pub fn render_definitions(target: TargetSelection) -> Result<String, CliError> {
    let mut by_target = target
        .targets()
        .into_iter()
        .map(|target| (target.as_str(), catalog::definitions_for(target)))
        .collect::<BTreeMap<&str, Vec<ListDefinition>>>();

    let rendered = if by_target.len() == 1 {
        let definitions = by_target.pop_first().map(|(_, definitions)| definitions);
        serde_json::to_string_pretty(&definitions.unwrap_or_default())?
    } else {
        serde_json::to_string_pretty(&by_target)?
    };
    Ok(rendered)
}
