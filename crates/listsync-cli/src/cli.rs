use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use listsync_core::ListTarget;

#[derive(Parser)]
#[command(name = "listsync")]
#[command(about = "Reconcile reference lists with the portal backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Storage backend the lists are synced into
    /// (default: rest when LISTSYNC_BACKEND_URL and LISTSYNC_BACKEND_KEY are set, else libsql)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create and update lists so the backend matches the definitions
    Sync {
        /// Which list family to sync
        #[arg(short, long, value_enum, default_value_t = TargetSelection::All)]
        target: TargetSelection,
        /// Read definitions from a JSON file instead of the built-in catalog
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Wait for the session startup delay before syncing
        #[arg(long)]
        startup: bool,
        /// Output reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what a sync would change without writing
    Check {
        /// Which list family to check
        #[arg(short, long, value_enum, default_value_t = TargetSelection::All)]
        target: TargetSelection,
        /// Read definitions from a JSON file instead of the built-in catalog
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Output plans as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored lists with their value counts
    Lists {
        /// Which list family to show
        #[arg(short, long, value_enum, default_value_t = TargetSelection::All)]
        target: TargetSelection,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in definitions as JSON
    Definitions {
        /// Which list family to print
        #[arg(short, long, value_enum, default_value_t = TargetSelection::System)]
        target: TargetSelection,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backend {
    /// Local libSQL file, optionally a Turso embedded replica
    Libsql,
    /// Managed backend REST API
    Rest,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum TargetSelection {
    System,
    Autocomplete,
    All,
}

impl TargetSelection {
    pub fn targets(self) -> Vec<ListTarget> {
        match self {
            Self::System => vec![ListTarget::System],
            Self::Autocomplete => vec![ListTarget::Autocomplete],
            Self::All => ListTarget::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
