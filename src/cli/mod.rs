//! CLI module for the wine catalogue
//!
//! Every subcommand maps onto one wine service operation.

pub mod wine;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use crate::config::AppConfig;
use crate::domain::SortField;
use crate::infrastructure::logging;
use crate::infrastructure::storage::StorageType;

/// Wine catalogue - manage wines by ID and appellation
#[derive(Parser)]
#[command(name = "wine-catalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Storage backend, overrides the configured one (memory, postgres).
    /// The memory backend lives only as long as one command, so changes made
    /// by add, update and delete are not kept
    #[arg(long, global = true)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all wines
    List,

    /// Show one wine
    Get {
        id: i32,
    },

    /// List wines with an appellation
    Find {
        #[arg(long)]
        appellation: String,
    },

    /// Show one page of wines
    Page {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = crate::domain::pagination::DEFAULT_PAGE_SIZE)]
        size: u32,

        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Add a wine
    Add {
        #[command(flatten)]
        wine: WineArgs,

        /// Explicit ID, left to the storage backend to honour
        #[arg(long)]
        id: Option<i32>,
    },

    /// Replace an existing wine
    Update {
        id: i32,

        #[command(flatten)]
        wine: WineArgs,
    },

    /// Delete a wine
    Delete {
        id: i32,
    },
}

impl Command {
    /// Returns true for subcommands that change stored wines
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Add { .. } | Command::Update { .. } | Command::Delete { .. }
        )
    }
}

/// Wine attributes given on the command line
#[derive(Debug, Clone, clap::Args)]
pub struct WineArgs {
    #[arg(long)]
    pub chateau: String,

    #[arg(long)]
    pub appellation: String,

    #[arg(long)]
    pub price: f64,
}

/// Sortable wine attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Id,
    Chateau,
    Appellation,
    Price,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Id => SortField::Id,
            SortArg::Chateau => SortField::Chateau,
            SortArg::Appellation => SortField::Appellation,
            SortArg::Price => SortField::Price,
        }
    }
}

/// Load configuration, set up logging and run the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (mut config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(&config);

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }

    if cli.command.is_mutating() && is_in_memory(&config) {
        warn!(
            backend = %config.storage.backend,
            "In-memory storage is discarded when the command exits, changes will not persist"
        );
    }

    let service = crate::create_wine_service(&config).await?;
    let mut stdout = std::io::stdout();

    wine::execute(&service, cli.command, &mut stdout).await
}

fn is_in_memory(config: &AppConfig) -> bool {
    StorageType::from_str(&config.storage.backend) == Some(StorageType::InMemory)
}

fn init_logging(config: &AppConfig) {
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });
}
