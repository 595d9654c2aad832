//! Store creation and the per-command transaction wrapper.

use std::path::Path;

use seqtree::{
    Sequencer, SequencerConfig,
    store::{InMemory, RecordStore, SqlStore},
};

use crate::cli::{Backend, Cli, Commands};
use crate::commands;
use crate::output::{OutputFormat, Report, print_report};

/// Load the configuration file, or the defaults when none is given.
pub async fn load_config(path: Option<&Path>) -> seqtree::Result<SequencerConfig> {
    match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            SequencerConfig::load_from_file(path).await
        }
        None => Ok(SequencerConfig::default()),
    }
}

/// Open the selected store, run the command in one transaction and print the
/// result.
pub async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref()).await?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let path = cli.database_path();

    let report = match cli.backend {
        Backend::Sqlite => {
            tracing::info!("Using SQLite store at {}", path.display());
            let store = SqlStore::open_sqlite(&path, config.clone()).await?;
            let sequencer = Sequencer::with_config(store, config);
            let report = execute(&sequencer, &cli.command).await;
            sequencer.store().pool().close().await;
            report?
        }
        Backend::Inmemory => {
            tracing::info!("Using in-memory store with persistence at {}", path.display());
            let store = InMemory::load_from_file(&path, config.clone()).await?;
            let sequencer = Sequencer::with_config(store, config);
            let report = execute(&sequencer, &cli.command).await?;
            if cli.command.is_mutation() {
                sequencer.store().save_to_file(&path).await?;
                tracing::debug!("Saved {}", path.display());
            }
            report
        }
    };

    print_report(&report, format)?;
    Ok(())
}

/// Run a command inside one transaction, committing on success and rolling
/// back on any failure.
pub async fn execute<S: RecordStore>(
    sequencer: &Sequencer<S>,
    command: &Commands,
) -> seqtree::Result<Report> {
    let mut tx = sequencer.store().begin().await?;
    let result = match command {
        Commands::Add(args) => commands::records::add(sequencer, &mut tx, args).await,
        Commands::Prepend(args) => commands::records::prepend(sequencer, &mut tx, args).await,
        Commands::Append(args) => commands::records::append(sequencer, &mut tx, args).await,
        Commands::Before(args) => commands::records::before(sequencer, &mut tx, args).await,
        Commands::After(args) => commands::records::after(sequencer, &mut tx, args).await,
        Commands::Delete(args) => commands::records::delete(sequencer, &mut tx, args).await,
        Commands::List(args) => commands::list::run(sequencer, &mut tx, args).await,
        Commands::Check => commands::check::run(sequencer, &mut tx).await,
    };

    match result {
        Ok(report) => {
            sequencer.store().commit(tx).await?;
            Ok(report)
        }
        Err(e) => {
            tracing::debug!("Rolling back: {e}");
            sequencer.store().rollback(tx).await?;
            Err(e)
        }
    }
}

impl Commands {
    /// Whether the command changes any record.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Commands::List(_) | Commands::Check)
    }
}
