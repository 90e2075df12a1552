//! Colprof CLI - Command-line driver for the column profile store

use clap::{Args, Parser, Subcommand};
use colprof::config::{self, ColprofConfig};
use colprof::store::{self, ProfileStore, StoreKind, TripleStore};
use colprof::{ColumnId, ColumnProfile};
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "colprof")]
#[command(version = "0.1.0")]
#[command(about = "Column profile store - persist raw samples and statistical profiles")]
#[command(long_about = r#"
Colprof persists the output of a column-profiling pipeline into a
transactional backend, keeping raw samples and computed statistics in
separate logical graphs.

Example usage:
  colprof init
  colprof index --id 7 --db-name sales_db --path /data/q1.csv \
      --source-name csv_source --column-name region --values-file region.txt
  colprof store-profile --file profiles.json
  colprof stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to colprof.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Backend kind, by name or code (overrides config)
    #[arg(short, long)]
    backend: Option<String>,

    /// Path to the database file (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store, clearing both logical graphs, and record the
    /// backend selection in the config file
    Init {
        #[command(flatten)]
        store: StoreArgs,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Index raw sample values for one column
    Index {
        #[command(flatten)]
        store: StoreArgs,

        /// Numeric column identifier
        #[arg(long)]
        id: i64,

        /// Database the column belongs to
        #[arg(long)]
        db_name: String,

        /// Path of the backing file or table
        #[arg(long)]
        path: String,

        /// Name of the source that produced the column
        #[arg(long)]
        source_name: String,

        /// Column name within the source
        #[arg(long)]
        column_name: String,

        /// File with one value per line (stdin when omitted)
        #[arg(long)]
        values_file: Option<PathBuf>,
    },

    /// Store one or more profile documents from a JSON file
    StoreProfile {
        #[command(flatten)]
        store: StoreArgs,

        /// JSON file holding a profile object or an array of them
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print statement counts per logical graph
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// List the registered backend kinds and their codes
    Backends,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Init { store: opts, force } => {
            let (kind, db_path) = resolve(&opts, &config)?;
            let mut store = store::open(kind, Some(&db_path))?;
            store.init()?;
            store.tear_down()?;

            let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
            if force || !config_path.exists() {
                let config = ColprofConfig {
                    backend: Some(kind.as_str().to_string()),
                    database: Some(db_path.display().to_string()),
                };
                config::write_config(&config_path, &config, force)?;
            }
            println!("Initialized {} store at {}", kind, db_path.display());
        }

        Commands::Index {
            store: opts,
            id,
            db_name,
            path,
            source_name,
            column_name,
            values_file,
        } => {
            let column = ColumnId::new(id, db_name, path, source_name, column_name);
            let values = read_values(values_file.as_deref())?;

            let mut store = open_connected(&opts, &config)?;
            store.index_values(&column, &values)?;
            store.tear_down()?;
            println!("Indexed {} values for {}", values.len(), column.iri());
        }

        Commands::StoreProfile { store: opts, file } => {
            let profiles = read_profiles(&file)?;

            let mut store = open_connected(&opts, &config)?;
            let mut stored = 0usize;
            for profile in &profiles {
                store.store_profile(profile)?;
                stored += 1;
            }
            store.tear_down()?;
            println!("Stored {stored} profile(s)");
        }

        Commands::Stats { store: opts } => {
            let (kind, db_path) = resolve(&opts, &config)?;
            anyhow::ensure!(
                kind == StoreKind::Triple,
                "stats is only available for the triple backend"
            );
            let mut store = TripleStore::at(&db_path);
            store.connect()?;
            print!("{}", store.stats()?);
        }

        Commands::Backends => {
            println!("Registered backends: {}", StoreKind::listing());
        }
    }

    Ok(())
}

/// Resolve backend kind and database path from flags, config, defaults.
fn resolve(args: &StoreArgs, config: &ColprofConfig) -> anyhow::Result<(StoreKind, PathBuf)> {
    let kind: StoreKind = args
        .backend
        .as_deref()
        .or(config.backend.as_deref())
        .unwrap_or("triple")
        .parse()?;

    let db_path = args
        .database
        .clone()
        .or_else(|| config.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config::default_database_path_in(std::path::Path::new(".")));
    config::ensure_db_dir(&db_path)?;

    Ok((kind, db_path))
}

/// Open a store connected for writing, without clearing existing data.
fn open_connected(
    args: &StoreArgs,
    config: &ColprofConfig,
) -> anyhow::Result<Box<dyn ProfileStore>> {
    let (kind, db_path) = resolve(args, config)?;
    Ok(store::connect(kind, Some(&db_path))?)
}

fn read_values(path: Option<&std::path::Path>) -> anyhow::Result<Vec<String>> {
    let lines: Vec<String> = match path {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect(),
        None => std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<_>>()?,
    };
    Ok(lines)
}

/// Read profile documents from a JSON file (one object or an array).
///
/// A document with an unrecognized shape (e.g. an unknown `dataType` tag)
/// is reported and skipped; the rest of the batch still goes through.
fn read_profiles(path: &std::path::Path) -> anyhow::Result<Vec<ColumnProfile>> {
    let contents = std::fs::read_to_string(path)?;
    let documents = match serde_json::from_str::<serde_json::Value>(&contents)? {
        serde_json::Value::Array(documents) => documents,
        single => vec![single],
    };

    let mut profiles = Vec::with_capacity(documents.len());
    for (i, document) in documents.into_iter().enumerate() {
        match serde_json::from_value::<ColumnProfile>(document) {
            Ok(profile) => profiles.push(profile),
            Err(err) => tracing::warn!("skipping profile document {i}: {err}"),
        }
    }
    anyhow::ensure!(!profiles.is_empty(), "no usable profile documents in {}", path.display());
    Ok(profiles)
}
