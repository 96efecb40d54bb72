//! catalog-import - batch import and admin commands for the book catalog
//!
//! Subcommands:
//! - `import`: replace the catalog from a delimited source file
//! - `create-text-index`: create the full-text index used by search
//! - `inspect`: print the first stored document

use anyhow::{Context, Result};
use catalog_common::config::{resolve_database_path, CatalogConfig, SourceEncoding, TomlConfig};
use catalog_common::CatalogStore;
use catalog_import::{prepare, run_import, ImportOptions, ImportReport};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Command-line arguments for catalog-import
#[derive(Parser, Debug)]
#[command(name = "catalog-import")]
#[command(about = "Import and administer the book catalog")]
#[command(version)]
struct Args {
    /// Config file (defaults to $CATALOG_CONFIG or <config dir>/catalog/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the catalog with the works found in a source file
    Import {
        /// Primary source file
        #[arg(long)]
        source: Option<PathBuf>,

        /// Secondary ratings file
        #[arg(long, conflicts_with = "no_ratings")]
        ratings: Option<PathBuf>,

        /// Skip the ratings merge
        #[arg(long)]
        no_ratings: bool,

        /// Maximum number of works kept
        #[arg(long)]
        top_n: Option<usize>,

        /// Source file encoding
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,

        /// Prepare and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Create the full-text index over title, authors and publisher
    CreateTextIndex,

    /// Print the first stored document
    Inspect,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncodingArg {
    Latin1,
    Utf8,
}

impl From<EncodingArg> for SourceEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Latin1 => SourceEncoding::Latin1,
            EncodingArg::Utf8 => SourceEncoding::Utf8,
        }
    }
}

/// Well-known document fields printed by `inspect`
const INSPECT_FIELDS: &[&str] = &[
    "title",
    "authors",
    "isbn",
    "year",
    "publisher",
    "image_large",
    "image_medium",
    "image_small",
    "rating",
    "fame",
    "_rating_val",
    "rating_val",
];

/// Characters of the full document printed by `inspect`
const INSPECT_TRUNCATE: usize = 2000;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = match &args.config {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => TomlConfig::load_or_default(),
    };
    let mut config = CatalogConfig::resolve(&toml);
    config.database_path = resolve_database_path(args.database.as_deref(), &toml);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .init();

    info!(
        "Starting catalog-import v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::Import {
            source,
            ratings,
            no_ratings,
            top_n,
            encoding,
            dry_run,
        } => {
            let mut options = ImportOptions::from_config(&config);
            if let Some(source) = source {
                options.source_path = source;
            }
            if let Some(ratings) = ratings {
                options.ratings_path = Some(ratings);
            }
            if no_ratings {
                options.ratings_path = None;
            }
            if let Some(n) = top_n {
                options.top_n = n;
            }
            if let Some(encoding) = encoding {
                options.encoding = encoding.into();
            }

            if dry_run {
                let prepared = prepare(&options).context("Import failed")?;
                log_report(&prepared.report);
                info!("Dry run: catalog left unchanged");
                return Ok(());
            }

            let store = open_store(&config).await?;
            let result = run_import(&store, &options).await;
            store.close().await;

            let report = result.context("Import failed")?;
            log_report(&report);
        }

        Command::CreateTextIndex => {
            let store = open_store(&config).await?;
            let name = store
                .create_text_index()
                .await
                .context("Failed to create text index")?;
            store.close().await;
            println!("Created/ensured text index: {name}");
        }

        Command::Inspect => {
            let store = open_store(&config).await?;
            let doc = store.first_document().await;
            store.close().await;

            match doc.context("Failed to read catalog")? {
                None => println!("NO_DOCS"),
                Some(doc) => {
                    let keys: Vec<&String> = doc
                        .as_object()
                        .map(|m| m.keys().collect())
                        .unwrap_or_default();
                    println!("KEYS: {keys:?}");
                    for field in INSPECT_FIELDS {
                        println!("{field}: {}", doc.get(*field).unwrap_or(&serde_json::Value::Null));
                    }
                    let full = doc.to_string();
                    println!("\nFULL_DOC (truncated):");
                    println!("{}", full.chars().take(INSPECT_TRUNCATE).collect::<String>());
                }
            }
        }
    }

    Ok(())
}

async fn open_store(config: &CatalogConfig) -> Result<CatalogStore> {
    info!("Database: {}", config.database_path.display());
    CatalogStore::open(
        &config.database_path,
        Duration::from_millis(config.connect_timeout_ms),
    )
    .await
    .context("Failed to open catalog store")
}

fn log_report(report: &ImportReport) {
    info!(
        "Rows read: {} (skipped {}, without title {})",
        report.rows_read, report.rows_skipped, report.rows_without_title
    );
    info!(
        "Unique works: {}, kept: {}, rated: {}",
        report.unique_works, report.works_kept, report.rated_works
    );
    info!(
        "Ratings file: {:?} ({} matches)",
        report.ratings_file, report.merged_matches
    );
    if report.inserted > 0 || report.deleted > 0 {
        info!(
            "Cleared {} old documents, inserted {}",
            report.deleted, report.inserted
        );
    }
    if let Ok(json) = serde_json::to_string(report) {
        info!("Import report: {}", json);
    }
}
