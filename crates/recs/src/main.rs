//! Offline training entry point for the Bookshelf recommendation engine.
//!
//! Reads the bulk rating dataset and the app's library-records export,
//! rebuilds the model, and atomically replaces the artifact bundle the
//! query path serves from.

use anyhow::{Context, Result};
use bookshelf_core::config::{load_dotenv, ArtifactConfig, ConfigLoader, TrainingConfig};
use bookshelf_core::observability::init_logging;
use bookshelf_recs::trainer::{self, TrainingRun};
use bookshelf_recs::ArtifactStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recs-trainer")]
#[command(about = "Offline trainer for the Bookshelf recommendation engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        global = true,
        env = "BOOKSHELF_ARTIFACT_DIR",
        help = "Artifact bundle directory"
    )]
    artifacts: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run a training batch and replace the artifact bundle")]
    Train {
        #[arg(
            long = "books",
            required = true,
            help = "Catalog CSV; repeat for supplemental catalogs (first file wins on duplicate ISBNs)"
        )]
        books: Vec<PathBuf>,

        #[arg(long, help = "Bulk external ratings CSV")]
        ratings: PathBuf,

        #[arg(long, help = "Library-records JSON export from the app")]
        library: Option<PathBuf>,

        #[arg(long, help = "Minimum interactions per user (overrides env)")]
        min_user_ratings: Option<usize>,

        #[arg(long, help = "Minimum interactions per item (overrides env)")]
        min_item_ratings: Option<usize>,
    },

    #[command(about = "Show the manifest of the current artifact bundle")]
    Status,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    load_dotenv();
    init_logging();

    let cli = Cli::parse();

    let artifacts = match cli.artifacts {
        Some(dir) => ArtifactConfig { dir },
        None => ArtifactConfig::from_env()?,
    };
    artifacts.validate()?;

    match cli.command {
        Commands::Train {
            books,
            ratings,
            library,
            min_user_ratings,
            min_item_ratings,
        } => {
            let mut training = TrainingConfig::from_env()?;
            if let Some(value) = min_user_ratings {
                training.min_user_ratings = value;
            }
            if let Some(value) = min_item_ratings {
                training.min_item_ratings = value;
            }
            training.validate()?;

            let artifact_dir = artifacts.dir.clone();
            let manifest = trainer::run(&TrainingRun {
                catalogs: books,
                ratings,
                library,
                training,
                artifacts,
            })
            .context("training run failed")?;

            println!(
                "trained model {} ({} items, {} users) -> {}",
                manifest.model_version,
                manifest.n_items,
                manifest.n_users,
                artifact_dir.display()
            );
        }
        Commands::Status => {
            let store = ArtifactStore::new(&artifacts.dir);
            let manifest = store
                .manifest()
                .context("no usable artifact bundle; run `recs-trainer train` first")?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
    }

    Ok(())
}
