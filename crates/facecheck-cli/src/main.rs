use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facecheck_core::{Collection, Comparator, OnnxFaceEncoder, StorageLayout};
use facecheck_ingest::ImageStore;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "facecheck", about = "facecheck image ingestion and face comparison CLI")]
struct Cli {
    /// Profile-picture collection directory
    #[arg(long, global = true, env = "FACECHECK_PROFILE_DIR", default_value = "profilePicture")]
    profile_dir: PathBuf,

    /// Live-capture collection directory
    #[arg(long, global = true, env = "FACECHECK_LIVE_CAPTURE_DIR", default_value = "liveCamphotos")]
    live_capture_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a profile image against a live-capture image
    Compare {
        profile: PathBuf,
        live: PathBuf,
        /// Directory containing det_10g.onnx and w600k_r50.onnx
        #[arg(long, env = "FACECHECK_MODEL_DIR")]
        model_dir: Option<PathBuf>,
        /// ONNX Runtime intra-op threads
        #[arg(long, env = "FACECHECK_INTRA_THREADS", default_value_t = 2)]
        threads: usize,
    },
    /// Validate an image without storing it
    Inspect { file: PathBuf },
    /// Validate and store an image into a collection
    Store {
        file: PathBuf,
        /// Store into the live-capture collection instead of profiles
        #[arg(long)]
        live: bool,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = StorageLayout::new(&cli.profile_dir, &cli.live_capture_dir);

    match cli.command {
        Commands::Compare {
            profile,
            live,
            model_dir,
            threads,
        } => {
            let model_dir = model_dir.unwrap_or_else(facecheck_core::default_model_dir);
            tracing::debug!(model_dir = %model_dir.display(), threads, "loading face models");
            let encoder = OnnxFaceEncoder::load(&model_dir, threads.max(1))
                .with_context(|| format!("failed to load models from {}", model_dir.display()))?;
            let comparator = Comparator::new(layout, Arc::new(encoder));
            let comparison = comparator.compare_files(&profile, &live)?;
            tracing::info!(
                same_person = comparison.same_person,
                distance = comparison.distance,
                "compared {} with {}",
                profile.display(),
                live.display()
            );
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        Commands::Inspect { file } => {
            let store = ImageStore::new(layout);
            let bytes = read(&file)?;
            match store.describe(file_name(&file), &bytes) {
                Ok(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                Err(e) => {
                    let rejection = serde_json::json!({ "valid": false, "detail": e.to_string() });
                    println!("{}", serde_json::to_string_pretty(&rejection)?);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Store { file, live } => {
            let collection = if live {
                Collection::LiveCapture
            } else {
                Collection::Profile
            };
            layout
                .ensure_dirs()
                .context("failed to create storage directories")?;
            let store = ImageStore::new(layout);
            let bytes = read(&file)?;
            tracing::debug!(%collection, file = %file.display(), size = bytes.len(), "storing image");
            let stored = store.store_file(collection, file_name(&file), &bytes)?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
