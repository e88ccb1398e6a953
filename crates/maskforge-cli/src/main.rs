//! Maskforge CLI - metadata, builds and releases for mask assets

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{addition, build, check, combo, meta, release, status, Workspace};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "maskforge")]
#[command(about = "Validate, build and release mask assets", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root containing masks and combos
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Release state, kind and staleness of every asset
    Status {
        /// Only assets whose path contains this text
        filter: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Metadata operations
    #[command(subcommand)]
    Meta(meta::MetaCommands),

    /// Edit a mask's additions
    #[command(subcommand)]
    Addition(addition::AdditionCommands),

    /// Edit the masks a combo references
    #[command(subcommand)]
    Combo(combo::ComboCommands),

    /// Show the files an asset depends on and which are missing
    Deps {
        /// Mask (.fbx) or combo (.json), relative to the root
        asset: String,
    },

    /// Build a single asset
    Build {
        /// Mask (.fbx) or combo (.json), relative to the root
        asset: String,
    },

    /// Build every stale asset
    Autobuild {
        /// Concurrent builds (defaults to the configured worker count)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Build every asset, stale or not
    RebuildAll {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,

        /// Concurrent builds (defaults to the configured worker count)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Write the release manifest for every GOOD asset
    Release {
        /// Manifest path (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also publish artifacts and previews under their uuids
        #[arg(long)]
        upload: bool,

        /// Upload destination (defaults to the configured stage directory)
        #[arg(long)]
        stage_dir: Option<PathBuf>,
    },

    /// Check that the build tool and version control client are available
    Check,

    /// Check whether the working copy has incoming changes
    SyncCheck,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ws = Workspace::open(&cli.root)?;

    match cli.command {
        Commands::Status { filter, format } => status::run(&ws, filter.as_deref(), &format),
        Commands::Meta(cmd) => meta::run(&ws, cmd),
        Commands::Addition(cmd) => addition::run(&ws, cmd),
        Commands::Combo(cmd) => combo::run(&ws, cmd),
        Commands::Deps { asset } => build::run_deps(&ws, &asset),
        Commands::Build { asset } => build::run_build(&ws, &asset).await,
        Commands::Autobuild { workers } => build::run_autobuild(&ws, workers).await,
        Commands::RebuildAll { yes, workers } => build::run_rebuild_all(&ws, yes, workers).await,
        Commands::Release {
            output,
            upload,
            stage_dir,
        } => {
            let args = release::ReleaseArgs {
                output,
                upload,
                stage_dir,
            };
            release::run(args, &ws)
        }
        Commands::Check => check::run(&ws),
        Commands::SyncCheck => check::run_sync(&ws),
    }
}
