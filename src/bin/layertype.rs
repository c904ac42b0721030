use std::path::PathBuf;

use clap::{Parser, Subcommand};
use layertype::{commands, Config};

/// Detect, convert and reconcile container image layer media types.
#[derive(Debug, Parser)]
#[command(name = "layertype", version)]
struct Cli {
    /// YAML or JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Blob cache directory (overrides config and LAYERTYPE_CACHE_DIR).
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Use Docker schema 2 layer media types.
    #[arg(long, global = true, conflicts_with = "oci")]
    docker: bool,

    /// Use OCI layer media types.
    #[arg(long, global = true)]
    oci: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the media type of a cached blob.
    Detect { digest: String },
    /// Add a file to the blob cache and describe it as JSON.
    Ingest { file: PathBuf },
    /// Convert a layer media type to the selected convention.
    Convert { media_type: String },
    /// Reconcile a stack file and print the trusted media types as JSON.
    Reconcile { stack: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    if cli.docker {
        config.schema = layertype::oci::LayerSchema::Docker;
    } else if cli.oci {
        config.schema = layertype::oci::LayerSchema::Oci;
    }

    match cli.command {
        Command::Detect { digest } => {
            println!("{}", commands::detect(&config, &digest)?);
        }
        Command::Ingest { file } => {
            let report = commands::ingest(&config, &file).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Convert { media_type } => {
            println!("{}", commands::convert(&media_type, config.schema));
        }
        Command::Reconcile { stack } => {
            let media_types = commands::reconcile(&stack)?;
            println!("{}", serde_json::to_string_pretty(&media_types)?);
        }
    }

    Ok(())
}
