//! modelmap - Cross-platform model artifact resolution CLI
//!
//! ## Commands
//!
//! - `resolve`: resolve one artifact onto a target platform
//! - `provenance`: walk an artifact's ancestry toward its base artifact
//! - `run`: drive the full retrieve/filter/provenance/evaluate pipeline
//!   over a batch of inputs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use modelmap_core::{
    ArtifactId, PipelineCoordinator, Platform, ProvenanceResolver, ResolverConfig, TieredResolver,
};
use modelmap_fetch::{ChatInferenceClient, FsArtifactStore, PlatformGateway};

#[derive(Parser)]
#[command(name = "modelmap")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cross-platform model artifact resolution", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetPlatform {
    /// Model registry (huggingface.co)
    Huggingface,
    /// Code host (github.com)
    Github,
}

impl From<TargetPlatform> for Platform {
    fn from(target: TargetPlatform) -> Platform {
        match target {
            TargetPlatform::Huggingface => Platform::HuggingFace,
            TargetPlatform::Github => Platform::GitHub,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an artifact's identifier on a target platform
    Resolve {
        /// Artifact reference: 'org/name' or a platform URL
        input: String,

        /// Platform to resolve onto
        #[arg(short, long, value_enum)]
        target: TargetPlatform,
    },

    /// Walk an artifact's provenance chain toward its base artifact
    Provenance {
        /// Artifact reference: 'org/name' or a platform URL
        input: String,

        /// Maximum number of ancestors to collect
        #[arg(long, default_value_t = 5)]
        max_depth: usize,
    },

    /// Run the full pipeline over one or more artifact inputs
    Run {
        /// Artifact references
        inputs: Vec<String>,

        /// File with one artifact reference per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Directory for fetched documents and reports
        #[arg(short, long, default_value = "modelmap-out")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    modelmap_core::init_tracing(cli.json, level);

    let gateway = Arc::new(PlatformGateway::from_env());
    let inference = Arc::new(ChatInferenceClient::from_env());
    let config = ResolverConfig::default();

    match cli.command {
        Commands::Resolve { input, target } => {
            cmd_resolve(gateway, inference, config, &input, target.into()).await
        }
        Commands::Provenance { input, max_depth } => {
            cmd_provenance(
                gateway,
                inference,
                config.with_max_provenance_depth(max_depth),
                &input,
            )
            .await
        }
        Commands::Run {
            inputs,
            file,
            out_dir,
        } => cmd_run(gateway, inference, config, inputs, file.as_deref(), &out_dir).await,
    }
}

/// Pick the source platform for a bare input: the opposite direction of
/// the requested target.
fn source_platform(parsed: &ArtifactId, target: Platform) -> Platform {
    match parsed.platform {
        Platform::Unknown => match target {
            Platform::GitHub => Platform::HuggingFace,
            _ => Platform::GitHub,
        },
        platform => platform,
    }
}

async fn cmd_resolve(
    gateway: Arc<PlatformGateway>,
    inference: Arc<ChatInferenceClient>,
    config: ResolverConfig,
    input: &str,
    target: Platform,
) -> Result<()> {
    let parsed = ArtifactId::parse(input)?;
    let source = parsed.clone().with_platform(source_platform(&parsed, target));

    let resolver = TieredResolver::new(gateway.clone(), gateway, inference, config);
    let result = resolver.resolve(&source, target).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_provenance(
    gateway: Arc<PlatformGateway>,
    inference: Arc<ChatInferenceClient>,
    config: ResolverConfig,
    input: &str,
) -> Result<()> {
    let parsed = ArtifactId::parse(input)?;
    // Ancestry is walked on the registry side.
    let start = match parsed.platform {
        Platform::Unknown => parsed.with_platform(Platform::HuggingFace),
        _ => parsed,
    };

    let walker = ProvenanceResolver::new(gateway.clone(), gateway, inference, config);
    let chain = walker.resolve_provenance(&start).await;
    println!("{}", serde_json::to_string_pretty(&chain)?);
    Ok(())
}

async fn cmd_run(
    gateway: Arc<PlatformGateway>,
    inference: Arc<ChatInferenceClient>,
    config: ResolverConfig,
    mut inputs: Vec<String>,
    file: Option<&Path>,
    out_dir: &Path,
) -> Result<()> {
    if let Some(path) = file {
        let listed = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?;
        inputs.extend(
            listed
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    if inputs.is_empty() {
        bail!("no artifact inputs given (pass references or --file)");
    }

    let store = Arc::new(FsArtifactStore::new(out_dir));
    let coordinator =
        PipelineCoordinator::new(gateway.clone(), gateway, inference, store, config);
    let batch = coordinator.process_batch(&inputs).await;

    println!("{}", serde_json::to_string_pretty(&batch)?);
    if batch.failure_count() > 0 {
        tracing::warn!(
            failed = batch.failure_count(),
            processed = batch.processed_count(),
            "some inputs could not be processed"
        );
    }
    Ok(())
}
