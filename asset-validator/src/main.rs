//! Asset Validator CLI
//!
//! Entry point for the `asset-validator` binary. Provides:
//! - `validate [FILE]` - validate a descriptor file (or the
//!   `assets_index.json` manifest) against on-chain reality
//! - `request` - run one cycle of the Kafka request/response loop

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eth_node::HttpEthNode;
use serde::Deserialize;
use tracing::{error, info, warn};

use asset_validator::cmc::CmcClient;
use asset_validator::config::Settings;
use asset_validator::descriptor::AssetDescriptor;
use asset_validator::error::{AppError, InfraError};
use asset_validator::kafka::{KafkaLoop, RdKafkaTransport};
use asset_validator::scanner::ScanConstants;
use asset_validator::validators::{AssetValidator, ContractValidation};

/// Asset Validator: checks ERC-20 registry descriptors against on-chain reality.
#[derive(Parser, Debug)]
#[command(name = "asset-validator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a descriptor file (or `assets_index.json`) against a node.
    Validate {
        /// Path to a JSON array of descriptors. Falls back to
        /// `assets_index.json` in the working directory when omitted.
        file: Option<PathBuf>,

        /// Ethereum JSON-RPC node URL. Required when `FILE` is given
        /// explicitly; taken per-network from the manifest otherwise.
        #[arg(long)]
        node: Option<String>,

        /// Comma-separated ignore globs, appended to the configured list.
        #[arg(long)]
        ignore: Option<String>,

        /// Skip non-`decimals` method-invocation probes.
        #[arg(long)]
        fast: bool,

        /// Emit block-scan progress events.
        #[arg(long)]
        progress: bool,

        /// Override the configured log level.
        #[arg(long)]
        loglevel: Option<String>,

        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<String>,
    },

    /// Run one Kafka request/response cycle, then exit.
    Request {
        /// Optional TOML configuration file.
        #[arg(long)]
        config: Option<String>,

        /// Override the configured log level.
        #[arg(long)]
        loglevel: Option<String>,
    },
}

/// One entry of `assets_index.json`: a descriptor file paired with the
/// node to validate it against.
#[derive(Debug, Clone, Deserialize)]
struct AssetsIndexEntry {
    assets: PathBuf,
    node: String,
}

fn init_logging(settings: &Settings, loglevel_override: Option<&str>) {
    let level = loglevel_override.unwrap_or(settings.logging.level.as_str());
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn load_descriptors(path: &Path) -> Result<Vec<AssetDescriptor>, AppError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| InfraError::DescriptorFile(format!("{}: {e}", path.display())))?;
    let descriptors = serde_json::from_str(&contents).map_err(InfraError::Serialization)?;
    Ok(descriptors)
}

fn load_assets_index(path: &Path) -> Result<Vec<AssetsIndexEntry>, AppError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| InfraError::DescriptorFile(format!("{}: {e}", path.display())))?;
    let map: HashMap<String, AssetsIndexEntry> =
        serde_json::from_str(&contents).map_err(InfraError::Serialization)?;
    Ok(map.into_values().collect())
}

fn parse_ignore_globs(settings: &Settings, cli_ignore: Option<&str>) -> Vec<String> {
    let mut globs = settings.ignore.globs.clone();
    if let Some(csv) = cli_ignore {
        globs.extend(csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
    }
    globs
}

/// Validate every descriptor in `file` against `node_url`, printing one
/// `[E] <name> (<symbol>): <field>: <message>` line per fatal issue.
///
/// Returns the total number of fatal issues found across all descriptors.
async fn validate_file(
    file: &Path,
    node_url: &str,
    settings: &Settings,
    fast: bool,
    progress: bool,
    ignore_globs: Vec<String>,
) -> Result<usize, AppError> {
    let descriptors = load_descriptors(file)?;
    let node = Arc::new(
        HttpEthNode::with_timeout(node_url, settings.node.request_timeout())
            .await
            .map_err(InfraError::Node)?,
    );

    let asset_map = match CmcClient::new(&settings.cmc).fetch_asset_map().await {
        Ok(map) => map,
        Err(err) => {
            warn!(error = %err, "external asset registry unavailable, cross-checks will all be reported");
            HashMap::new()
        }
    };

    let validator = AssetValidator::from_node(
        node,
        asset_map,
        ScanConstants::from(&settings.scan),
        settings.receipts.concurrency,
        settings.digest.hard_fork_block,
        settings.digest.delta,
        fast,
        progress,
        ignore_globs,
    );

    let mut total_issues = 0usize;
    for descriptor in &descriptors {
        let issues = validator.validate(descriptor).await?;
        for issue in &issues {
            println!("[E] {} ({}): {}: {}", descriptor.name, descriptor.symbol, issue.field, issue.message);
        }
        total_issues += issues.len();
    }

    Ok(total_issues)
}

async fn run_validate(
    file: Option<PathBuf>,
    node: Option<String>,
    ignore: Option<String>,
    fast: bool,
    progress: bool,
    settings: &Settings,
) -> Result<usize, AppError> {
    let ignore_globs = parse_ignore_globs(settings, ignore.as_deref());

    if let Some(file) = file {
        let Some(node_url) = node else {
            return Err(AppError::Config("--node is required when FILE is given explicitly".into()));
        };
        return validate_file(&file, &node_url, settings, fast, progress, ignore_globs).await;
    }

    let index_path = PathBuf::from("assets_index.json");
    if !index_path.exists() {
        return Err(AppError::Config(
            "no FILE given and assets_index.json not found in the working directory".into(),
        ));
    }

    let mut total = 0usize;
    for entry in load_assets_index(&index_path)? {
        total += validate_file(&entry.assets, &entry.node, settings, fast, progress, ignore_globs.clone()).await?;
    }
    Ok(total)
}

async fn run_request(settings: &Settings) -> Result<(), AppError> {
    let transport = RdKafkaTransport::new(&settings.kafka)?;
    let kafka_loop = KafkaLoop::new(
        ScanConstants::from(&settings.scan),
        settings.receipts.concurrency,
        settings.digest.hard_fork_block,
        settings.digest.delta,
    );
    kafka_loop.run(&transport, settings.kafka.poll_timeout()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config_file, loglevel) = match &cli.command {
        Commands::Validate { config, loglevel, .. } => (config.clone(), loglevel.clone()),
        Commands::Request { config, loglevel } => (config.clone(), loglevel.clone()),
    };

    let settings = match Settings::load(config_file.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings, loglevel.as_deref());

    if let Err(errors) = settings.validate() {
        for message in &errors {
            error!(%message, "invalid configuration");
        }
        return ExitCode::FAILURE;
    }

    info!(version = asset_validator::VERSION, "starting asset-validator");

    let result = match cli.command {
        Commands::Validate { file, node, ignore, fast, progress, .. } => {
            run_validate(file, node, ignore, fast, progress, &settings).await.map(|issues| issues == 0)
        }
        Commands::Request { .. } => run_request(&settings).await.map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
