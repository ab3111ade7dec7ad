//! TRON transaction cloner.
//!
//! Reads contract-call transactions from a source network (Nile by default),
//! rebuilds each one for a target network (mainnet by default), signs it with
//! a separately supplied key and broadcasts it.
//!
//! # Architecture Overview
//!
//! ```text
//!   tx id(s)                                                     target node
//!      │                                                              ▲
//!      ▼                                                              │
//!  ┌────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌──────┐   ┌───────────┐
//!  │ fetch  │──▶│ extract │──▶│ rebuild │──▶│ persist │──▶│ sign │──▶│ broadcast │
//!  └────────┘   └────┬────┘   └─────────┘   └────┬────┘   └──────┘   └───────────┘
//!      ▲             │                           │ dry run stops here
//!  source node       ▼                           ▼
//!               ┌─────────┐              rebuilt_transaction_<tag>.json
//!               │ decoder │ (advisory)
//!               └─────────┘
//! ```
//!
//! Every stage failure is recorded for its item only; the run always
//! attempts every requested item. A bad key is the one fatal error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use tron_txn_clone::batch::{ArtifactWriter, BatchOrchestrator, ItemTag, RunOptions, WorkItem};
use tron_txn_clone::blockchain::wallet::provider_from_config;
use tron_txn_clone::blockchain::{Broadcaster, ChainClient, TransactionRebuilder, TronHttpClient};
use tron_txn_clone::config::{apply_overrides, load_config, CloneConfig, KeySource, Overrides};
use tron_txn_clone::observability::logging::init_tracing;
use tron_txn_clone::observability::{AuditSink, FileAuditLog, WebhookNotifier};

#[derive(Parser, Debug)]
#[command(name = "tron-txn-clone")]
#[command(about = "Clone and re-broadcast TRON transactions from Nile to Mainnet.", long_about = None)]
struct Cli {
    /// Batch mode from txid file
    #[arg(long)]
    batch: bool,

    /// File containing txIDs (one per line)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Single txID to process
    #[arg(long)]
    txid: Option<String>,

    /// Fee limit in SUN
    #[arg(long = "fee_limit")]
    fee_limit: Option<u64>,

    /// Call value in SUN
    #[arg(long = "call_value")]
    call_value: Option<u64>,

    /// Simulate only, do not broadcast
    #[arg(long = "dry_run")]
    dry_run: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Key source: env, prompt or file
    #[arg(long = "key_source")]
    key_source: Option<KeySource>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CloneConfig::default(),
    };
    let overrides = Overrides {
        fee_limit: cli.fee_limit,
        call_value: cli.call_value,
        key_source: cli.key_source,
    };
    let config = match apply_overrides(file_config, &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    init_tracing(&config.observability.log_level);
    tracing::info!(
        source = %config.source.name,
        target = %config.target.name,
        dry_run = cli.dry_run,
        "tron-txn-clone v0.1.0 starting"
    );

    let audit: Arc<dyn AuditSink> = Arc::new(FileAuditLog::new(&config.output.audit_log));

    // The only fatal path after argument parsing.
    let key = match provider_from_config(&config.key).and_then(|provider| provider.load()) {
        Ok(key) => key,
        Err(e) => {
            audit.record(&format!("Failed to load signing key: {}", e));
            eprintln!("Failed to load signing key: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let items = if cli.batch {
        let contents = match cli.file.as_deref().map(std::fs::read_to_string) {
            Some(Ok(contents)) => contents,
            _ => {
                eprintln!("Valid txID file required in batch mode.");
                return Ok(ExitCode::FAILURE);
            }
        };
        WorkItem::batch_from_lines(&contents)
    } else if let Some(txid) = &cli.txid {
        vec![WorkItem::single(txid.trim())]
    } else {
        eprintln!("Specify --txid for single mode or --batch with --file for batch mode.");
        return Ok(ExitCode::FAILURE);
    };

    let options = RunOptions {
        fee_limit: config.defaults.fee_limit,
        call_value: config.defaults.call_value,
        dry_run: cli.dry_run,
    };

    let source: Arc<dyn ChainClient> = Arc::new(TronHttpClient::new(config.source.clone())?);
    let target: Arc<dyn ChainClient> = Arc::new(TronHttpClient::new(config.target.clone())?);

    let artifacts = ArtifactWriter::new(&config.output.artifact_dir, &config.output.artifact_prefix);
    tracing::info!(
        items = items.len(),
        artifact_dir = %artifacts.dir().display(),
        audit_log = %config.output.audit_log,
        "Starting clone run"
    );
    let mut orchestrator = BatchOrchestrator::new(
        source,
        TransactionRebuilder::new(target.clone()),
        Broadcaster::new(target, &config.broadcast),
        artifacts,
        audit,
    );

    if let Some(url) = config.notifications.resolve_webhook() {
        match WebhookNotifier::new(&url, config.notifications.timeout_secs) {
            Ok(notifier) => orchestrator = orchestrator.with_notifier(notifier),
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid webhook URL"),
        }
    }

    let total = items.len();
    for report in orchestrator.run(&items, &key, &options).await {
        let position = match report.tag {
            ItemTag::Batch(index) => format!("{}/{}", index, total),
            ItemTag::Single => "single".to_string(),
        };
        match report.decoded.method() {
            Some(method) => println!("[{}] {} ({}): {}", position, report.tx_id, method, report.result),
            None => println!("[{}] {}: {}", position, report.tx_id, report.result),
        }
    }

    Ok(ExitCode::SUCCESS)
}
