//! Sequential clone pipeline.
//!
//! # State Machine (per item)
//! ```text
//! Fetch → Extract → Rebuild → Persist ─┬─ dry run ──────────────→ Recorded(DryRun)
//!   │        │         │         │      └─ Sign → Broadcast ────→ Recorded(BroadcastOk | BroadcastFailed)
//!   └────────┴─────────┴─────────┴──── failure ──────────────────→ Recorded(Skipped)
//! ```
//!
//! # Design Decisions
//! - Items run strictly one after another, in input order: they share a
//!   fee-paying account, so each must land before the next is built
//! - Every failure stops only its own item; nothing is retried
//! - The key is borrowed per call, never stored here

use std::sync::Arc;

use alloy::hex;
use tracing::Instrument;

use crate::batch::artifact::ArtifactWriter;
use crate::batch::types::{BatchResult, CloneError, ItemReport, ItemTag, RunOptions, WorkItem};
use crate::blockchain::address::TronAddress;
use crate::blockchain::client::ChainClient;
use crate::blockchain::decoder::{self, DecodedInvocation};
use crate::blockchain::transaction::{self, Broadcaster, TransactionRebuilder};
use crate::blockchain::types::{RawTransaction, TRIGGER_SMART_CONTRACT};
use crate::blockchain::wallet::KeyMaterial;
use crate::observability::{AuditSink, WebhookNotifier};

/// Fields of a source transaction needed to rebuild it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCall {
    pub contract: TronAddress,
    pub owner: TronAddress,
    pub payload: Vec<u8>,
    /// Payload as the node reported it, for decoding.
    pub payload_hex: String,
}

/// Pull the contract call out of a fetched transaction.
pub fn extract(raw: &RawTransaction) -> Result<ExtractedCall, CloneError> {
    if raw.contract_type != TRIGGER_SMART_CONTRACT {
        return Err(CloneError::UnsupportedContract(raw.contract_type.clone()));
    }

    let parse = |field: &'static str, value: &Option<String>| -> Result<TronAddress, CloneError> {
        let value = value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or(CloneError::MissingField(field))?;
        value
            .parse()
            .map_err(|source| CloneError::InvalidAddress { field, source })
    };

    let contract = parse("contract_address", &raw.contract_address)?;
    let owner = parse("owner_address", &raw.owner_address)?;

    let payload_hex = raw.data.trim().to_string();
    let payload = hex::decode(&payload_hex).map_err(|_| CloneError::InvalidPayload)?;

    Ok(ExtractedCall {
        contract,
        owner,
        payload,
        payload_hex,
    })
}

/// Drives fetch, rebuild, sign and broadcast over a list of items.
pub struct BatchOrchestrator {
    source: Arc<dyn ChainClient>,
    rebuilder: TransactionRebuilder,
    broadcaster: Broadcaster,
    artifacts: ArtifactWriter,
    audit: Arc<dyn AuditSink>,
    notifier: Option<WebhookNotifier>,
}

impl BatchOrchestrator {
    pub fn new(
        source: Arc<dyn ChainClient>,
        rebuilder: TransactionRebuilder,
        broadcaster: Broadcaster,
        artifacts: ArtifactWriter,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            source,
            rebuilder,
            broadcaster,
            artifacts,
            audit,
            notifier: None,
        }
    }

    /// Send broadcast outcomes to a webhook as well.
    pub fn with_notifier(mut self, notifier: WebhookNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Process every item in order; one report per item.
    pub async fn run(
        &self,
        items: &[WorkItem],
        key: &KeyMaterial,
        options: &RunOptions,
    ) -> Vec<ItemReport> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "clone_run",
            %run_id,
            items = items.len(),
            dry_run = options.dry_run
        );

        async {
            let mut reports = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                tracing::info!(
                    tag = %item.tag,
                    tx_id = %item.tx_id,
                    "Processing {}/{}",
                    i + 1,
                    items.len()
                );
                reports.push(self.process(item, key, options).await);
            }

            let succeeded = reports.iter().filter(|r| r.result.is_success()).count();
            tracing::info!(succeeded, failed = reports.len() - succeeded, "Run complete");
            reports
        }
        .instrument(span)
        .await
    }

    /// Run one item through the pipeline and record its outcome.
    pub async fn process(
        &self,
        item: &WorkItem,
        key: &KeyMaterial,
        options: &RunOptions,
    ) -> ItemReport {
        let mut decoded = DecodedInvocation::Unrecognized;
        let result = match self.clone_item(item, key, options, &mut decoded).await {
            Ok(result) => result,
            Err(e) => {
                self.record_failure(&item.tag, &item.tx_id, &e).await;
                e.into_result()
            }
        };

        ItemReport {
            tag: item.tag,
            tx_id: item.tx_id.clone(),
            decoded,
            result,
        }
    }

    async fn clone_item(
        &self,
        item: &WorkItem,
        key: &KeyMaterial,
        options: &RunOptions,
        decoded: &mut DecodedInvocation,
    ) -> Result<BatchResult, CloneError> {
        let tag = &item.tag;

        let raw = self
            .source
            .fetch_transaction(&item.tx_id)
            .await
            .map_err(CloneError::Fetch)?;

        let call = extract(&raw)?;

        *decoded = match decoder::try_decode(&call.payload_hex) {
            Ok(invocation) => invocation,
            Err(e) => {
                self.audit.record(&format!("Failed to decode call data for {}: {}", tag, e));
                tracing::warn!(tag = %tag, error = %e, "Call data decode degraded");
                DecodedInvocation::Unrecognized
            }
        };

        let unsigned = self
            .rebuilder
            .rebuild(
                &call.contract,
                &call.owner,
                &call.payload,
                options.fee_limit,
                options.call_value,
            )
            .await?;

        let path = self.artifacts.write(tag, &unsigned, decoded)?;
        tracing::info!(tag = %tag, path = %path.display(), "Rebuilt transaction saved");

        if options.dry_run {
            self.audit.record(&format!("Dry-run: skipped signing {}", tag));
            return Ok(BatchResult::DryRun);
        }

        let signed = transaction::sign(&unsigned, key)?;
        let confirmation = self.broadcaster.broadcast(&signed).await?;

        let message = format!("Broadcast success for {}: {}", tag, confirmation.tx_id);
        self.audit.record(&message);
        self.notify(&message).await;
        tracing::info!(
            tag = %tag,
            tx_id = %confirmation.tx_id,
            block_number = confirmation.block_number,
            "Broadcast confirmed"
        );

        Ok(BatchResult::BroadcastOk {
            confirmation_id: confirmation.tx_id,
        })
    }

    async fn record_failure(&self, tag: &ItemTag, tx_id: &str, error: &CloneError) {
        let message = match error {
            CloneError::Fetch(e) => format!("Error fetching tx {}: {}", tx_id, e),
            CloneError::Broadcast(e) => format!("Broadcast failed for {}: {}", tag, e),
            other => format!("{} error for {}: {}", other.stage(), tag, other),
        };

        self.audit.record(&message);
        tracing::warn!(tag = %tag, tx_id = %tx_id, stage = %error.stage(), error = %error, "Item failed");

        if matches!(error, CloneError::Broadcast(_)) {
            self.notify(&message).await;
        }
    }

    async fn notify(&self, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(message).await;
        }
    }
}
