//! Shared utilities for pipeline integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::hex;
use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};

use tron_txn_clone::batch::{ArtifactWriter, BatchOrchestrator};
use tron_txn_clone::blockchain::types::{
    ChainError, ChainResult, RawTransaction, TransactionInfo, TransactionTemplate,
    TriggerRequest, TRIGGER_SMART_CONTRACT,
};
use tron_txn_clone::blockchain::{
    Broadcaster, ChainClient, KeyMaterial, SignedTransaction, TransactionRebuilder,
};
use tron_txn_clone::config::BroadcastConfig;
use tron_txn_clone::observability::MemoryAuditLog;

/// Anvil's first private key; controls `OWNER_HEX`.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OWNER_HEX: &str = "41f39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const CONTRACT_HEX: &str = "41a614f803b6fd780986a42c78ec9c7f77e6ded13c";
pub const RECIPIENT_HASH: &str = "70997970c51812dc3a010c7d01b50e0d17dc79c8";

pub fn key() -> KeyMaterial {
    KeyMaterial::from_hex(TEST_PRIVATE_KEY)
}

/// `transfer(recipient, amount)` call data.
pub fn transfer_payload(amount: u64) -> String {
    format!("a9059cbb{:0>64}{:064x}", RECIPIENT_HASH, amount)
}

pub fn trigger_tx(tx_id: &str, data: &str) -> RawTransaction {
    RawTransaction {
        tx_id: tx_id.to_string(),
        contract_type: TRIGGER_SMART_CONTRACT.to_string(),
        contract_address: Some(CONTRACT_HEX.to_string()),
        owner_address: Some(OWNER_HEX.to_string()),
        data: data.to_string(),
    }
}

/// Ordered record of calls across every mock sharing it.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Scripted in-memory node.
pub struct MockChainClient {
    calls: CallLog,
    transactions: Mutex<HashMap<String, RawTransaction>>,
    trigger_rejection: Mutex<Option<(String, String)>>,
    broadcast_rejection: Mutex<Option<(String, String)>>,
    tamper_payload: Mutex<bool>,
    receipt_result: Mutex<String>,
    never_confirm: Mutex<bool>,
    pending_polls: AtomicU64,
    failing_polls: AtomicU64,
    accepted: Mutex<HashSet<String>>,
    broadcasts: Mutex<Vec<SignedTransaction>>,
    counter: AtomicU64,
}

impl MockChainClient {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            transactions: Mutex::new(HashMap::new()),
            trigger_rejection: Mutex::new(None),
            broadcast_rejection: Mutex::new(None),
            tamper_payload: Mutex::new(false),
            receipt_result: Mutex::new("SUCCESS".to_string()),
            never_confirm: Mutex::new(false),
            pending_polls: AtomicU64::new(0),
            failing_polls: AtomicU64::new(0),
            accepted: Mutex::new(HashSet::new()),
            broadcasts: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn with_transaction(self, tx: RawTransaction) -> Self {
        self.transactions.lock().unwrap().insert(tx.tx_id.clone(), tx);
        self
    }

    pub fn reject_trigger(&self, code: &str, message: &str) {
        *self.trigger_rejection.lock().unwrap() = Some((code.to_string(), message.to_string()));
    }

    pub fn reject_broadcast(&self, code: &str, message: &str) {
        *self.broadcast_rejection.lock().unwrap() = Some((code.to_string(), message.to_string()));
    }

    pub fn tamper_payload(&self) {
        *self.tamper_payload.lock().unwrap() = true;
    }

    pub fn set_receipt_result(&self, result: &str) {
        *self.receipt_result.lock().unwrap() = result.to_string();
    }

    pub fn never_confirm(&self) {
        *self.never_confirm.lock().unwrap() = true;
    }

    /// Report the next `polls` info requests as pending.
    pub fn pending_for(&self, polls: u64) {
        self.pending_polls.store(polls, Ordering::SeqCst);
    }

    /// Fail the next `polls` info requests with a transport error.
    pub fn fail_polls(&self, polls: u64) {
        self.failing_polls.store(polls, Ordering::SeqCst);
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().unwrap().clone()
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn fetch_transaction(&self, tx_id: &str) -> ChainResult<RawTransaction> {
        self.log(format!("fetch:{}", tx_id));
        self.transactions
            .lock()
            .unwrap()
            .get(tx_id)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(tx_id.to_string()))
    }

    async fn trigger_smart_contract(
        &self,
        request: &TriggerRequest,
    ) -> ChainResult<TransactionTemplate> {
        self.log(format!("trigger:{}", request.data));
        if let Some((code, message)) = self.trigger_rejection.lock().unwrap().clone() {
            return Err(ChainError::Rejected { code, message });
        }

        let data = if *self.tamper_payload.lock().unwrap() {
            format!("{}00", request.data)
        } else {
            request.data.clone()
        };

        let mut value = json!({
            "owner_address": request.owner_address,
            "contract_address": request.contract_address,
            "call_value": request.call_value,
        });
        if !data.is_empty() {
            value["data"] = json!(data);
        }

        let raw_data = json!({
            "contract": [{
                "parameter": {
                    "value": value,
                    "type_url": "type.googleapis.com/protocol.TriggerSmartContract"
                },
                "type": "TriggerSmartContract"
            }],
            "ref_block_bytes": "1a2b",
            "ref_block_hash": "0011223344556677",
            "expiration": 1_700_000_060_000u64,
            "fee_limit": request.fee_limit,
            "timestamp": 1_700_000_000_000u64 + self.counter.fetch_add(1, Ordering::SeqCst),
        });
        let raw_data_hex = hex::encode(serde_json::to_vec(&raw_data).unwrap());
        let tx_id = hex::encode(Sha256::digest(hex::decode(&raw_data_hex).unwrap()));

        Ok(TransactionTemplate {
            tx_id,
            raw_data,
            raw_data_hex,
            visible: request.visible,
        })
    }

    async fn broadcast_transaction(&self, signed: &SignedTransaction) -> ChainResult<String> {
        self.log(format!("broadcast:{}", signed.tx_id()));
        if let Some((code, message)) = self.broadcast_rejection.lock().unwrap().clone() {
            return Err(ChainError::Rejected { code, message });
        }
        self.broadcasts.lock().unwrap().push(signed.clone());
        self.accepted.lock().unwrap().insert(signed.tx_id().to_string());
        Ok(signed.tx_id().to_string())
    }

    async fn transaction_info(&self, tx_id: &str) -> ChainResult<Option<TransactionInfo>> {
        self.log(format!("info:{}", tx_id));
        if *self.never_confirm.lock().unwrap() {
            return Ok(None);
        }
        let failing = self.failing_polls.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_polls.store(failing - 1, Ordering::SeqCst);
            return Err(ChainError::Rpc("502 Bad Gateway".to_string()));
        }
        let pending = self.pending_polls.load(Ordering::SeqCst);
        if pending > 0 {
            self.pending_polls.store(pending - 1, Ordering::SeqCst);
            return Ok(None);
        }
        if !self.accepted.lock().unwrap().contains(tx_id) {
            return Ok(None);
        }
        let receipt_result = self.receipt_result.lock().unwrap().clone();
        Ok(Some(TransactionInfo {
            block_number: 58_000_000,
            message: (receipt_result != "SUCCESS").then(|| receipt_result.clone()),
            receipt_result,
        }))
    }
}

pub fn fast_broadcast_config() -> BroadcastConfig {
    BroadcastConfig {
        confirmation_timeout_secs: 1,
        poll_interval_ms: 5,
    }
}

/// A wired-up pipeline over two mocks.
pub struct Harness {
    pub calls: CallLog,
    pub source: Arc<MockChainClient>,
    pub target: Arc<MockChainClient>,
    pub audit: Arc<MemoryAuditLog>,
    pub orchestrator: BatchOrchestrator,
}

impl Harness {
    pub fn new(transactions: Vec<RawTransaction>, artifact_dir: &Path) -> Self {
        Self::with_target(transactions, artifact_dir, |_| {})
    }

    pub fn with_target(
        transactions: Vec<RawTransaction>,
        artifact_dir: &Path,
        configure: impl FnOnce(&MockChainClient),
    ) -> Self {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

        let mut source = MockChainClient::new(calls.clone());
        for tx in transactions {
            source = source.with_transaction(tx);
        }
        let source = Arc::new(source);

        let target = MockChainClient::new(calls.clone());
        configure(&target);
        let target = Arc::new(target);

        let audit = Arc::new(MemoryAuditLog::new());
        let orchestrator = BatchOrchestrator::new(
            source.clone(),
            TransactionRebuilder::new(target.clone()),
            Broadcaster::new(target.clone(), &fast_broadcast_config()),
            ArtifactWriter::new(artifact_dir, "rebuilt_transaction"),
            audit.clone(),
        );

        Self {
            calls,
            source,
            target,
            audit,
            orchestrator,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Names of the files in `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
