//! Transaction rebuilding, signing, broadcast and confirmation monitoring.
//!
//! # Responsibilities
//! - Rebuild a source call as a target-network transaction
//! - Sign the rebuilt transaction
//! - Broadcast and wait for inclusion
//!
//! # Design Decisions
//! - Call payload bytes are carried through untouched; only the envelope
//!   (addresses, fee ceiling, call value, block reference) is new
//! - Rejections reported by the chain are kept apart from transport failures

use alloy::hex;
use alloy::primitives::{Bytes, B256};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval, timeout};

use crate::blockchain::address::TronAddress;
use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainError, TransactionTemplate, TriggerRequest};
use crate::blockchain::wallet::{KeyMaterial, Wallet, WalletError};
use crate::config::schema::BroadcastConfig;

/// Length of a method selector.
pub const SELECTOR_LEN: usize = 4;

/// Errors raised while rebuilding a transaction on the target network.
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("target node refused to build the call: {0}")]
    Chain(#[from] ChainError),

    #[error("template call data {actual} does not match source payload {expected}")]
    PayloadMismatch { expected: String, actual: String },

    #[error("template is missing {0}")]
    IncompleteTemplate(&'static str),
}

/// Errors raised while signing.
#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("raw_data_hex is not valid hex")]
    InvalidRawData,

    #[error("template txID {reported} does not match sha256(raw_data) {computed}")]
    DigestMismatch { reported: String, computed: String },
}

/// Broadcast failures, classified by who reported them.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The chain looked at the transaction and refused or failed it.
    #[error("rejected: {0}")]
    Rejected(String),

    /// We could not find out what happened.
    #[error("transport: {0}")]
    Transport(String),
}

impl From<ChainError> for BroadcastError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Rejected { code, message } => Self::Rejected(format!("{}: {}", code, message)),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// A call rebuilt for the target network, not yet signed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    /// Called contract, target encoding.
    pub contract_address: TronAddress,
    /// Caller, target encoding.
    pub owner_address: TronAddress,
    /// Method selector, up to four bytes (shorter only for short payloads).
    pub selector: Bytes,
    /// ABI-encoded parameters following the selector.
    pub parameters: Bytes,
    /// Fee ceiling in SUN.
    pub fee_limit: u64,
    /// TRX attached in SUN.
    pub call_value: u64,
    /// Node-built envelope, including block reference and expiration.
    pub template: TransactionTemplate,
}

impl UnsignedTransaction {
    /// Selector followed by parameters, exactly as on the source chain.
    pub fn payload(&self) -> Vec<u8> {
        [self.selector.as_ref(), self.parameters.as_ref()].concat()
    }

    /// Transaction id reported by the target node.
    pub fn tx_id(&self) -> &str {
        &self.template.tx_id
    }

    /// JSON form persisted as the audit artifact.
    pub fn to_json(&self) -> Value {
        json!({
            "visible": self.template.visible,
            "txID": self.template.tx_id,
            "raw_data": self.template.raw_data,
            "raw_data_hex": self.template.raw_data_hex,
        })
    }
}

/// An unsigned transaction plus its signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    signature: [u8; 65],
}

impl SignedTransaction {
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn signature(&self) -> &[u8; 65] {
        &self.signature
    }

    pub fn tx_id(&self) -> &str {
        self.unsigned.tx_id()
    }

    /// Body for `broadcasttransaction`.
    pub fn to_broadcast_json(&self) -> Value {
        let mut body = self.unsigned.to_json();
        body["signature"] = json!([hex::encode(self.signature)]);
        body
    }
}

/// Rebuilds source calls through the target network's node.
#[derive(Clone)]
pub struct TransactionRebuilder {
    target: Arc<dyn ChainClient>,
}

impl TransactionRebuilder {
    pub fn new(target: Arc<dyn ChainClient>) -> Self {
        Self { target }
    }

    /// Build an unsigned target transaction carrying `payload` unchanged.
    ///
    /// # Arguments
    /// * `contract` - Source contract address, re-encoded for the target
    /// * `owner` - Source caller address, re-encoded for the target
    /// * `payload` - Raw call data, selector first
    pub async fn rebuild(
        &self,
        contract: &TronAddress,
        owner: &TronAddress,
        payload: &[u8],
        fee_limit: u64,
        call_value: u64,
    ) -> Result<UnsignedTransaction, RebuildError> {
        let expected = hex::encode(payload);
        let request = TriggerRequest {
            owner_address: owner.to_base58(),
            contract_address: contract.to_base58(),
            data: expected.clone(),
            fee_limit,
            call_value,
            visible: true,
        };

        let template = self.target.trigger_smart_contract(&request).await?;

        if template.tx_id.is_empty() {
            return Err(RebuildError::IncompleteTemplate("txID"));
        }
        if template.raw_data_hex.is_empty() {
            return Err(RebuildError::IncompleteTemplate("raw_data_hex"));
        }
        let actual = template
            .call_data()
            .ok_or(RebuildError::IncompleteTemplate("contract parameters"))?;
        let actual = actual.strip_prefix("0x").unwrap_or(actual).to_ascii_lowercase();
        if actual != expected {
            return Err(RebuildError::PayloadMismatch { expected, actual });
        }

        let split = payload.len().min(SELECTOR_LEN);
        let unsigned = UnsignedTransaction {
            contract_address: *contract,
            owner_address: *owner,
            selector: Bytes::copy_from_slice(&payload[..split]),
            parameters: Bytes::copy_from_slice(&payload[split..]),
            fee_limit,
            call_value,
            template,
        };

        tracing::debug!(
            tx_id = %unsigned.tx_id(),
            contract = %contract,
            owner = %owner,
            fee_limit,
            call_value,
            "Transaction rebuilt"
        );

        Ok(unsigned)
    }
}

/// Transaction id for a raw_data encoding: sha256 of its bytes.
pub fn transaction_digest(raw_data_hex: &str) -> Result<B256, SignError> {
    let raw = hex::decode(raw_data_hex).map_err(|_| SignError::InvalidRawData)?;
    Ok(B256::from_slice(&Sha256::digest(&raw)))
}

/// Sign a rebuilt transaction with `key`.
pub fn sign(unsigned: &UnsignedTransaction, key: &KeyMaterial) -> Result<SignedTransaction, SignError> {
    let wallet = Wallet::from_key_material(key)?;

    let digest = transaction_digest(&unsigned.template.raw_data_hex)?;
    let computed = hex::encode(digest);
    if !computed.eq_ignore_ascii_case(unsigned.tx_id()) {
        return Err(SignError::DigestMismatch {
            reported: unsigned.tx_id().to_string(),
            computed,
        });
    }

    if wallet.address() != unsigned.owner_address {
        tracing::warn!(
            signer = %wallet.address(),
            owner = %unsigned.owner_address,
            "Signing key does not control the transaction owner; the chain will likely reject it"
        );
    }

    let signature = wallet.sign_digest(digest)?;

    Ok(SignedTransaction {
        unsigned: unsigned.clone(),
        signature,
    })
}

/// A transaction included on the target network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_id: String,
    pub block_number: u64,
}

/// Submits signed transactions and waits for inclusion.
#[derive(Clone)]
pub struct Broadcaster {
    target: Arc<dyn ChainClient>,
    timeout_duration: Duration,
    poll_interval: Duration,
}

impl Broadcaster {
    pub fn new(target: Arc<dyn ChainClient>, config: &BroadcastConfig) -> Self {
        Self {
            target,
            timeout_duration: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Broadcast and block until the node reports inclusion or rejection.
    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<Confirmation, BroadcastError> {
        let tx_id = self.target.broadcast_transaction(signed).await?;
        tracing::info!(tx_id = %tx_id, "Transaction accepted by node");
        self.wait_for_confirmation(&tx_id).await
    }

    /// Poll transaction info until the transaction lands in a block.
    pub async fn wait_for_confirmation(&self, tx_id: &str) -> Result<Confirmation, BroadcastError> {
        let result = timeout(self.timeout_duration, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                // Only the deadline ends the wait.
                let info = match self.target.transaction_info(tx_id).await {
                    Ok(Some(info)) => info,
                    Ok(None) => {
                        tracing::debug!(tx_id = %tx_id, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_id = %tx_id, error = %e, "Confirmation poll failed");
                        continue;
                    }
                };

                if !info.succeeded() {
                    let reason = match info.message {
                        Some(message) => format!("{}: {}", info.receipt_result, message),
                        None => info.receipt_result,
                    };
                    return Err(BroadcastError::Rejected(reason));
                }

                return Ok(Confirmation {
                    tx_id: tx_id.to_string(),
                    block_number: info.block_number,
                });
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BroadcastError::Transport(format!(
                "transaction {} not confirmed within {} seconds",
                tx_id,
                self.timeout_duration.as_secs()
            ))),
        }
    }
}
