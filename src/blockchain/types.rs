//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Re-export NetworkConfig from config module to avoid duplication
pub use crate::config::schema::NetworkConfig;

/// Contract type carried by smart-contract invocations.
pub const TRIGGER_SMART_CONTRACT: &str = "TriggerSmartContract";

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Connection or HTTP-level failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node does not know the requested transaction.
    #[error("Transaction not found: {0}")]
    NotFound(String),

    /// The node answered, but refused the request.
    #[error("Rejected by node ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The node answered with something we cannot interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// A transaction as fetched from the source network.
///
/// Only the first contract of the transaction is carried; the fields are
/// kept exactly as the node reported them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Transaction id on the source network.
    pub tx_id: String,
    /// Contract type of the first contract (e.g. `TriggerSmartContract`).
    pub contract_type: String,
    /// Called contract, in the node's address encoding.
    pub contract_address: Option<String>,
    /// Caller, in the node's address encoding.
    pub owner_address: Option<String>,
    /// Hex-encoded call payload; empty when the node omitted it.
    pub data: String,
}

/// Parameters for node-side construction of a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerRequest {
    /// Caller, base58check.
    pub owner_address: String,
    /// Called contract, base58check.
    pub contract_address: String,
    /// Full call payload (selector followed by parameters), hex.
    pub data: String,
    /// Fee ceiling in SUN.
    pub fee_limit: u64,
    /// TRX attached in SUN.
    pub call_value: u64,
    /// Addresses above are in display (base58) form.
    pub visible: bool,
}

/// An unsigned transaction as templated by the target node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTemplate {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data: Value,
    pub raw_data_hex: String,
    #[serde(default)]
    pub visible: bool,
}

impl TransactionTemplate {
    /// Payload hex carried by the first contract, empty when absent.
    pub fn call_data(&self) -> Option<&str> {
        let value = self
            .raw_data
            .get("contract")?
            .get(0)?
            .get("parameter")?
            .get("value")?;
        Some(value.get("data").and_then(Value::as_str).unwrap_or(""))
    }
}

/// Inclusion status reported by the node for a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    /// Block the transaction landed in.
    pub block_number: u64,
    /// Execution result (`SUCCESS`, `REVERT`, `OUT_OF_ENERGY`, ...).
    pub receipt_result: String,
    /// Node-provided failure message, decoded to text.
    pub message: Option<String>,
}

impl TransactionInfo {
    /// Whether the contract call executed successfully.
    pub fn succeeded(&self) -> bool {
        self.receipt_result == "SUCCESS"
    }
}

/// Decode a node message, which is usually hex-encoded UTF-8.
pub fn decode_node_message(message: &str) -> String {
    alloy::hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = ChainError::Rejected {
            code: "SIGERROR".to_string(),
            message: "validate signature error".to_string(),
        };
        assert!(err.to_string().contains("SIGERROR"));
    }

    #[test]
    fn test_template_call_data() {
        let template = TransactionTemplate {
            tx_id: "ab".to_string(),
            raw_data: json!({
                "contract": [{
                    "parameter": { "value": { "data": "a9059cbb00" } },
                    "type": "TriggerSmartContract"
                }]
            }),
            raw_data_hex: "0a02".to_string(),
            visible: true,
        };
        assert_eq!(template.call_data(), Some("a9059cbb00"));
    }

    #[test]
    fn test_template_without_data_field() {
        let template = TransactionTemplate {
            tx_id: "ab".to_string(),
            raw_data: json!({ "contract": [{ "parameter": { "value": {} } }] }),
            raw_data_hex: "0a02".to_string(),
            visible: true,
        };
        assert_eq!(template.call_data(), Some(""));

        let template = TransactionTemplate {
            raw_data: json!({}),
            ..template
        };
        assert_eq!(template.call_data(), None);
    }

    #[test]
    fn test_decode_node_message() {
        // "bad sig"
        assert_eq!(decode_node_message("62616420736967"), "bad sig");
        assert_eq!(decode_node_message("plain text"), "plain text");
    }
}
