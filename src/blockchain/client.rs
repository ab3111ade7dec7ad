//! Full-node HTTP client with timeout and failover handling.
//!
//! # Responsibilities
//! - Fetch transactions from the source network
//! - Template, broadcast and track transactions on the target network
//! - Handle timeouts and network errors gracefully
//!
//! # Design Decisions
//! - `ChainClient` is the seam; the pipeline never sees HTTP
//! - Failover endpoints are tried only on transport failure, never after
//!   a node has answered
//! - Broadcasts go to the primary endpoint only; a node that timed out may
//!   still have accepted the transaction

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{
    decode_node_message, ChainError, ChainResult, NetworkConfig, RawTransaction,
    TransactionInfo, TransactionTemplate, TriggerRequest,
};

/// Header carrying a TronGrid API key.
pub const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// Network access used by the clone pipeline.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch a transaction by id.
    async fn fetch_transaction(&self, tx_id: &str) -> ChainResult<RawTransaction>;

    /// Ask the node to template an unsigned contract call.
    async fn trigger_smart_contract(
        &self,
        request: &TriggerRequest,
    ) -> ChainResult<TransactionTemplate>;

    /// Submit a signed transaction; returns the id the node accepted.
    async fn broadcast_transaction(&self, signed: &SignedTransaction) -> ChainResult<String>;

    /// Inclusion status, or `None` while the transaction is still pending.
    async fn transaction_info(&self, tx_id: &str) -> ChainResult<Option<TransactionInfo>>;
}

/// HTTP client for one network's full-node API.
#[derive(Clone)]
pub struct TronHttpClient {
    http: reqwest::Client,
    /// Primary endpoint followed by failovers.
    endpoints: Vec<url::Url>,
    config: NetworkConfig,
    timeout_duration: Duration,
}

impl TronHttpClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - Network configuration
    pub fn new(config: NetworkConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut endpoints = Vec::new();

        // 1. Primary endpoint
        let primary: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        endpoints.push(primary);

        // 2. Failover endpoints
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                endpoints.push(url);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = reqwest::header::HeaderValue::from_str(key)
                .map_err(|e| ChainError::Rpc(format!("Invalid API key header: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ChainError::Rpc(format!("HTTP client setup failed: {}", e)))?;

        tracing::info!(
            network = %config.name,
            rpc_url = %config.rpc_url,
            failovers = endpoints.len() - 1,
            "Chain client initialized"
        );

        Ok(Self {
            http,
            endpoints,
            config,
            timeout_duration,
        })
    }

    /// POST a JSON body to `path`, trying each endpoint in turn.
    async fn post(&self, path: &str, body: &Value) -> ChainResult<Value> {
        self.post_to(&self.endpoints, path, body).await
    }

    /// POST a JSON body to the primary endpoint only.
    async fn post_primary(&self, path: &str, body: &Value) -> ChainResult<Value> {
        self.post_to(&self.endpoints[..1], path, body).await
    }

    async fn post_to(&self, endpoints: &[url::Url], path: &str, body: &Value) -> ChainResult<Value> {
        let mut timed_out = false;
        for (i, endpoint) in endpoints.iter().enumerate() {
            let url = endpoint
                .join(path)
                .map_err(|e| ChainError::Rpc(format!("Invalid endpoint path '{}': {}", path, e)))?;

            let fut = async {
                let response = self.http.post(url).json(body).send().await?;
                response.error_for_status()?.json::<Value>().await
            };

            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.is_decode() => {
                    return Err(ChainError::InvalidResponse(e.to_string()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, path, error = %e, "RPC error");
                    if endpoints.len() == 1 {
                        return Err(ChainError::Rpc(e.to_string()));
                    }
                }
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(provider_idx = i, path, "RPC timeout");
                }
            }
        }
        if timed_out && endpoints.len() == 1 {
            return Err(ChainError::Timeout(self.config.rpc_timeout_secs));
        }
        Err(ChainError::Rpc("All RPC providers failed".to_string()))
    }
}

#[async_trait]
impl ChainClient for TronHttpClient {
    async fn fetch_transaction(&self, tx_id: &str) -> ChainResult<RawTransaction> {
        let body = json!({ "value": tx_id });
        let value = self.post("wallet/gettransactionbyid", &body).await?;
        parse_transaction(tx_id, &value)
    }

    async fn trigger_smart_contract(
        &self,
        request: &TriggerRequest,
    ) -> ChainResult<TransactionTemplate> {
        let body = serde_json::to_value(request)
            .map_err(|e| ChainError::InvalidResponse(format!("Unserializable request: {}", e)))?;
        let value = self.post("wallet/triggersmartcontract", &body).await?;
        parse_trigger_response(&value)
    }

    async fn broadcast_transaction(&self, signed: &SignedTransaction) -> ChainResult<String> {
        let value = self
            .post_primary("wallet/broadcasttransaction", &signed.to_broadcast_json())
            .await?;
        parse_broadcast_response(signed.tx_id(), &value)
    }

    async fn transaction_info(&self, tx_id: &str) -> ChainResult<Option<TransactionInfo>> {
        let body = json!({ "value": tx_id });
        let value = self.post("wallet/gettransactioninfobyid", &body).await?;
        Ok(parse_transaction_info(&value))
    }
}

impl std::fmt::Debug for TronHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TronHttpClient")
            .field("network", &self.config.name)
            .field("rpc_url", &self.config.rpc_url)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

fn parse_transaction(tx_id: &str, value: &Value) -> ChainResult<RawTransaction> {
    // Unknown ids come back as an empty object.
    if value.as_object().map_or(true, |o| o.is_empty()) {
        return Err(ChainError::NotFound(tx_id.to_string()));
    }

    let contract = value
        .pointer("/raw_data/contract/0")
        .ok_or_else(|| ChainError::InvalidResponse("transaction has no contract".to_string()))?;
    let params = contract.pointer("/parameter/value");
    let field = |name: &str| {
        params
            .and_then(|p| p.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(RawTransaction {
        tx_id: value
            .get("txID")
            .and_then(Value::as_str)
            .unwrap_or(tx_id)
            .to_string(),
        contract_type: contract
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        contract_address: field("contract_address"),
        owner_address: field("owner_address"),
        data: field("data").unwrap_or_default(),
    })
}

fn node_rejection(value: &Value) -> ChainError {
    let code = value
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(decode_node_message)
        .unwrap_or_default();
    ChainError::Rejected { code, message }
}

fn parse_trigger_response(value: &Value) -> ChainResult<TransactionTemplate> {
    let result = value.get("result").cloned().unwrap_or(Value::Null);
    if result.get("result").and_then(Value::as_bool) != Some(true) {
        return Err(node_rejection(&result));
    }

    let transaction = value
        .get("transaction")
        .cloned()
        .ok_or_else(|| ChainError::InvalidResponse("missing transaction".to_string()))?;
    serde_json::from_value(transaction)
        .map_err(|e| ChainError::InvalidResponse(format!("malformed transaction: {}", e)))
}

fn parse_broadcast_response(tx_id: &str, value: &Value) -> ChainResult<String> {
    if value.get("result").and_then(Value::as_bool) != Some(true) {
        return Err(node_rejection(value));
    }
    Ok(value
        .get("txid")
        .and_then(Value::as_str)
        .unwrap_or(tx_id)
        .to_string())
}

fn parse_transaction_info(value: &Value) -> Option<TransactionInfo> {
    let block_number = value.get("blockNumber").and_then(Value::as_u64)?;

    let failed = value.get("result").and_then(Value::as_str) == Some("FAILED");
    let receipt_result = match value.pointer("/receipt/result").and_then(Value::as_str) {
        Some(result) if result != "SUCCESS" => result.to_string(),
        _ if failed => "FAILED".to_string(),
        // Receipts of plain successes may omit the result field.
        _ => "SUCCESS".to_string(),
    };

    Some(TransactionInfo {
        block_number,
        receipt_result,
        message: value
            .get("resMessage")
            .and_then(Value::as_str)
            .map(decode_node_message),
    })
}
