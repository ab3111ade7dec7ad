//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the cloner.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default fee ceiling in SUN.
pub const DEFAULT_FEE_LIMIT: u64 = 3_000_000;

/// Default environment variable holding the base64 signing key.
pub const DEFAULT_KEY_ENV_VAR: &str = "TRON_MAINNET_KEY";

/// Default environment variable holding the notification webhook URL.
pub const DEFAULT_WEBHOOK_ENV_VAR: &str = "TRON_TX_WEBHOOK";

/// Root configuration for the transaction cloner.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CloneConfig {
    /// Network the original transactions are read from.
    pub source: NetworkConfig,

    /// Network the rebuilt transactions are submitted to.
    pub target: NetworkConfig,

    /// Artifact and audit log locations.
    pub output: OutputConfig,

    /// Signing key acquisition.
    pub key: KeyConfig,

    /// Broadcast confirmation settings.
    pub broadcast: BroadcastConfig,

    /// Per-call defaults, overridable from the command line.
    pub defaults: CallDefaults,

    /// Outcome notifications.
    pub notifications: NotificationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            source: NetworkConfig::nile(),
            target: NetworkConfig::mainnet(),
            output: OutputConfig::default(),
            key: KeyConfig::default(),
            broadcast: BroadcastConfig::default(),
            defaults: CallDefaults::default(),
            notifications: NotificationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Full-node HTTP endpoint configuration for one network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Human-readable network name for logs.
    pub name: String,

    /// Primary full-node HTTP endpoint.
    pub rpc_url: String,

    /// Failover endpoints, tried in order on transport failure.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Optional TronGrid API key sent as `TRON-PRO-API-KEY`.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl NetworkConfig {
    /// Nile testnet defaults.
    pub fn nile() -> Self {
        Self {
            name: "nile".to_string(),
            rpc_url: "https://nile.trongrid.io".to_string(),
            ..Self::default()
        }
    }

    /// Mainnet defaults.
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".to_string(),
            rpc_url: "https://api.trongrid.io".to_string(),
            ..Self::default()
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            rpc_url: "http://localhost:8090".to_string(),
            failover_urls: Vec::new(),
            api_key: None,
            rpc_timeout_secs: 10,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one JSON artifact per processed item.
    pub artifact_dir: String,

    /// File name prefix for artifacts (`<prefix>_<tag>.json`).
    pub artifact_prefix: String,

    /// Append-only audit log path.
    pub audit_log: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_dir: ".".to_string(),
            artifact_prefix: "rebuilt_transaction".to_string(),
            audit_log: "txn_clone.log".to_string(),
        }
    }
}

/// Where the signing key comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// Base64 key in an environment variable.
    #[default]
    Env,
    /// Hidden interactive hex entry.
    Prompt,
    /// Base64 key stored in a file.
    File,
}

impl std::str::FromStr for KeySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "prompt" => Ok(Self::Prompt),
            "file" => Ok(Self::File),
            other => Err(format!("unknown key source '{}' (expected env, prompt or file)", other)),
        }
    }
}

/// Key acquisition configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Selected provider.
    pub source: KeySource,

    /// Environment variable read by the `env` provider.
    pub env_var: String,

    /// Path read by the `file` provider.
    pub file: Option<String>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            source: KeySource::Env,
            env_var: DEFAULT_KEY_ENV_VAR.to_string(),
            file: None,
        }
    }
}

/// Broadcast confirmation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Maximum time to wait for the transaction to land in a block.
    pub confirmation_timeout_secs: u64,

    /// Delay between transaction-info polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 60,
            // One TRON block.
            poll_interval_ms: 3000,
        }
    }
}

/// Call envelope defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CallDefaults {
    /// Fee ceiling in SUN.
    pub fee_limit: u64,

    /// TRX attached to the call in SUN.
    pub call_value: u64,
}

impl Default for CallDefaults {
    fn default() -> Self {
        Self {
            fee_limit: DEFAULT_FEE_LIMIT,
            call_value: 0,
        }
    }
}

/// Webhook notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Explicit webhook URL; takes precedence over the environment.
    pub webhook_url: Option<String>,

    /// Environment variable consulted when `webhook_url` is unset.
    pub webhook_env_var: String,

    /// Webhook request timeout in seconds.
    pub timeout_secs: u64,
}

impl NotificationConfig {
    /// Resolve the effective webhook URL, if any.
    pub fn resolve_webhook(&self) -> Option<String> {
        self.webhook_url
            .clone()
            .or_else(|| std::env::var(&self.webhook_env_var).ok())
            .filter(|url| !url.trim().is_empty())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_env_var: DEFAULT_WEBHOOK_ENV_VAR.to_string(),
            timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
