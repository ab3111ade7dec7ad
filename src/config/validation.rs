//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and value ranges
//! - Refuse a target that shares the source's primary endpoint
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CloneConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::{CloneConfig, KeySource, NetworkConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &CloneConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_network("source", &config.source, &mut errors);
    validate_network("target", &config.target, &mut errors);

    if normalize_url(&config.source.rpc_url) == normalize_url(&config.target.rpc_url) {
        errors.push(ValidationError::new(
            "target.rpc_url",
            "must differ from source.rpc_url",
        ));
    }

    if config.defaults.fee_limit == 0 {
        errors.push(ValidationError::new("defaults.fee_limit", "must be greater than 0"));
    }

    if config.broadcast.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "broadcast.poll_interval_ms",
            "must be greater than 0",
        ));
    }

    if config.broadcast.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "broadcast.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.output.artifact_prefix.trim().is_empty() {
        errors.push(ValidationError::new("output.artifact_prefix", "must not be empty"));
    }

    match config.key.source {
        KeySource::Env if config.key.env_var.trim().is_empty() => {
            errors.push(ValidationError::new("key.env_var", "must not be empty"));
        }
        KeySource::File if config.key.file.is_none() => {
            errors.push(ValidationError::new(
                "key.file",
                "required when key.source = \"file\"",
            ));
        }
        _ => {}
    }

    if let Some(url) = &config.notifications.webhook_url {
        if url::Url::parse(url).is_err() {
            errors.push(ValidationError::new(
                "notifications.webhook_url",
                format!("invalid URL '{}'", url),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_network(section: &str, network: &NetworkConfig, errors: &mut Vec<ValidationError>) {
    if url::Url::parse(&network.rpc_url).is_err() {
        errors.push(ValidationError::new(
            format!("{}.rpc_url", section),
            format!("invalid URL '{}'", network.rpc_url),
        ));
    }

    for (i, failover) in network.failover_urls.iter().enumerate() {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                format!("{}.failover_urls[{}]", section, i),
                format!("invalid URL '{}'", failover),
            ));
        }
    }

    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            format!("{}.rpc_timeout_secs", section),
            "must be greater than 0",
        ));
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_ascii_lowercase()
}
