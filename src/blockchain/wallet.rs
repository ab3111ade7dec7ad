//! Key material, key providers and transaction signing.
//!
//! # Security
//! - Key material lives only in memory, zeroized on drop
//! - Keys are never logged or serialized
//! - The provider is chosen by configuration, never by whichever
//!   variable happens to be set

use std::fmt;
use std::path::PathBuf;

use alloy::hex;
use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::blockchain::address::TronAddress;
use crate::config::schema::{KeyConfig, KeySource};

/// Length of a raw secp256k1 private key.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Errors raised while acquiring key material. All of them are fatal.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("environment variable {0} not set")]
    MissingEnv(String),

    #[error("key from {source_name} is not valid base64")]
    InvalidBase64 { source_name: String },

    #[error("key from {source_name} has {len} bytes, expected 32")]
    InvalidLength { source_name: String, len: usize },

    #[error("secure key entry failed: {0}")]
    Prompt(std::io::Error),

    #[error("failed to read key file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("key.file is required for the file key source")]
    MissingFilePath,
}

/// Errors raised while signing. These are per-item failures.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// A private key held in canonical lowercase hex.
#[derive(Clone)]
pub struct KeyMaterial {
    hex: Zeroizing<String>,
}

impl KeyMaterial {
    /// Wrap a hex key as typed; validation happens at signing time.
    pub fn from_hex(key: &str) -> Self {
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        Self {
            hex: Zeroizing::new(key.to_ascii_lowercase()),
        }
    }

    /// Decode a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str, source_name: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(
            general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|_| KeyError::InvalidBase64 {
                    source_name: source_name.to_string(),
                })?,
        );
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeyError::InvalidLength {
                source_name: source_name.to_string(),
                len: bytes.len(),
            });
        }
        Ok(Self {
            hex: Zeroizing::new(hex::encode(&*bytes)),
        })
    }

    /// Base64 form, as stored in the environment.
    pub fn to_base64(&self) -> Result<String, WalletError> {
        let bytes = Zeroizing::new(
            hex::decode(self.hex.as_str())
                .map_err(|e| WalletError::InvalidKey(e.to_string()))?,
        );
        Ok(general_purpose::STANDARD.encode(&*bytes))
    }

    /// Exposes the hex key to a closure.
    pub fn with_exposed<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        f(&self.hex)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial(***REDACTED***)")
    }
}

/// Source of the signing key.
pub trait KeyProvider {
    /// Load the key once at startup.
    fn load(&self) -> Result<KeyMaterial, KeyError>;
}

/// Reads a base64 key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    pub var: String,
}

impl KeyProvider for EnvKeyProvider {
    fn load(&self) -> Result<KeyMaterial, KeyError> {
        let encoded = Zeroizing::new(
            std::env::var(&self.var).map_err(|_| KeyError::MissingEnv(self.var.clone()))?,
        );
        KeyMaterial::from_base64(&encoded, &self.var)
    }
}

/// Asks for a hex key on the terminal without echo.
#[derive(Debug, Clone, Default)]
pub struct PromptKeyProvider;

impl KeyProvider for PromptKeyProvider {
    fn load(&self) -> Result<KeyMaterial, KeyError> {
        let typed = Zeroizing::new(
            rpassword::prompt_password("Enter mainnet private key (hex): ")
                .map_err(KeyError::Prompt)?,
        );
        Ok(KeyMaterial::from_hex(&typed))
    }
}

/// Reads a base64 key from a file, e.g. a mounted secret.
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    pub path: PathBuf,
}

impl KeyProvider for FileKeyProvider {
    fn load(&self) -> Result<KeyMaterial, KeyError> {
        let path = self.path.display().to_string();
        let encoded = Zeroizing::new(std::fs::read_to_string(&self.path).map_err(|source| {
            KeyError::File {
                path: path.clone(),
                source,
            }
        })?);
        KeyMaterial::from_base64(&encoded, &path)
    }
}

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &KeyConfig) -> Result<Box<dyn KeyProvider>, KeyError> {
    Ok(match config.source {
        KeySource::Env => Box::new(EnvKeyProvider {
            var: config.env_var.clone(),
        }),
        KeySource::Prompt => Box::new(PromptKeyProvider),
        KeySource::File => Box::new(FileKeyProvider {
            path: config.file.clone().ok_or(KeyError::MissingFilePath)?.into(),
        }),
    })
}

/// Signing wallet built from key material.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from key material.
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn from_key_material(key: &KeyMaterial) -> Result<Self, WalletError> {
        let bytes = key
            .with_exposed(|hex_key| hex::decode(hex_key).map(Zeroizing::new))
            .map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(WalletError::InvalidKey(format!(
                "{} bytes, expected {}",
                bytes.len(),
                PRIVATE_KEY_LEN
            )));
        }

        let signer = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| WalletError::InvalidKey(e.to_string()))?;

        Ok(Self { signer })
    }

    /// The wallet's prefixed address.
    pub fn address(&self) -> TronAddress {
        TronAddress::from(self.signer.address())
    }

    /// Sign a 32-byte digest without any message prefix.
    ///
    /// # Returns
    /// The 65-byte signature (r, s, v)
    pub fn sign_digest(&self, digest: B256) -> Result<[u8; 65], WalletError> {
        self.signer
            .sign_hash_sync(&digest)
            .map(|signature| signature.as_bytes())
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}
