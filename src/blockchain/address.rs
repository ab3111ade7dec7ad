//! Network-prefixed account addresses.
//!
//! An address is 21 bytes: a one-byte network prefix followed by the 20-byte
//! account hash. Source transactions carry it as hex; the target network's
//! display form is base58check.

use std::fmt;
use std::str::FromStr;

use alloy::hex;
use alloy::primitives::Address;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Network prefix byte shared by mainnet and the public testnets.
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Length of a prefixed address in bytes.
pub const ADDRESS_LEN: usize = 21;

/// Errors raised while parsing an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("invalid hex address '{0}'")]
    InvalidHex(String),

    #[error("invalid base58check address '{0}'")]
    InvalidBase58(String),

    #[error("address has {0} bytes, expected 20 or 21")]
    InvalidLength(usize),

    #[error("unexpected network prefix 0x{0:02x}")]
    InvalidPrefix(u8),
}

/// A 21-byte prefixed account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; ADDRESS_LEN]);

impl TronAddress {
    /// Build from the 20-byte account hash.
    pub fn from_hash(hash: [u8; 20]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(&hash);
        Self(bytes)
    }

    /// Take the low 20 bytes of a 32-byte ABI word.
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&word[12..]);
        Self::from_hash(hash)
    }

    /// Parse raw address bytes: 21 bytes with prefix or a bare 20-byte hash.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        match bytes.len() {
            20 => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(bytes);
                Ok(Self::from_hash(hash))
            }
            ADDRESS_LEN => {
                if bytes[0] != ADDRESS_PREFIX {
                    return Err(AddressError::InvalidPrefix(bytes[0]));
                }
                let mut out = [0u8; ADDRESS_LEN];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }
            0 => Err(AddressError::Empty),
            n => Err(AddressError::InvalidLength(n)),
        }
    }

    /// Parse a base58check address (`T...`).
    pub fn from_base58(s: &str) -> Result<Self, AddressError> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58(s.to_string()))?;
        if bytes.len() != ADDRESS_LEN {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        Self::from_slice(&bytes)
    }

    /// Parse a hex address, with or without prefix byte and `0x`.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let bytes = hex::decode(s).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Raw prefixed bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Prefixed lowercase hex, e.g. `41a614f8...`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Base58check display form, e.g. `TR7NHqje...`.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }
}

impl From<Address> for TronAddress {
    fn from(address: Address) -> Self {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(address.as_slice());
        Self::from_hash(hash)
    }
}

impl FromStr for TronAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.starts_with('T') && s.len() == 34 {
            return Self::from_base58(s);
        }
        Self::from_hex(s)
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TronAddress({})", self.to_base58())
    }
}

impl Serialize for TronAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
