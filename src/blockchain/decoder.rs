//! Call data decoding for the token methods operators care about.
//!
//! # Responsibilities
//! - Recognize `transfer`, `approve` and `transferFrom` by 4-byte selector
//! - Extract their parameters from fixed 32-byte words
//!
//! # Design Decisions
//! - Decoding is advisory: the result is attached to output, never used
//!   to rebuild the call
//! - Unknown selectors and short payloads are `Unrecognized`, not errors
//! - A known selector with too few parameter words is a degradation
//!   (`DecodeError`); trailing bytes past the last word are ignored

use alloy::hex;
use alloy::primitives::U256;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::blockchain::address::TronAddress;

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// `transferFrom(address,address,uint256)`
pub const TRANSFER_FROM_SELECTOR: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

const WORD: usize = 32;

/// Failure to decode the parameters of a recognized method.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{method}: parameters are not valid hex")]
    InvalidHex { method: &'static str },

    #[error("{method}: expected {expected} parameter bytes, got {actual}")]
    Truncated {
        method: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// The decoded meaning of a call payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method")]
pub enum DecodedInvocation {
    #[serde(rename = "transfer")]
    Transfer {
        recipient: TronAddress,
        #[serde(rename = "amount_sun", serialize_with = "serialize_decimal")]
        amount: U256,
    },
    #[serde(rename = "approve")]
    Approve {
        spender: TronAddress,
        #[serde(rename = "amount_sun", serialize_with = "serialize_decimal")]
        amount: U256,
    },
    #[serde(rename = "transferFrom")]
    TransferFrom {
        from: TronAddress,
        to: TronAddress,
        #[serde(rename = "amount_sun", serialize_with = "serialize_decimal")]
        amount: U256,
    },
    #[serde(rename = "unrecognized")]
    Unrecognized,
}

impl DecodedInvocation {
    /// Method name, or `None` when unrecognized.
    pub fn method(&self) -> Option<&'static str> {
        match self {
            Self::Transfer { .. } => Some("transfer"),
            Self::Approve { .. } => Some("approve"),
            Self::TransferFrom { .. } => Some("transferFrom"),
            Self::Unrecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

// 256-bit amounts do not fit a JSON number.
fn serialize_decimal<S: Serializer>(amount: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
}

/// Decode a hex payload, reporting degradations of recognized methods.
///
/// Returns `Ok(Unrecognized)` for empty payloads, payloads without a full
/// selector, and unknown selectors.
pub fn try_decode(payload: &str) -> Result<DecodedInvocation, DecodeError> {
    let payload = payload.trim();
    let payload = payload.strip_prefix("0x").unwrap_or(payload);

    let Some(selector_hex) = payload.get(..8) else {
        return Ok(DecodedInvocation::Unrecognized);
    };
    let mut selector = [0u8; 4];
    if hex::decode_to_slice(selector_hex, &mut selector).is_err() {
        return Ok(DecodedInvocation::Unrecognized);
    }

    let (method, words) = match selector {
        TRANSFER_SELECTOR => ("transfer", 2),
        APPROVE_SELECTOR => ("approve", 2),
        TRANSFER_FROM_SELECTOR => ("transferFrom", 3),
        _ => return Ok(DecodedInvocation::Unrecognized),
    };

    let params = hex::decode(&payload[8..]).map_err(|_| DecodeError::InvalidHex { method })?;
    let expected = words * WORD;
    if params.len() < expected {
        return Err(DecodeError::Truncated {
            method,
            expected,
            actual: params.len(),
        });
    }

    let word = |i: usize| -> [u8; WORD] {
        let mut out = [0u8; WORD];
        out.copy_from_slice(&params[i * WORD..(i + 1) * WORD]);
        out
    };

    let invocation = match selector {
        TRANSFER_SELECTOR => DecodedInvocation::Transfer {
            recipient: TronAddress::from_word(&word(0)),
            amount: U256::from_be_bytes(word(1)),
        },
        APPROVE_SELECTOR => DecodedInvocation::Approve {
            spender: TronAddress::from_word(&word(0)),
            amount: U256::from_be_bytes(word(1)),
        },
        _ => DecodedInvocation::TransferFrom {
            from: TronAddress::from_word(&word(0)),
            to: TronAddress::from_word(&word(1)),
            amount: U256::from_be_bytes(word(2)),
        },
    };

    Ok(invocation)
}

/// Decode a hex payload; never fails.
///
/// Degradations are logged and collapse to `Unrecognized`.
pub fn decode(payload: &str) -> DecodedInvocation {
    try_decode(payload).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Call data decode degraded to unrecognized");
        DecodedInvocation::Unrecognized
    })
}
