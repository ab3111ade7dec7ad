//! Batch item identifiers, outcomes and errors.

use std::fmt;

use thiserror::Error;

use crate::blockchain::address::AddressError;
use crate::blockchain::decoder::DecodedInvocation;
use crate::blockchain::transaction::{BroadcastError, RebuildError, SignError};
use crate::blockchain::types::ChainError;

/// Label of one processed item; names its artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemTag {
    /// The only item of a `--txid` run.
    Single,
    /// 1-based position in a batch file.
    Batch(usize),
}

impl fmt::Display for ItemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Batch(index) => write!(f, "{}", index),
        }
    }
}

/// One transaction id to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub tag: ItemTag,
    pub tx_id: String,
}

impl WorkItem {
    pub fn single(tx_id: impl Into<String>) -> Self {
        Self {
            tag: ItemTag::Single,
            tx_id: tx_id.into(),
        }
    }

    /// Number batch ids from 1, ignoring blank lines.
    pub fn batch_from_lines(contents: &str) -> Vec<Self> {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, tx_id)| Self {
                tag: ItemTag::Batch(i + 1),
                tx_id: tx_id.to_string(),
            })
            .collect()
    }
}

/// Pipeline stage that stopped an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Rebuild,
    Persist,
    Sign,
    Broadcast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Rebuild => "rebuild",
            Self::Persist => "persist",
            Self::Sign => "sign",
            Self::Broadcast => "broadcast",
        };
        f.write_str(name)
    }
}

/// Why a broadcast failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Reported by the chain.
    Rejected,
    /// Network or unexpected failure.
    Transport,
}

/// Recorded outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    Skipped { stage: Stage, reason: String },
    DryRun,
    BroadcastOk { confirmation_id: String },
    BroadcastFailed { class: FailureClass, reason: String },
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::DryRun | Self::BroadcastOk { .. })
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { stage, reason } => write!(f, "skipped at {}: {}", stage, reason),
            Self::DryRun => f.write_str("dry run, unsigned transaction saved"),
            Self::BroadcastOk { confirmation_id } => {
                write!(f, "Broadcast success. Mainnet txID: {}", confirmation_id)
            }
            Self::BroadcastFailed {
                class: FailureClass::Rejected,
                reason,
            } => write!(f, "Failed to broadcast: {}", reason),
            Self::BroadcastFailed {
                class: FailureClass::Transport,
                reason,
            } => write!(f, "Unexpected error during broadcast: {}", reason),
        }
    }
}

/// Per-item report, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub tag: ItemTag,
    pub tx_id: String,
    /// Advisory decode of the source payload; `Unrecognized` if never fetched.
    pub decoded: DecodedInvocation,
    pub result: BatchResult,
}

/// Call envelope and mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub fee_limit: u64,
    pub call_value: u64,
    pub dry_run: bool,
}

/// Item-level failures. None of them escape the orchestrator.
#[derive(Debug, Error)]
pub enum CloneError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] ChainError),

    #[error("unsupported contract type '{0}'")]
    UnsupportedContract(String),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {source}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        source: AddressError,
    },

    #[error("call data is not valid hex")]
    InvalidPayload,

    #[error(transparent)]
    Rebuild(#[from] RebuildError),

    #[error("failed to write artifact: {0}")]
    Persist(#[from] std::io::Error),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

impl CloneError {
    /// Stage the error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::UnsupportedContract(_)
            | Self::MissingField(_)
            | Self::InvalidAddress { .. }
            | Self::InvalidPayload => Stage::Extract,
            Self::Rebuild(_) => Stage::Rebuild,
            Self::Persist(_) => Stage::Persist,
            Self::Sign(_) => Stage::Sign,
            Self::Broadcast(_) => Stage::Broadcast,
        }
    }

    /// Convert into the recorded outcome.
    pub fn into_result(self) -> BatchResult {
        match self {
            Self::Broadcast(BroadcastError::Rejected(reason)) => BatchResult::BroadcastFailed {
                class: FailureClass::Rejected,
                reason,
            },
            Self::Broadcast(BroadcastError::Transport(reason)) => BatchResult::BroadcastFailed {
                class: FailureClass::Transport,
                reason,
            },
            other => BatchResult::Skipped {
                stage: other.stage(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display() {
        assert_eq!(ItemTag::Single.to_string(), "single");
        assert_eq!(ItemTag::Batch(3).to_string(), "3");
    }

    #[test]
    fn test_batch_from_lines_skips_blanks() {
        let items = WorkItem::batch_from_lines("aa\n\n  bb  \n\ncc\n");
        let ids: Vec<&str> = items.iter().map(|i| i.tx_id.as_str()).collect();
        assert_eq!(ids, vec!["aa", "bb", "cc"]);
        assert_eq!(items[2].tag, ItemTag::Batch(3));
    }

    #[test]
    fn test_error_to_result() {
        let result = CloneError::Fetch(ChainError::NotFound("aa".to_string())).into_result();
        assert!(matches!(result, BatchResult::Skipped { stage: Stage::Fetch, .. }));

        let result = CloneError::MissingField("owner_address").into_result();
        assert_eq!(
            result,
            BatchResult::Skipped {
                stage: Stage::Extract,
                reason: "missing owner_address".to_string()
            }
        );

        let result = CloneError::Broadcast(BroadcastError::Rejected("SIGERROR: x".to_string()))
            .into_result();
        assert_eq!(
            result,
            BatchResult::BroadcastFailed {
                class: FailureClass::Rejected,
                reason: "SIGERROR: x".to_string()
            }
        );
    }

    #[test]
    fn test_result_display() {
        let ok = BatchResult::BroadcastOk {
            confirmation_id: "ff".to_string(),
        };
        assert_eq!(ok.to_string(), "Broadcast success. Mainnet txID: ff");
        assert!(ok.is_success());
        assert!(!BatchResult::BroadcastFailed {
            class: FailureClass::Transport,
            reason: "timeout".to_string()
        }
        .is_success());
    }
}
