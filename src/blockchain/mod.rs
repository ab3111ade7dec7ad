//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! source node
//!     → client.rs (fetch raw transaction)
//!     → decoder.rs (advisory decode of the call data)
//!     → transaction.rs (rebuild on target, sign, broadcast, confirm)
//!     → target node
//! ```
//!
//! # Security Constraints
//! - Key material comes from an explicitly configured provider (wallet.rs)
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod address;
pub mod client;
pub mod decoder;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use address::TronAddress;
pub use client::{ChainClient, TronHttpClient};
pub use decoder::DecodedInvocation;
pub use transaction::{Broadcaster, SignedTransaction, TransactionRebuilder, UnsignedTransaction};
pub use types::{ChainError, RawTransaction};
pub use wallet::{KeyMaterial, KeyProvider, Wallet};
