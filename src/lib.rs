//! TRON transaction cloning library.

pub mod batch;
pub mod blockchain;
pub mod config;
pub mod observability;

pub use batch::{BatchOrchestrator, BatchResult, ItemReport};
pub use config::schema::CloneConfig;
