//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line overrides (fee limit, call value, key source)
//!     → CloneConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow running without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_overrides, load_config, ConfigError, Overrides};
pub use schema::{
    BroadcastConfig, CallDefaults, CloneConfig, KeyConfig, KeySource, NetworkConfig,
    NotificationConfig, ObservabilityConfig, OutputConfig,
};
