//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → logging.rs (structured diagnostics via tracing, stderr)
//!     → audit.rs (append-only, timestamped audit lines)
//!     → notify.rs (optional webhook per broadcast outcome)
//! ```
//!
//! # Design Decisions
//! - The audit log is an injected sink, not a global file handle
//! - Key material never reaches any of the three outputs

pub mod audit;
pub mod logging;
pub mod notify;

pub use audit::{AuditSink, FileAuditLog, MemoryAuditLog};
pub use notify::WebhookNotifier;
