//! Batch processing subsystem.
//!
//! # Data Flow
//! ```text
//! tx id(s) from the command line or a batch file
//!     → types.rs (WorkItem, tagged "single" or 1-based index)
//!     → orchestrator.rs (fetch → extract → rebuild → persist → sign → broadcast)
//!     → artifact.rs (one JSON file per rebuilt transaction)
//!     → ItemReport per item, in input order
//! ```

pub mod artifact;
pub mod orchestrator;
pub mod types;

pub use artifact::ArtifactWriter;
pub use orchestrator::{extract, BatchOrchestrator, ExtractedCall};
pub use types::{
    BatchResult, CloneError, FailureClass, ItemReport, ItemTag, RunOptions, Stage, WorkItem,
};
