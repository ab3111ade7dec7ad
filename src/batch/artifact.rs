//! Per-item audit artifacts.
//!
//! Each rebuilt transaction is written to `<dir>/<prefix>_<tag>.json` before
//! any signing decision, so the record exists in dry runs too.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::batch::types::ItemTag;
use crate::blockchain::decoder::DecodedInvocation;
use crate::blockchain::transaction::UnsignedTransaction;

/// Writes rebuilt transactions to disk.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    prefix: String,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the artifact for `tag`.
    pub fn path_for(&self, tag: &ItemTag) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.prefix, tag))
    }

    /// Persist the unsigned transaction, with decoded metadata when recognized.
    pub fn write(
        &self,
        tag: &ItemTag,
        unsigned: &UnsignedTransaction,
        decoded: &DecodedInvocation,
    ) -> std::io::Result<PathBuf> {
        let mut payload = unsigned.to_json();
        if decoded.is_recognized() {
            payload["decoded_info"] = serde_json::to_value(decoded)?;
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(tag);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, &payload)?;
        writer.flush()?;

        tracing::debug!(path = %path.display(), "Artifact written");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
