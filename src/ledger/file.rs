//! JSON-file ledger shared with the dashboard
//!
//! The file holds a single pretty-printed JSON array. Appends rewrite the whole
//! array through a sibling temp file and a rename, so a reader never observes a
//! half-written file.

use super::{LedgerEntry, LedgerStore};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonFileLedger {
    path: PathBuf,
    /// Serializes read-modify-write within this process
    write_lock: Mutex<()>,
}

impl JsonFileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<Vec<LedgerEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        // A corrupt ledger is an error, never silently replaced
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        entries.push(entry.clone());

        let json = serde_json::to_string_pretty(&entries)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            tx_hash = %entry.hash,
            entries = entries.len(),
            "Appended ledger entry"
        );
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LedgerEntry>> {
        self.load().await
    }
}
