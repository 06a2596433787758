//! Append-only transaction ledger
//!
//! Every submitted trade is appended once its settlement is known (or known to
//! be unknown). Entries are never edited or removed here; the dashboard reads
//! the same store without writing to it.
//!
//! Single-writer: no cross-process locking is applied.

mod entry;
mod file;

pub use entry::{ether_string, LedgerEntry};
pub use file::JsonFileLedger;

use crate::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, entry: &LedgerEntry) -> Result<()>;

    /// All entries in insertion order, oldest first
    async fn read_all(&self) -> Result<Vec<LedgerEntry>>;
}

/// Volatile ledger for tests and dry runs
#[derive(Default)]
pub struct InMemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries.read().await.clone())
    }
}
