//! Durable snapshot backends.

pub mod json_backend;
pub mod memory;

use crate::{errors::Result, ledger::BudgetState};

/// Abstraction over persistence backends holding the single ledger snapshot.
pub trait SnapshotStorage: Send + Sync {
    /// Reads the stored snapshot. `Ok(None)` means nothing has been stored yet.
    fn load_snapshot(&self) -> Result<Option<BudgetState>>;

    fn save_snapshot(&self, state: &BudgetState) -> Result<()>;

    /// Discards the durable copy; the next load starts from defaults.
    fn reset(&self) -> Result<()>;
}

pub use json_backend::JsonSnapshotStorage;
pub use memory::MemoryStorage;
