use std::sync::Arc;

use thiserror::Error;

use crate::ledger::BudgetState;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unrecognised import payload: {0}")]
    InvalidImport(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    /// The transform was applied and published in memory, but writing it to
    /// durable storage failed. `snapshot` is the state that is now current.
    #[error("snapshot applied in memory but not persisted: {source}")]
    NotPersisted {
        snapshot: Arc<BudgetState>,
        #[source]
        source: Box<LedgerError>,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Returns the in-memory snapshot carried by a persistence failure.
    pub fn unpersisted_snapshot(&self) -> Option<&Arc<BudgetState>> {
        match self {
            LedgerError::NotPersisted { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}
