use std::sync::Mutex;

use crate::{
    errors::{LedgerError, Result},
    ledger::BudgetState,
};

use super::SnapshotStorage;

/// Keeps the serialized snapshot in process memory. Used for ephemeral
/// sessions and tests; behaves like the JSON file backend, bytes included.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from previously serialized bytes (which need not be valid JSON).
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }

    /// Copy of the stored bytes, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes.lock().ok().and_then(|guard| guard.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Vec<u8>>>> {
        self.bytes
            .lock()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".into()))
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load_snapshot(&self) -> Result<Option<BudgetState>> {
        let guard = self.lock()?;
        match guard.as_deref() {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, state: &BudgetState) -> Result<()> {
        let bytes = serde_json::to_vec(state)?;
        *self.lock()? = Some(bytes);
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaves_like_a_file() {
        let storage = MemoryStorage::new();
        assert!(storage.load_snapshot().unwrap().is_none());

        let state = BudgetState {
            desc_list: vec!["Tesco".into()],
            ..BudgetState::default()
        };
        storage.save_snapshot(&state).unwrap();
        assert_eq!(storage.load_snapshot().unwrap(), Some(state));

        storage.reset().unwrap();
        assert!(storage.bytes().is_none());
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        let storage = MemoryStorage::from_bytes("{oops");
        assert!(storage.load_snapshot().is_err());
    }
}
