use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    errors::Result,
    ledger::BudgetState,
    utils::persistence::write_atomic,
};

use super::SnapshotStorage;

/// Filesystem-backed JSON persistence for the ledger snapshot.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStorage {
    path: PathBuf,
}

impl JsonSnapshotStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        Self::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonSnapshotStorage {
    fn load_snapshot(&self) -> Result<Option<BudgetState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_state_from_path(&self.path).map(Some)
    }

    fn save_snapshot(&self, state: &BudgetState) -> Result<()> {
        save_state_to_path(state, &self.path)
    }

    fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Saves a snapshot, pretty-printed, to an arbitrary path.
pub fn save_state_to_path(state: &BudgetState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    write_atomic(path, json.as_bytes())
}

pub fn load_state_from_path(path: &Path) -> Result<BudgetState> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
