//! Prefix autocomplete over previously seen transaction descriptions.

use std::sync::Arc;

use crate::{core::StateStore, errors::Result, ledger::BudgetState};

/// Number of autocomplete entries returned when no limit is configured.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 4;

/// Prefix autocomplete over the descriptions seen so far.
#[derive(Clone)]
pub struct DescriptionPredictor {
    store: Arc<StateStore>,
    limit: usize,
}

impl DescriptionPredictor {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self::with_limit(store, DEFAULT_SUGGESTION_LIMIT)
    }

    pub fn with_limit(store: Arc<StateStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    pub fn suggest(&self, partial: &str) -> Vec<String> {
        self.suggest_with_limit(partial, self.limit)
    }

    pub fn suggest_with_limit(&self, partial: &str, limit: usize) -> Vec<String> {
        let snapshot = self.store.current_snapshot();
        suggest_in(&snapshot.desc_list, partial, limit)
    }

    /// Remembers `desc`. Skips the store entirely when nothing would change.
    pub fn learn(&self, desc: &str) -> Result<()> {
        if !is_new(&self.store.current_snapshot().desc_list, desc) {
            return Ok(());
        }
        self.store.transform(|state| {
            learn_into(state, desc);
        })?;
        Ok(())
    }
}

/// Entries of `descriptions` starting with `partial` (case-insensitive), in
/// stored order.
pub fn suggest_in(descriptions: &[String], partial: &str, limit: usize) -> Vec<String> {
    let prefix = partial.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    descriptions
        .iter()
        .filter(|entry| entry.to_lowercase().starts_with(&prefix))
        .take(limit)
        .cloned()
        .collect()
}

/// Appends the trimmed `desc` unless blank or already known. Returns whether
/// the list changed.
pub fn learn_into(state: &mut BudgetState, desc: &str) -> bool {
    if !is_new(&state.desc_list, desc) {
        return false;
    }
    state.desc_list.push(desc.trim().to_string());
    true
}

fn is_new(descriptions: &[String], desc: &str) -> bool {
    let trimmed = desc.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    !descriptions
        .iter()
        .any(|entry| entry.to_lowercase() == lowered)
}
