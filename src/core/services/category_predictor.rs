//! Free-text -> category suggestions learned from past classifications.
//!
//! Lookups go from most to least specific: description plus amount,
//! description alone, then summed token votes. Learning writes all three
//! indexes (and the description index used for autocomplete) in one
//! store transform.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    core::{services::description_predictor, StateStore},
    errors::Result,
    ledger::{prediction::increment, BudgetState, PredictionMapping, Transaction},
};

/// Store-bound category predictor.
#[derive(Clone)]
pub struct CategoryPredictor {
    store: Arc<StateStore>,
}

impl CategoryPredictor {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Suggests a category for `desc` among `known` categories, using the
    /// latest snapshot. `None` when nothing matches.
    pub fn predict<S: AsRef<str>>(
        &self,
        desc: &str,
        known: &[S],
        amount: Option<f64>,
    ) -> Option<String> {
        let snapshot = self.store.current_snapshot();
        predict_in(&snapshot.mapping, desc, known, amount)
    }

    /// Records that `desc` (optionally at `amount`) belongs to `category`.
    pub fn learn(&self, desc: &str, category: &str, amount: Option<f64>) -> Result<()> {
        if desc.trim().is_empty() || category.trim().is_empty() {
            return Ok(());
        }
        self.store
            .transform(|state| learn_into(state, desc, category, amount))?;
        Ok(())
    }

    /// Learns from a booked transaction; uncategorised entries only feed
    /// description autocomplete.
    pub fn record_transaction(&self, txn: &Transaction) -> Result<()> {
        if txn.desc.trim().is_empty() {
            return Ok(());
        }
        self.store.transform(|state| record_into(state, txn))?;
        Ok(())
    }

    /// Explicit user override, independent of the amount.
    pub fn pin_mapping(&self, desc: &str, category: &str) -> Result<()> {
        if desc.trim().is_empty() {
            return Ok(());
        }
        self.store.transform(|state| {
            learn_into(state, desc, category, None);
            description_predictor::learn_into(state, desc);
        })?;
        Ok(())
    }
}

/// Pure lookup against a mapping snapshot.
pub fn predict_in<S: AsRef<str>>(
    mapping: &PredictionMapping,
    desc: &str,
    known: &[S],
    amount: Option<f64>,
) -> Option<String> {
    let base = desc.trim().to_lowercase();
    if base.is_empty() {
        return None;
    }
    let is_known = |category: &str| known.iter().any(|k| k.as_ref() == category);

    if let Some(amount) = amount.filter(|value| value.is_finite()) {
        if let Some(category) = mapping.exact.get(&amount_key(&base, amount)) {
            if is_known(category) {
                return Some(category.clone());
            }
        }
    }
    if let Some(category) = mapping.exact.get(&base) {
        if is_known(category) {
            return Some(category.clone());
        }
    }

    let mut scores: BTreeMap<&str, i64> = BTreeMap::new();
    for token in tokenize(&base) {
        if let Some(bag) = mapping.tokens.get(&token) {
            for (category, count) in bag {
                *scores.entry(category.as_str()).or_insert(0) += count;
            }
        }
    }
    // Ascending name order plus a strict comparison keeps the smallest
    // name among tied scores.
    let mut best: Option<(&str, i64)> = None;
    for (category, score) in scores {
        if !is_known(category) {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((category, score));
        }
    }
    best.map(|(category, _)| category.to_string())
}

/// Applies one learning step to `state`. No-op for blank input.
pub fn learn_into(state: &mut BudgetState, desc: &str, category: &str, amount: Option<f64>) {
    let desc = desc.trim();
    let category = category.trim();
    if desc.is_empty() || category.is_empty() {
        return;
    }
    let base = desc.to_lowercase();
    let key = match amount.filter(|value| value.is_finite()) {
        Some(amount) => amount_key(&base, amount),
        None => base.clone(),
    };
    state.mapping.exact.insert(key, category.to_string());
    for token in tokenize(&base) {
        increment(&mut state.mapping.tokens, &token, category, 1);
    }
    increment(&mut state.desc_map.tokens, category, desc, 1);
    increment(&mut state.desc_map.exact, &base, category, 1);
    description_predictor::learn_into(state, desc);
}

/// Learning step for a booked transaction.
pub fn record_into(state: &mut BudgetState, txn: &Transaction) {
    if txn.category.trim().is_empty() {
        description_predictor::learn_into(state, &txn.desc);
    } else {
        learn_into(state, &txn.desc, &txn.category, Some(txn.amount));
    }
}

/// `description|12.50`. Negative zero prints as `0.00`.
pub fn amount_key(base: &str, amount: f64) -> String {
    let amount = if amount == 0.0 { 0.0 } else { amount };
    format!("{base}|{amount:.2}")
}

/// Lowercases, turns everything outside `[a-z0-9]` and whitespace into
/// spaces, and splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}
