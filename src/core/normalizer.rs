//! Integrity rules applied after every mutation and every load.
//!
//! [`normalize`] is idempotent: running it on its own output changes nothing.

use std::collections::{BTreeMap, HashSet};

use crate::ledger::{
    Bag, BudgetMonth, BudgetState, Category, DescriptionMap, Note, PredictionMapping,
    UiPreferences, DEFAULT_GROUP,
};

/// Returns `state` with all ledger invariants enforced:
///
/// * free text (`name`, `desc`, `category`, `group`) is trimmed;
/// * non-finite amounts become `0`;
/// * blank groups become [`DEFAULT_GROUP`];
/// * bag counts `<= 0` are dropped (and bags left empty with them);
/// * exact prediction entries pointing at a blank category are dropped;
/// * `desc_list` is unique case-insensitively, first occurrence wins;
/// * `ui.collapsed` holds only `true` flags and no empty months;
/// * notes are ordered by `time`, newest first.
pub fn normalize(mut state: BudgetState) -> BudgetState {
    let months = std::mem::take(&mut state.months);
    state.months = months
        .into_iter()
        .map(|(key, month)| (key, normalize_month(month)))
        .collect();
    normalize_mapping(&mut state.mapping);
    normalize_desc_map(&mut state.desc_map);
    state.desc_list = unique_descriptions(std::mem::take(&mut state.desc_list));
    normalize_ui(&mut state.ui);
    normalize_notes(&mut state.notes);
    state
}

/// Coerces NaN and infinities to `0`.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn normalize_month(mut month: BudgetMonth) -> BudgetMonth {
    for income in &mut month.incomes {
        trim_in_place(&mut income.name);
        income.amount = finite_or_zero(income.amount);
    }
    for txn in &mut month.transactions {
        trim_in_place(&mut txn.desc);
        trim_in_place(&mut txn.category);
        txn.amount = finite_or_zero(txn.amount);
    }
    let mut categories = BTreeMap::new();
    for (name, category) in month.categories {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        categories
            .entry(name.to_string())
            .or_insert_with(|| normalize_category(category));
    }
    month.categories = categories;
    month
}

fn normalize_category(mut category: Category) -> Category {
    trim_in_place(&mut category.group);
    if category.group.is_empty() {
        category.group = DEFAULT_GROUP.to_string();
    }
    category.budget = finite_or_zero(category.budget);
    category
}

fn normalize_mapping(mapping: &mut PredictionMapping) {
    let exact = std::mem::take(&mut mapping.exact);
    mapping.exact = exact
        .into_iter()
        .filter_map(|(key, category)| {
            let category = category.trim();
            (!category.is_empty()).then(|| (key, category.to_string()))
        })
        .collect();
    normalize_bag_index(&mut mapping.tokens);
}

fn normalize_desc_map(desc_map: &mut DescriptionMap) {
    normalize_bag_index(&mut desc_map.exact);
    normalize_bag_index(&mut desc_map.tokens);
}

fn normalize_bag_index(index: &mut BTreeMap<String, Bag>) {
    let raw = std::mem::take(index);
    for (key, bag) in raw {
        let mut cleaned = Bag::new();
        for (label, count) in bag {
            let total = cleaned.entry(label.trim().to_string()).or_insert(0);
            *total = total.saturating_add(count);
        }
        cleaned.retain(|label, count| !label.is_empty() && *count > 0);
        if !cleaned.is_empty() {
            index.insert(key, cleaned);
        }
    }
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the
/// first spelling seen.
pub fn unique_descriptions(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter_map(|entry| {
            let trimmed = entry.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn normalize_ui(ui: &mut UiPreferences) {
    ui.collapsed.retain(|_, groups| {
        groups.retain(|_, collapsed| *collapsed);
        !groups.is_empty()
    });
}

fn normalize_notes(notes: &mut [Note]) {
    for note in notes.iter_mut() {
        trim_in_place(&mut note.desc);
    }
    notes.sort_by(|a, b| b.time.cmp(&a.time));
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
