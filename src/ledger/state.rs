//! Root ledger aggregate, UI preferences and notes.

use std::{collections::BTreeMap, ops::Bound};

use serde::{Deserialize, Serialize};

use super::{lenient, BudgetMonth, DescriptionMap, PredictionMapping};

/// Schema version written by fresh installs.
pub const STATE_VERSION: i64 = 1;

/// Root aggregate persisted as one JSON document per installation.
///
/// Unknown fields are ignored and every field defaults, so older and newer
/// snapshots both load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BudgetState {
    #[serde(deserialize_with = "lenient::integer")]
    pub version: i64,
    pub months: BTreeMap<String, BudgetMonth>,
    pub mapping: PredictionMapping,
    pub desc_map: DescriptionMap,
    pub ui: UiPreferences,
    pub desc_list: Vec<String>,
    pub notes: Vec<Note>,
}

impl Default for BudgetState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            months: BTreeMap::new(),
            mapping: PredictionMapping::default(),
            desc_map: DescriptionMap::default(),
            ui: UiPreferences::default(),
            desc_list: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl BudgetState {
    pub fn month(&self, key: &str) -> Option<&BudgetMonth> {
        self.months.get(key)
    }

    pub fn month_mut(&mut self, key: &str) -> Option<&mut BudgetMonth> {
        self.months.get_mut(key)
    }

    pub fn latest_month_key(&self) -> Option<&str> {
        self.months.keys().next_back().map(String::as_str)
    }

    /// Returns the month for `key`, creating it first if needed. New months
    /// carry forward the categories of the latest month before `key`, or of
    /// the latest month overall when none precedes it.
    pub fn ensure_month(&mut self, key: &str) -> &mut BudgetMonth {
        if !self.months.contains_key(key) {
            let seed = self
                .months
                .range::<str, _>((Bound::Unbounded, Bound::Excluded(key)))
                .next_back()
                .or_else(|| self.months.iter().next_back())
                .map(|(_, month)| BudgetMonth::seeded_from(month))
                .unwrap_or_default();
            tracing::debug!(month = key, categories = seed.categories.len(), "seeded month");
            self.months.insert(key.to_string(), seed);
        }
        self.months.entry(key.to_string()).or_default()
    }

    /// Category names of `key`, or an empty list when the month is unknown.
    pub fn category_names(&self, key: &str) -> Vec<String> {
        self.month(key)
            .map(|month| month.categories.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn note(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }
}

/// Display preferences. Only `true` collapse flags are stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiPreferences {
    /// month key -> group name -> collapsed.
    pub collapsed: BTreeMap<String, BTreeMap<String, bool>>,
}

impl UiPreferences {
    pub fn is_collapsed(&self, month: &str, group: &str) -> bool {
        self.collapsed
            .get(month)
            .and_then(|groups| groups.get(group))
            .copied()
            .unwrap_or(false)
    }
}

/// Free-form note; `time` is a unix timestamp in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Note {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub desc: String,
    #[serde(deserialize_with = "lenient::text")]
    pub data: String,
    #[serde(deserialize_with = "lenient::integer")]
    pub time: i64,
}
