//! Learned classification indexes stored alongside the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient;

/// Multiset of labels: `label -> occurrences`. Counts are `> 0` once the
/// state has been normalized.
pub type Bag = BTreeMap<String, i64>;

/// Description to category associations used by the category predictor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredictionMapping {
    /// `description` or `description|amount.2f` -> category.
    #[serde(deserialize_with = "lenient::string_map")]
    pub exact: BTreeMap<String, String>,
    /// token -> categories seen with it.
    #[serde(deserialize_with = "lenient::bag_map")]
    pub tokens: BTreeMap<String, Bag>,
}

/// Secondary description/category co-occurrence index. Maintained and
/// merged, but not consulted by any predictor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DescriptionMap {
    /// lowercase description -> categories.
    #[serde(deserialize_with = "lenient::bag_map")]
    pub exact: BTreeMap<String, Bag>,
    /// category -> descriptions.
    #[serde(deserialize_with = "lenient::bag_map")]
    pub tokens: BTreeMap<String, Bag>,
}

/// Adds `by` to `index[key][label]`, saturating at the `i64` bounds.
pub fn increment(index: &mut BTreeMap<String, Bag>, key: &str, label: &str, by: i64) {
    let count = index
        .entry(key.to_string())
        .or_default()
        .entry(label.to_string())
        .or_insert(0);
    *count = count.saturating_add(by);
}

/// Folds `incoming` into `target`, summing counts per inner label.
/// Sums saturate instead of overflowing.
pub fn merge_bags(target: &mut BTreeMap<String, Bag>, incoming: &BTreeMap<String, Bag>) {
    for (key, bag) in incoming {
        let slot = target.entry(key.clone()).or_default();
        for (label, count) in bag {
            let total = slot.entry(label.clone()).or_insert(0);
            *total = total.saturating_add(*count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counts_instead_of_overwriting() {
        let mut target = BTreeMap::new();
        increment(&mut target, "tesco", "Food", 2);
        let mut incoming = BTreeMap::new();
        increment(&mut incoming, "tesco", "Food", 3);
        increment(&mut incoming, "tesco", "Fuel", 1);
        increment(&mut incoming, "shell", "Fuel", 1);

        merge_bags(&mut target, &incoming);

        assert_eq!(target["tesco"]["Food"], 5);
        assert_eq!(target["tesco"]["Fuel"], 1);
        assert_eq!(target["shell"]["Fuel"], 1);
    }

    #[test]
    fn huge_counts_saturate() {
        let mut target = BTreeMap::new();
        increment(&mut target, "tesco", "Food", i64::MAX);
        let incoming = target.clone();
        merge_bags(&mut target, &incoming);
        assert_eq!(target["tesco"]["Food"], i64::MAX);

        increment(&mut target, "tesco", "Food", 1);
        assert_eq!(target["tesco"]["Food"], i64::MAX);
    }
}
