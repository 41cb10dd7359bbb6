//! Reconciliation of two independently edited snapshots.

use std::collections::{BTreeMap, HashSet};

use crate::ledger::{prediction::merge_bags, BudgetState, Note};

/// Folds `incoming` into `current`:
///
/// * `version` becomes the larger of the two;
/// * each incoming month replaces the current month wholesale;
/// * exact category mappings are overwritten key by key;
/// * token bags and description bags are summed;
/// * descriptions are unioned, current entries first;
/// * notes are unioned by id, keeping the later `time` on collisions.
///
/// UI preferences stay as they are on the receiving side. The result still
/// has to go through the normalizer.
pub fn merge_snapshots(current: &mut BudgetState, incoming: BudgetState) {
    let BudgetState {
        version,
        months,
        mapping,
        desc_map,
        ui: _,
        desc_list,
        notes,
    } = incoming;

    current.version = current.version.max(version);
    current.months.extend(months);

    current.mapping.exact.extend(mapping.exact);
    merge_bags(&mut current.mapping.tokens, &mapping.tokens);
    merge_bags(&mut current.desc_map.exact, &desc_map.exact);
    merge_bags(&mut current.desc_map.tokens, &desc_map.tokens);

    let mut known: HashSet<String> = current
        .desc_list
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .collect();
    for entry in desc_list {
        if known.insert(entry.trim().to_lowercase()) {
            current.desc_list.push(entry);
        }
    }

    current.notes = union_notes(std::mem::take(&mut current.notes), notes);
}

fn union_notes(current: Vec<Note>, incoming: Vec<Note>) -> Vec<Note> {
    let mut by_id: BTreeMap<i64, Note> = BTreeMap::new();
    for note in current.into_iter().chain(incoming) {
        match by_id.get(&note.id) {
            Some(existing) if existing.time >= note.time => {}
            _ => {
                by_id.insert(note.id, note);
            }
        }
    }
    let mut notes: Vec<Note> = by_id.into_values().collect();
    notes.sort_by(|a, b| b.time.cmp(&a.time));
    notes
}
