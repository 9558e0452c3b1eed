use std::collections::BTreeSet;

use crate::domain::TransformerRecord;

/// State of the "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    All,
    Partial,
    None,
}

impl SelectionState {
    /// Only ids that belong to `records` are counted.
    pub fn of(records: &[TransformerRecord], selected: &BTreeSet<i64>) -> Self {
        let count = records
            .iter()
            .filter(|r| selected.contains(&r.asset_id))
            .count();
        if !records.is_empty() && count == records.len() {
            SelectionState::All
        } else if count > 0 {
            SelectionState::Partial
        } else {
            SelectionState::None
        }
    }
}

pub fn select_all(records: &[TransformerRecord]) -> BTreeSet<i64> {
    records.iter().map(|r| r.asset_id).collect()
}

/// Check or uncheck one record. The result only holds ids present in
/// `records`: unknown ids are ignored and stale ones are dropped.
pub fn toggle(
    records: &[TransformerRecord],
    selected: &BTreeSet<i64>,
    asset_id: i64,
    checked: bool,
) -> BTreeSet<i64> {
    let loaded = select_all(records);
    let mut next: BTreeSet<i64> = selected.intersection(&loaded).copied().collect();
    if checked && loaded.contains(&asset_id) {
        next.insert(asset_id);
    } else if !checked {
        next.remove(&asset_id);
    }
    next
}

/// Records whose lines are visible on the chart, in record order.
pub fn eligible<'a>(
    records: &'a [TransformerRecord],
    selected: &BTreeSet<i64>,
) -> Vec<&'a TransformerRecord> {
    records
        .iter()
        .filter(|r| selected.contains(&r.asset_id))
        .collect()
}
