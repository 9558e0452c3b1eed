use std::collections::BTreeSet;

use crate::domain::{Preferences, TransformerRecord};

/// The three table constraints. Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter<'a> {
    pub search_term: &'a str,
    pub region_filter: &'a str,
    pub health_filter: &'a str,
}

impl<'a> From<&'a Preferences> for TableFilter<'a> {
    fn from(prefs: &'a Preferences) -> Self {
        Self {
            search_term: &prefs.search_term,
            region_filter: &prefs.region_filter,
            health_filter: &prefs.health_filter,
        }
    }
}

impl TableFilter<'_> {
    pub fn matches(&self, record: &TransformerRecord) -> bool {
        self.matches_lowered(record, &self.search_term.to_lowercase())
    }

    /// `needle` is the search term, already lowercased.
    fn matches_lowered(&self, record: &TransformerRecord, needle: &str) -> bool {
        let matches_search = needle.is_empty()
            || record.name.to_lowercase().contains(needle)
            || record.region.to_lowercase().contains(needle)
            || record.health.to_lowercase().contains(needle);

        let matches_region = self.region_filter.is_empty() || record.region == self.region_filter;
        let matches_health = self.health_filter.is_empty() || record.health == self.health_filter;

        matches_search && matches_region && matches_health
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView<'a> {
    /// Sorted distinct regions of the full record set.
    pub regions: Vec<String>,
    /// Sorted distinct health values of the full record set.
    pub health_statuses: Vec<String>,
    /// Matching records in input order.
    pub rows: Vec<&'a TransformerRecord>,
    pub total: usize,
}

impl TableView<'_> {
    pub fn shown(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sorted distinct `(regions, health values)` present in `records`.
pub fn facets(records: &[TransformerRecord]) -> (Vec<String>, Vec<String>) {
    let regions: BTreeSet<&str> = records.iter().map(|r| r.region.as_str()).collect();
    let health: BTreeSet<&str> = records.iter().map(|r| r.health.as_str()).collect();
    (
        regions.into_iter().map(str::to_string).collect(),
        health.into_iter().map(str::to_string).collect(),
    )
}

pub fn filter_records<'a>(
    records: &'a [TransformerRecord],
    filter: &TableFilter<'_>,
) -> Vec<&'a TransformerRecord> {
    let needle = filter.search_term.to_lowercase();
    records
        .iter()
        .filter(|r| filter.matches_lowered(r, &needle))
        .collect()
}

pub fn table_view<'a>(records: &'a [TransformerRecord], prefs: &Preferences) -> TableView<'a> {
    let (regions, health_statuses) = facets(records);
    TableView {
        regions,
        health_statuses,
        rows: filter_records(records, &TableFilter::from(prefs)),
        total: records.len(),
    }
}
