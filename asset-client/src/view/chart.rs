use std::collections::{BTreeMap, BTreeSet};

use time::{macros::format_description, OffsetDateTime};

use crate::domain::{parse_timestamp, TransformerRecord};

/// Line colours, assigned by record index and cycled.
pub const SERIES_COLOURS: [&str; 8] = [
    "#8884d8", "#82ca9d", "#ffc658", "#ff7300", "#00ff00", "#ff00ff", "#00ffff", "#ff0000",
];

/// One line on the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub asset_id: i64,
    pub name: String,
    pub colour: &'static str,
    /// Selected for display. Values are computed regardless.
    pub visible: bool,
}

/// One x-axis point. `values[i]` belongs to `ChartData::series[i]`; `None`
/// marks a gap that the line skips over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRow {
    pub timestamp: String,
    pub instant: Option<OffsetDateTime>,
    pub label: String,
    pub values: Vec<Option<i64>>,
}

impl ChartRow {
    /// Value of the series at `idx`, `None` when out of range or a gap.
    pub fn value(&self, idx: usize) -> Option<i64> {
        self.values.get(idx).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartData {
    pub series: Vec<Series>,
    pub rows: Vec<ChartRow>,
}

impl ChartData {
    pub fn timestamps(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.timestamp.as_str()).collect()
    }

    pub fn visible_series(&self) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(|s| s.visible)
    }

    /// Column index of the series named `name`.
    pub fn series_index(&self, name: &str) -> Option<usize> {
        self.series.iter().position(|s| s.name == name)
    }

    /// Values of the series named `name`, one per row.
    pub fn column(&self, name: &str) -> Option<Vec<Option<i64>>> {
        let idx = self.series_index(name)?;
        Some(self.rows.iter().map(|r| r.value(idx)).collect())
    }
}

/// Row identity: the parsed instant, or the raw string when unparsable.
/// Parsed instants order before raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey<'a> {
    At(OffsetDateTime),
    Raw(&'a str),
}

impl<'a> RowKey<'a> {
    fn of(raw: &'a str) -> Self {
        parse_timestamp(raw).map_or(Self::Raw(raw), Self::At)
    }
}

/// Merge every record's readings into one time-ordered matrix.
///
/// Rows are the distinct instants across all records, in ascending order, so
/// `...T00:00:00Z` and `...T02:00:00+02:00` share one row. A row keeps the
/// lexically smallest of its timestamp strings. Strings that cannot be parsed
/// get a row each, after all parsed ones.
pub fn chart_data(records: &[TransformerRecord], selected: &BTreeSet<i64>) -> ChartData {
    let series = records
        .iter()
        .enumerate()
        .map(|(idx, r)| Series {
            asset_id: r.asset_id,
            name: r.name.clone(),
            colour: SERIES_COLOURS[idx % SERIES_COLOURS.len()],
            visible: selected.contains(&r.asset_id),
        })
        .collect();

    let mut keys: BTreeMap<RowKey<'_>, &str> = BTreeMap::new();
    // Per record, first reading wins when two share an instant.
    let mut columns: Vec<BTreeMap<RowKey<'_>, Option<i64>>> = Vec::with_capacity(records.len());
    for record in records {
        let mut column = BTreeMap::new();
        for reading in &record.readings {
            let raw = reading.timestamp.as_str();
            let key = RowKey::of(raw);
            keys.entry(key)
                .and_modify(|kept| *kept = (*kept).min(raw))
                .or_insert(raw);
            column.entry(key).or_insert_with(|| reading.voltage_value());
        }
        columns.push(column);
    }

    let rows = keys
        .into_iter()
        .map(|(key, timestamp)| {
            let instant = match key {
                RowKey::At(_) => parse_timestamp(timestamp),
                RowKey::Raw(_) => None,
            };
            ChartRow {
                timestamp: timestamp.to_string(),
                instant,
                label: axis_label(instant, timestamp),
                values: columns
                    .iter()
                    .map(|column| column.get(&key).copied().flatten())
                    .collect(),
            }
        })
        .collect();

    ChartData { series, rows }
}

/// Short `D Mon` axis label, e.g. `2 Jan`.
fn axis_label(instant: Option<OffsetDateTime>, raw: &str) -> String {
    instant
        .and_then(|ts| {
            ts.format(format_description!("[day padding:none] [month repr:short]"))
                .ok()
        })
        .unwrap_or_else(|| raw.to_string())
}
