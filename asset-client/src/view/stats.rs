use std::collections::BTreeSet;

use crate::domain::TransformerRecord;

/// Health value counted as critical. Compared case-sensitively, unlike the
/// table search.
pub const CRITICAL_HEALTH: &str = "Critical";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryStats {
    pub total: usize,
    pub critical: usize,
    pub regions: usize,
    /// Rounded mean of each record's latest voltage; `None` for an empty set.
    pub avg_voltage: Option<i64>,
}

/// Headline figures for the stat cards.
///
/// The voltage average divides by the total record count: records without
/// readings (or with an unparsable latest voltage) contribute zero.
pub fn summary_stats(records: &[TransformerRecord]) -> SummaryStats {
    let total = records.len();
    let critical = records
        .iter()
        .filter(|r| r.health == CRITICAL_HEALTH)
        .count();
    let regions = records
        .iter()
        .map(|r| r.region.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let avg_voltage = if total == 0 {
        None
    } else {
        // i128 holds the sum of any number of i64 voltages we could load.
        let sum: i128 = records
            .iter()
            .filter_map(|r| r.latest_reading())
            .filter_map(|reading| reading.voltage_value())
            .map(i128::from)
            .sum();
        Some(round_half_up(sum as f64 / total as f64))
    };

    SummaryStats {
        total,
        critical,
        regions,
        avg_voltage,
    }
}

/// Saturates at the `i64` bounds.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VoltageReading;

    fn record(asset_id: i64, region: &str, health: &str, voltages: &[&str]) -> TransformerRecord {
        TransformerRecord {
            asset_id,
            name: format!("T{asset_id}"),
            region: region.to_string(),
            health: health.to_string(),
            readings: voltages
                .iter()
                .enumerate()
                .map(|(i, v)| VoltageReading::new(format!("2024-01-0{}T00:00:00Z", 9 - i), *v))
                .collect(),
        }
    }

    #[test]
    fn two_record_scenario() {
        let records = vec![
            record(1, "North", "Critical", &["100"]),
            record(2, "South", "Good", &["200"]),
        ];
        let stats = summary_stats(&records);
        assert_eq!(
            stats,
            SummaryStats {
                total: 2,
                critical: 1,
                regions: 2,
                avg_voltage: Some(150),
            }
        );
    }

    #[test]
    fn average_uses_latest_reading_only() {
        let records = vec![record(1, "North", "Good", &["240", "100", "100"])];
        assert_eq!(summary_stats(&records).avg_voltage, Some(240));
    }

    #[test]
    fn critical_count_is_case_sensitive() {
        let records = vec![
            record(1, "North", "Critical", &["1"]),
            record(2, "North", "critical", &["1"]),
            record(3, "North", "CRITICAL", &["1"]),
        ];
        let stats = summary_stats(&records);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.regions, 1);
    }

    #[test]
    fn records_without_readings_still_count_in_denominator() {
        let records = vec![
            record(1, "North", "Good", &["101"]),
            record(2, "South", "Good", &[]),
        ];
        // 101 / 2 = 50.5, rounded half up.
        assert_eq!(summary_stats(&records).avg_voltage, Some(51));
    }

    #[test]
    fn huge_voltages_do_not_overflow_the_average() {
        let records = vec![
            record(1, "North", "Good", &["9223372036854775807"]),
            record(2, "North", "Good", &["9223372036854775807"]),
        ];
        assert_eq!(summary_stats(&records).avg_voltage, Some(i64::MAX));

        let mixed = vec![
            record(1, "North", "Good", &["9223372036854775807"]),
            record(2, "North", "Good", &["-9223372036854775807"]),
        ];
        assert_eq!(summary_stats(&mixed).avg_voltage, Some(0));
    }

    #[test]
    fn empty_set_has_no_average() {
        let stats = summary_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_voltage, None);
    }
}
