use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::{Iso8601, Rfc3339},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime,
};

/// A single voltage sample as delivered by the data file.
///
/// Both fields are kept verbatim; interpretation happens lazily through
/// [`VoltageReading::instant`] and [`VoltageReading::voltage_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoltageReading {
    pub timestamp: String,
    pub voltage: String,
}

impl VoltageReading {
    pub fn new(timestamp: impl Into<String>, voltage: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            voltage: voltage.into(),
        }
    }

    pub fn instant(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.timestamp)
    }

    pub fn voltage_value(&self) -> Option<i64> {
        parse_voltage(&self.voltage)
    }
}

/// One transformer asset and its recent voltage history.
///
/// Readings keep source order; the first element is the latest reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerRecord {
    pub asset_id: i64,
    pub name: String,
    pub region: String,
    pub health: String,
    #[serde(rename = "lastTenVoltageReadings", alias = "lastTenVoltgageReadings")]
    pub readings: Vec<VoltageReading>,
}

impl TransformerRecord {
    pub fn latest_reading(&self) -> Option<&VoltageReading> {
        self.readings.first()
    }

    pub fn health_status(&self) -> Option<HealthStatus> {
        HealthStatus::classify(&self.health)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    /// Case-insensitive mapping of a free-form health string.
    pub fn classify(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Excellent => Severity::Default,
            Self::Good => Severity::Secondary,
            Self::Fair => Severity::Outline,
            Self::Poor | Self::Critical => Severity::Destructive,
        }
    }
}

/// Badge variant used when rendering a health value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Default,
    Secondary,
    Outline,
    Destructive,
}

impl Severity {
    /// Unknown health strings render as `Outline`.
    pub fn for_health(raw: &str) -> Self {
        HealthStatus::classify(raw)
            .map(|h| h.severity())
            .unwrap_or(Severity::Outline)
    }
}

/// Parse an ISO-8601 timestamp into an absolute instant.
///
/// Accepts RFC 3339 and ISO-8601 strings with an offset. Strings without an
/// offset (date-time or bare date) are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    if let Ok(ts) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(ts);
    }
    if let Ok(ts) = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(ts.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Parse the leading integer of a voltage string (`"230.7 V"` -> 230).
///
/// Returns `None` when the string does not start with digits after an
/// optional sign. Digit runs beyond the `i64` range saturate to `i64::MAX`
/// or `i64::MIN`.
pub fn parse_voltage(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    match digits[..end].parse::<i64>() {
        Ok(value) if negative => Some(-value),
        Ok(value) => Some(value),
        Err(_) if negative => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}
