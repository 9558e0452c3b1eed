pub mod preferences;
pub mod transformer;

pub use preferences::{normalize_filter, DataSource, Preferences, PreferencesPatch};
pub use transformer::{
    parse_timestamp, parse_voltage, HealthStatus, Severity, TransformerRecord, VoltageReading,
};
