use std::collections::BTreeSet;

use asset_client::domain::{TransformerRecord, VoltageReading};
use serde_json::{Map, Value};

use crate::pipeline::{Envelope, IngestError, Transform};

/// Canonical name of the readings array.
pub const READINGS_FIELD: &str = "lastTenVoltageReadings";
/// Misspelled name found in older data files; accepted on every path.
pub const LEGACY_READINGS_FIELD: &str = "lastTenVoltgageReadings";

const STRUCTURE_HINT: &str = "each transformer must have assetId, name, region, health, \
and a lastTenVoltageReadings array with timestamp and voltage fields";

pub fn decode_json(env: Envelope<Vec<u8>>) -> Result<Envelope<Value>, IngestError> {
    let value: Value = serde_json::from_slice(&env.payload)
        .map_err(|e| IngestError::Parse(format!("Failed to parse JSON: {e}")))?;
    Ok(env.map(|_| value))
}

/// Shape checks for a raw record array.
///
/// Rules:
/// - the top-level value is an array;
/// - every element has an integer `assetId` and non-empty `name`, `region`
///   and `health` strings;
/// - every element has a readings array, each reading carrying a non-empty
///   `timestamp` and a `voltage` (string or number);
/// - `assetId` values are unique.
pub fn validate_records(value: &Value) -> Result<Vec<TransformerRecord>, IngestError> {
    let items = value
        .as_array()
        .ok_or_else(|| IngestError::Validation("Data must be an array of transformers".to_string()))?;

    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let record = validate_record(item).map_err(|detail| {
            IngestError::Validation(format!(
                "Invalid transformer data structure at index {idx}: {detail}; {STRUCTURE_HINT}"
            ))
        })?;

        if !seen.insert(record.asset_id) {
            return Err(IngestError::Validation(format!(
                "Duplicate assetId {} at index {idx}",
                record.asset_id
            )));
        }
        records.push(record);
    }

    Ok(records)
}

fn validate_record(item: &Value) -> Result<TransformerRecord, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?;

    let asset_id = obj
        .get("assetId")
        .and_then(Value::as_i64)
        .ok_or_else(|| "missing or non-integer assetId".to_string())?;

    let readings = obj
        .get(READINGS_FIELD)
        .or_else(|| obj.get(LEGACY_READINGS_FIELD))
        .and_then(Value::as_array)
        .ok_or_else(|| format!("missing {READINGS_FIELD} array"))?
        .iter()
        .enumerate()
        .map(|(pos, r)| validate_reading(r).map_err(|detail| format!("reading {pos}: {detail}")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransformerRecord {
        asset_id,
        name: required_text(obj, "name")?,
        region: required_text(obj, "region")?,
        health: required_text(obj, "health")?,
        readings,
    })
}

fn validate_reading(reading: &Value) -> Result<VoltageReading, String> {
    let obj = reading
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?;

    let timestamp = required_text(obj, "timestamp")?;
    let voltage = match obj.get("voltage") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err("missing voltage".to_string()),
    };

    Ok(VoltageReading { timestamp, voltage })
}

fn required_text(obj: &Map<String, Value>, field: &str) -> Result<String, String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(format!("missing {field}")),
    }
}

#[derive(Clone, Copy, Default)]
pub struct JsonDecode;

#[async_trait::async_trait]
impl Transform<Vec<u8>, Value> for JsonDecode {
    async fn apply(&self, input: Envelope<Vec<u8>>) -> Result<Envelope<Value>, IngestError> {
        decode_json(input)
    }
}

#[derive(Clone, Copy, Default)]
pub struct RecordValidation;

#[async_trait::async_trait]
impl Transform<Value, Vec<TransformerRecord>> for RecordValidation {
    async fn apply(
        &self,
        input: Envelope<Value>,
    ) -> Result<Envelope<Vec<TransformerRecord>>, IngestError> {
        match validate_records(&input.payload) {
            Ok(records) => Ok(input.map(|_| records)),
            Err(e) => {
                metrics::counter!("validation_records_rejected_total").increment(1);
                tracing::warn!(source = input.source.as_str(), error = %e, "record set rejected");
                Err(e)
            }
        }
    }
}
