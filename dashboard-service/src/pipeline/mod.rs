use std::time::SystemTime;

use asset_client::domain::{DataSource, TransformerRecord};
use time::OffsetDateTime;

use crate::transform::{JsonDecode, RecordValidation};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub source: DataSource,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, source: DataSource) -> Self {
        Self {
            payload,
            source,
            received_at: SystemTime::now(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            payload: f(self.payload),
            source: self.source,
            received_at: self.received_at,
        }
    }
}

/// Ingestion failures. The display text is the message shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Fetch(String),
}

#[async_trait::async_trait]
pub trait Source: Send + Sync {
    fn kind(&self) -> DataSource;

    async fn fetch(&self) -> Result<Envelope<Vec<u8>>, IngestError>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, IngestError>;
}

/// A validated record set, replacing whatever was loaded before.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<TransformerRecord>,
    pub source: DataSource,
    pub loaded_at: OffsetDateTime,
}

/// Fetch, decode and validate. Every source goes through the same two
/// transforms, so sample and uploaded data obey identical rules.
pub struct Pipeline<S> {
    pub source: S,
    decode: JsonDecode,
    validate: RecordValidation,
}

impl<S: Source> Pipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            decode: JsonDecode,
            validate: RecordValidation,
        }
    }

    pub async fn run(&self) -> Result<Dataset, IngestError> {
        let raw = self.source.fetch().await?;
        let value = self.decode.apply(raw).await?;
        let records = self.validate.apply(value).await?;

        let elapsed_ms = records
            .received_at
            .elapsed()
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        tracing::info!(
            source = records.source.as_str(),
            records = records.payload.len(),
            elapsed_ms,
            "record set ingested"
        );
        metrics::counter!("dashboard_records_loaded_total").increment(records.payload.len() as u64);

        Ok(Dataset {
            records: records.payload,
            source: records.source,
            loaded_at: OffsetDateTime::now_utc(),
        })
    }
}
