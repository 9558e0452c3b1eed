//! Persisted preferences: one JSON blob under a fixed key, plus an in-process
//! broadcast so every open view learns about each write.

pub mod backend;

use std::sync::atomic::{AtomicU64, Ordering};

use asset_client::domain::{DataSource, Preferences};
use serde_json::Value;
use tokio::sync::broadcast;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

pub const DEFAULT_STORAGE_KEY: &str = "transformer-app-state";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Identity of one logical view (a browser tab, a window, a CLI run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Notification sent after every successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceChange {
    pub origin: ViewId,
    pub preferences: Preferences,
}

pub struct PreferenceStore {
    backend: Box<dyn StorageBackend>,
    key: String,
    tx: broadcast::Sender<PreferenceChange>,
}

impl PreferenceStore {
    pub fn new<B>(backend: B, key: impl Into<String>, channel_capacity: usize) -> Self
    where
        B: StorageBackend + 'static,
    {
        let (tx, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            backend: Box::new(backend),
            key: key.into(),
            tx,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new(), DEFAULT_STORAGE_KEY, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last saved preferences, or `None` when nothing usable is stored.
    /// Read failures and corrupt blobs are logged and reported as `None`.
    pub fn load(&self) -> Option<Preferences> {
        let blob = match self.backend.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                metrics::counter!("preferences_store_errors_total").increment(1);
                tracing::warn!(key = %self.key, error = %e, "failed to read preferences");
                return None;
            }
        };

        let prefs = decode_preferences(&blob);
        if prefs.is_none() {
            metrics::counter!("preferences_store_errors_total").increment(1);
            tracing::warn!(key = %self.key, "stored preferences are corrupt, using defaults");
        }
        prefs
    }

    /// Persist `prefs` and notify subscribers. A failed write is logged and
    /// nobody is notified.
    pub fn save(&self, origin: ViewId, prefs: &Preferences) {
        if let Err(e) = self.try_save(prefs) {
            metrics::counter!("preferences_store_errors_total").increment(1);
            tracing::warn!(key = %self.key, error = %e, "failed to save preferences");
            return;
        }

        metrics::counter!("preferences_saved_total").increment(1);
        // No receivers is fine; nobody else is open.
        let _ = self.tx.send(PreferenceChange {
            origin,
            preferences: prefs.clone(),
        });
    }

    pub fn try_save(&self, prefs: &Preferences) -> Result<(), StoreError> {
        let blob = serde_json::to_string(prefs)?;
        self.backend.set(&self.key, &blob)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.tx.subscribe()
    }
}

/// Decode a stored blob.
///
/// A blob written by another schema version still yields preferences: each
/// known field is read on its own and anything missing or ill-typed falls
/// back to its default. Only a blob that is not a JSON object is rejected.
pub fn decode_preferences(blob: &str) -> Option<Preferences> {
    let value: Value = serde_json::from_str(blob).ok()?;
    let obj = value.as_object()?;

    if let Ok(prefs) = serde_json::from_value::<Preferences>(value.clone()) {
        return Some(prefs);
    }

    let text = |field: &str| {
        obj.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };

    Some(Preferences {
        selected_transformers: obj
            .get("selectedTransformers")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default(),
        search_term: text("searchTerm"),
        region_filter: text("regionFilter"),
        health_filter: text("healthFilter"),
        data_source: match obj.get("dataSource").and_then(Value::as_str) {
            Some("uploaded") => DataSource::Uploaded,
            _ => DataSource::Sample,
        },
    })
}
