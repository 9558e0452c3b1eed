use serde::Deserialize;
use std::{fs, path::PathBuf, sync::Arc};

use crate::store::{FileBackend, PreferenceStore, DEFAULT_CHANNEL_CAPACITY, DEFAULT_STORAGE_KEY};

pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "dashboard-config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
    pub key: String,
    pub channel_capacity: usize,
    /// How often `dashboard --watch` re-reads the stored blob.
    pub poll_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".dashboard-state"),
            key: DEFAULT_STORAGE_KEY.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            poll_interval_ms: 1000,
        }
    }
}

impl StorageConfig {
    pub fn open_store(&self) -> Arc<PreferenceStore> {
        Arc::new(PreferenceStore::new(
            FileBackend::new(&self.dir),
            self.key.clone(),
            self.channel_capacity,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub path: PathBuf,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/sampledata.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sample: SampleConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Read the TOML file named by `DASHBOARD_CONFIG`, else
    /// `dashboard-config.toml`. Without the variable a missing default file
    /// means built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = match env::var(CONFIG_ENV) {
            Ok(path) => path,
            Err(_) => {
                if !PathBuf::from(DEFAULT_CONFIG_PATH).exists() {
                    tracing::info!("no {DEFAULT_CONFIG_PATH} found, using defaults");
                    return Ok(Self::default());
                }
                DEFAULT_CONFIG_PATH.to_string()
            }
        };
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {path}: {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.storage.key, "transformer-app-state");
        assert_eq!(cfg.storage.channel_capacity, 64);
        assert_eq!(cfg.storage.poll_interval_ms, 1000);
        assert_eq!(cfg.sample.path, PathBuf::from("data/sampledata.json"));
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [storage]
            dir = "/var/lib/dashboard"

            [sample]
            path = "public/sampledata.json"

            [metrics]
            bind_addr = "127.0.0.1:9464"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage.dir, PathBuf::from("/var/lib/dashboard"));
        assert_eq!(cfg.storage.key, "transformer-app-state");
        assert_eq!(cfg.sample.path, PathBuf::from("public/sampledata.json"));
        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9464");
    }
}
