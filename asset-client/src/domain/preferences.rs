use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Where the currently loaded record set came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Sample,
    Uploaded,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Uploaded => "uploaded",
        }
    }
}

/// UI selection and filter state, persisted as a single JSON blob.
///
/// Missing fields deserialize to their defaults, unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub selected_transformers: BTreeSet<i64>,
    pub search_term: String,
    pub region_filter: String,
    pub health_filter: String,
    pub data_source: DataSource,
}

impl Preferences {
    /// Field-wise last-write-wins merge. Fields absent from `patch` are kept.
    pub fn merge(&mut self, patch: PreferencesPatch) {
        if let Some(selected) = patch.selected_transformers {
            self.selected_transformers = selected;
        }
        if let Some(term) = patch.search_term {
            self.search_term = term;
        }
        if let Some(region) = patch.region_filter {
            self.region_filter = region;
        }
        if let Some(health) = patch.health_filter {
            self.health_filter = health;
        }
        if let Some(source) = patch.data_source {
            self.data_source = source;
        }
    }

    pub fn merged(mut self, patch: PreferencesPatch) -> Self {
        self.merge(patch);
        self
    }
}

/// Partial update of [`Preferences`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub selected_transformers: Option<BTreeSet<i64>>,
    pub search_term: Option<String>,
    pub region_filter: Option<String>,
    pub health_filter: Option<String>,
    pub data_source: Option<DataSource>,
}

impl PreferencesPatch {
    pub fn selection<I: IntoIterator<Item = i64>>(ids: I) -> Self {
        Self {
            selected_transformers: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn region(value: &str) -> Self {
        Self {
            region_filter: Some(normalize_filter(value)),
            ..Self::default()
        }
    }

    pub fn health(value: &str) -> Self {
        Self {
            health_filter: Some(normalize_filter(value)),
            ..Self::default()
        }
    }

    pub fn source(source: DataSource) -> Self {
        Self {
            data_source: Some(source),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.data_source = Some(source);
        self
    }
}

/// Selector value `all` means "no constraint" and is stored as the empty string.
pub fn normalize_filter(value: &str) -> String {
    if value == "all" {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_present_fields() {
        let mut prefs = Preferences {
            search_term: "north".to_string(),
            region_filter: "North".to_string(),
            ..Preferences::default()
        };

        prefs.merge(PreferencesPatch::health("Critical"));

        assert_eq!(prefs.search_term, "north");
        assert_eq!(prefs.region_filter, "North");
        assert_eq!(prefs.health_filter, "Critical");
        assert_eq!(prefs.data_source, DataSource::Sample);
    }

    #[test]
    fn all_sentinel_clears_filter() {
        let prefs = Preferences {
            region_filter: "South".to_string(),
            ..Preferences::default()
        }
        .merged(PreferencesPatch::region("all"));
        assert_eq!(prefs.region_filter, "");
    }

    #[test]
    fn blob_uses_camel_case_and_tolerates_missing_fields() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"searchTerm":"foo","legacyField":true}"#).unwrap();
        assert_eq!(prefs.search_term, "foo");
        assert!(prefs.selected_transformers.is_empty());
        assert_eq!(prefs.data_source, DataSource::Sample);

        let blob = serde_json::to_value(Preferences::default().merged(
            PreferencesPatch::selection([2, 1]).with_source(DataSource::Uploaded),
        ))
        .unwrap();
        assert_eq!(blob["selectedTransformers"], serde_json::json!([1, 2]));
        assert_eq!(blob["dataSource"], "uploaded");
    }
}
