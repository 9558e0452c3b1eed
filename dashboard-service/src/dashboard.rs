use std::path::{Path, PathBuf};

use asset_client::{
    domain::{DataSource, PreferencesPatch, TransformerRecord},
    view::{self, ChartData, SelectionState, SummaryStats, TableView},
};

use crate::{
    pipeline::{Dataset, IngestError, Pipeline, Source},
    sources::{SampleFileSource, UploadedContent, UploadedFileSource},
    state::AppState,
};

/// Status of the most recent load attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Handle for one load attempt. Only the latest ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// One open view of the dashboard: the loaded records, this view's
/// preferences and the load status.
pub struct Dashboard {
    state: AppState,
    records: Vec<TransformerRecord>,
    status: LoadStatus,
    latest_ticket: u64,
    sample_path: PathBuf,
}

impl Dashboard {
    pub fn new<P: Into<PathBuf>>(state: AppState, sample_path: P) -> Self {
        Self {
            state,
            records: Vec::new(),
            status: LoadStatus::Idle,
            latest_ticket: 0,
            sample_path: sample_path.into(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn records(&self) -> &[TransformerRecord] {
        &self.records
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn data_source(&self) -> DataSource {
        self.state.preferences().data_source
    }

    /// Finish initialisation and load the bundled sample when the persisted
    /// source is `sample` and nothing is loaded yet.
    pub async fn bootstrap(&mut self) -> &LoadStatus {
        if !self.state.is_ready() {
            self.state.initialize();
        }
        if self.data_source() == DataSource::Sample && self.records.is_empty() {
            self.load_sample().await;
        }
        &self.status
    }

    pub async fn load_sample(&mut self) -> &LoadStatus {
        let source = SampleFileSource::new(self.sample_path.clone());
        self.load_from(source).await
    }

    pub async fn load_upload<P: AsRef<Path>>(&mut self, path: P) -> &LoadStatus {
        self.load_from(UploadedFileSource::new(path.as_ref())).await
    }

    pub async fn load_upload_content(&mut self, file_name: &str, content: &str) -> &LoadStatus {
        self.load_from(UploadedContent::new(file_name, content)).await
    }

    pub async fn load_from<S: Source>(&mut self, source: S) -> &LoadStatus {
        let ticket = self.begin_load();
        let result = Pipeline::new(source).run().await;
        self.commit(ticket, result);
        &self.status
    }

    /// Start a load attempt, superseding any attempt still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        self.status = LoadStatus::Loading;
        metrics::counter!("dashboard_load_attempts_total").increment(1);
        LoadTicket(self.latest_ticket)
    }

    /// Commit the outcome of a load attempt. Results of superseded attempts
    /// are dropped and `false` is returned.
    ///
    /// On success the record set is replaced, every new asset is selected and
    /// the data source is recorded. On failure only the status changes.
    pub fn commit(&mut self, ticket: LoadTicket, result: Result<Dataset, IngestError>) -> bool {
        if ticket.0 != self.latest_ticket {
            metrics::counter!("dashboard_stale_loads_total").increment(1);
            tracing::info!(ticket = ticket.0, latest = self.latest_ticket, "discarding superseded load");
            return false;
        }

        match result {
            Ok(dataset) => {
                let selection = view::select_all(&dataset.records);
                tracing::info!(
                    source = dataset.source.as_str(),
                    records = dataset.records.len(),
                    loaded_at = %dataset.loaded_at,
                    "record set loaded"
                );
                self.records = dataset.records;
                self.state
                    .update(PreferencesPatch::selection(selection).with_source(dataset.source));
                self.status = LoadStatus::Success;
            }
            Err(e) => {
                metrics::counter!("dashboard_load_failures_total").increment(1);
                tracing::warn!(error = %e, "load failed, keeping previous records");
                self.status = LoadStatus::Error(e.to_string());
            }
        }
        true
    }

    /// Pick up preference changes made by other views.
    pub fn sync(&mut self) -> bool {
        self.state.sync()
    }

    /// Pick up preference changes written straight to storage.
    pub fn refresh(&mut self) -> bool {
        self.state.refresh()
    }

    pub fn table(&self) -> TableView<'_> {
        view::table_view(&self.records, self.state.preferences())
    }

    pub fn chart(&self) -> ChartData {
        view::chart_data(&self.records, &self.state.preferences().selected_transformers)
    }

    pub fn stats(&self) -> SummaryStats {
        view::summary_stats(&self.records)
    }

    /// Records whose chart lines are shown.
    pub fn eligible(&self) -> Vec<&TransformerRecord> {
        view::eligible(&self.records, &self.state.preferences().selected_transformers)
    }

    pub fn selection_state(&self) -> SelectionState {
        SelectionState::of(&self.records, &self.state.preferences().selected_transformers)
    }

    pub fn set_search(&mut self, term: &str) {
        self.state.update(PreferencesPatch::search(term));
    }

    pub fn set_region_filter(&mut self, value: &str) {
        self.state.update(PreferencesPatch::region(value));
    }

    pub fn set_health_filter(&mut self, value: &str) {
        self.state.update(PreferencesPatch::health(value));
    }

    pub fn toggle_transformer(&mut self, asset_id: i64, checked: bool) {
        let next = view::toggle(
            &self.records,
            &self.state.preferences().selected_transformers,
            asset_id,
            checked,
        );
        self.state.update(PreferencesPatch::selection(next));
    }

    pub fn select_all(&mut self, checked: bool) {
        let next = if checked {
            view::select_all(&self.records)
        } else {
            Default::default()
        };
        self.state.update(PreferencesPatch::selection(next));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::PreferenceStore;

    const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sampledata.json");

    const UPLOAD: &str = r#"[
        {"assetId": 10, "name": "Dock", "region": "West", "health": "Poor",
         "lastTenVoltageReadings": [{"timestamp": "2024-02-01T00:00:00Z", "voltage": "220"}]},
        {"assetId": 11, "name": "Ridge", "region": "West", "health": "Good",
         "lastTenVoltageReadings": []}
    ]"#;

    fn dashboard() -> Dashboard {
        let store = Arc::new(PreferenceStore::in_memory());
        Dashboard::new(AppState::new(store), SAMPLE)
    }

    #[tokio::test]
    async fn bootstrap_loads_sample_and_selects_everything() {
        let mut dash = dashboard();
        assert_eq!(dash.status(), &LoadStatus::Idle);

        assert_eq!(dash.bootstrap().await, &LoadStatus::Success);
        assert!(!dash.records().is_empty());
        assert_eq!(dash.selection_state(), SelectionState::All);
        assert_eq!(dash.data_source(), DataSource::Sample);
    }

    #[tokio::test]
    async fn bootstrap_skips_sample_when_upload_was_last_source() {
        let store = Arc::new(PreferenceStore::in_memory());
        let mut first = Dashboard::new(AppState::open(store.clone()), SAMPLE);
        first.load_upload_content("fleet.json", UPLOAD).await;

        let mut second = Dashboard::new(AppState::new(store), SAMPLE);
        assert_eq!(second.bootstrap().await, &LoadStatus::Idle);
        assert!(second.records().is_empty());
    }

    #[tokio::test]
    async fn upload_replaces_records_and_selection() {
        let mut dash = dashboard();
        dash.bootstrap().await;
        let first = dash.records()[0].asset_id;
        dash.toggle_transformer(first, false);

        assert_eq!(dash.load_upload_content("fleet.json", UPLOAD).await, &LoadStatus::Success);

        let prefs = dash.state().preferences();
        assert_eq!(prefs.data_source, DataSource::Uploaded);
        assert_eq!(prefs.selected_transformers.iter().copied().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(dash.stats().avg_voltage, Some(110));
    }

    #[tokio::test]
    async fn failed_upload_leaves_state_untouched() {
        let mut dash = dashboard();
        dash.bootstrap().await;
        dash.set_search("a");
        let records_before = dash.records().to_vec();
        let prefs_before = dash.state().preferences().clone();

        let status = dash.load_upload_content("fleet.json", r#"[{"assetId": 1}]"#).await;
        assert!(status.message().is_some_and(|m| m.contains("missing")));

        assert_eq!(dash.records(), records_before.as_slice());
        assert_eq!(dash.state().preferences(), &prefs_before);
    }

    #[tokio::test]
    async fn superseded_load_cannot_commit() {
        let mut dash = dashboard();
        let slow = dash.begin_load();
        let fast = dash.begin_load();
        assert!(dash.status().is_loading());

        let fast_result = Pipeline::new(UploadedContent::new("fleet.json", UPLOAD)).run().await;
        assert!(dash.commit(fast, fast_result));

        let slow_result = Pipeline::new(SampleFileSource::new(SAMPLE)).run().await;
        assert!(!dash.commit(slow, slow_result));

        assert_eq!(dash.records().len(), 2);
        assert_eq!(dash.data_source(), DataSource::Uploaded);
        assert_eq!(dash.status(), &LoadStatus::Success);
    }

    #[tokio::test]
    async fn interactions_persist_through_preferences() {
        let mut dash = dashboard();
        dash.load_upload_content("fleet.json", UPLOAD).await;

        dash.set_region_filter("West");
        dash.set_health_filter("Poor");
        assert_eq!(dash.table().shown(), 1);

        dash.set_health_filter("all");
        assert_eq!(dash.table().shown(), 2);

        dash.select_all(false);
        assert_eq!(dash.selection_state(), SelectionState::None);
        assert_eq!(dash.chart().visible_series().count(), 0);
        assert!(dash.eligible().is_empty());

        dash.toggle_transformer(11, true);
        assert_eq!(dash.selection_state(), SelectionState::Partial);

        let saved = dash.state().store().load().unwrap();
        assert_eq!(&saved, dash.state().preferences());
    }

    #[tokio::test]
    async fn unknown_asset_ids_never_enter_the_selection() {
        let mut dash = dashboard();
        dash.bootstrap().await;
        let loaded = view::select_all(dash.records());

        dash.toggle_transformer(999_999, true);

        let selected = &dash.state().preferences().selected_transformers;
        assert!(selected.is_subset(&loaded));
        assert_eq!(selected, &loaded);
        assert_eq!(dash.state().store().load().as_ref(), Some(dash.state().preferences()));
    }
}
