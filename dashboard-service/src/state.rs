use std::sync::Arc;

use asset_client::domain::{Preferences, PreferencesPatch};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::store::{PreferenceChange, PreferenceStore, ViewId};

/// In-memory preferences of one view, kept in step with the shared store.
///
/// State only changes through [`AppState::update`] (local edits, persisted
/// immediately) or through a change published by another view, which
/// replaces the local copy wholesale.
pub struct AppState {
    id: ViewId,
    store: Arc<PreferenceStore>,
    preferences: Preferences,
    ready: bool,
    changes: broadcast::Receiver<PreferenceChange>,
}

impl AppState {
    /// Subscribes immediately but starts from defaults and is not ready
    /// until [`AppState::initialize`] runs.
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        let changes = store.subscribe();
        Self {
            id: ViewId::next(),
            store,
            preferences: Preferences::default(),
            ready: false,
            changes,
        }
    }

    pub fn open(store: Arc<PreferenceStore>) -> Self {
        let mut state = Self::new(store);
        state.initialize();
        state
    }

    pub fn initialize(&mut self) {
        if let Some(saved) = self.store.load() {
            self.preferences = saved;
        }
        self.ready = true;
        tracing::debug!(view = ?self.id, "preferences ready");
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Preferences for data-dependent rendering; `None` until ready.
    pub fn ready_preferences(&self) -> Option<&Preferences> {
        self.ready.then_some(&self.preferences)
    }

    pub fn store(&self) -> &Arc<PreferenceStore> {
        &self.store
    }

    /// Merge `patch` field by field, persist the result and adopt it.
    pub fn update(&mut self, patch: PreferencesPatch) -> &Preferences {
        let next = self.preferences.clone().merged(patch);
        self.store.save(self.id, &next);
        self.preferences = next;
        &self.preferences
    }

    /// Replace local state with preferences written elsewhere.
    pub fn apply_external(&mut self, preferences: Preferences) {
        metrics::counter!("preferences_external_changes_total").increment(1);
        tracing::debug!(view = ?self.id, "applied external preference change");
        self.preferences = preferences;
    }

    /// Apply every pending change from other views. Returns whether local
    /// state was replaced.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(change) if change.origin == self.id => {}
                Ok(change) => {
                    self.apply_external(change.preferences);
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(view = ?self.id, skipped, "missed preference changes, reloading");
                    changed |= self.refresh();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        changed
    }

    /// Wait for the next change made by another view and adopt it.
    /// Returns `None` once the store is gone.
    pub async fn next_external_change(&mut self) -> Option<Preferences> {
        loop {
            match self.changes.recv().await {
                Ok(change) if change.origin == self.id => continue,
                Ok(change) => {
                    self.apply_external(change.preferences);
                    return Some(self.preferences.clone());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(view = ?self.id, skipped, "missed preference changes, reloading");
                    if self.refresh() {
                        return Some(self.preferences.clone());
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Re-read the store and adopt its contents when they differ. Picks up
    /// writes from other processes, which the broadcast never sees.
    pub fn refresh(&mut self) -> bool {
        match self.store.load() {
            Some(saved) if saved != self.preferences => {
                self.apply_external(saved);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_client::domain::DataSource;

    #[test]
    fn starts_with_defaults_until_initialized() {
        let store = Arc::new(PreferenceStore::in_memory());
        store.save(ViewId::next(), &Preferences::default().merged(PreferencesPatch::search("x")));

        let mut state = AppState::new(store);
        assert!(!state.is_ready());
        assert!(state.ready_preferences().is_none());
        assert_eq!(state.preferences().search_term, "");

        state.initialize();
        assert_eq!(state.ready_preferences().map(|p| p.search_term.as_str()), Some("x"));
    }

    #[test]
    fn update_merges_and_persists() {
        let store = Arc::new(PreferenceStore::in_memory());
        let mut state = AppState::open(store.clone());

        state.update(PreferencesPatch::search("foo"));
        state.update(PreferencesPatch::source(DataSource::Uploaded));

        let expected = Preferences {
            search_term: "foo".to_string(),
            data_source: DataSource::Uploaded,
            ..Preferences::default()
        };
        assert_eq!(state.preferences(), &expected);
        assert_eq!(store.load(), Some(expected));
    }

    #[test]
    fn own_writes_are_not_reapplied() {
        let store = Arc::new(PreferenceStore::in_memory());
        let mut state = AppState::open(store);
        state.update(PreferencesPatch::search("mine"));
        assert!(!state.sync());
        assert_eq!(state.preferences().search_term, "mine");
    }

    #[test]
    fn external_change_replaces_wholesale() {
        let store = Arc::new(PreferenceStore::in_memory());
        let mut a = AppState::open(store.clone());
        let mut b = AppState::open(store);

        b.update(PreferencesPatch::region("North"));
        a.update(PreferencesPatch::search("foo"));

        // `b` receives a's full state, dropping its own region filter.
        assert!(b.sync());
        assert_eq!(b.preferences().search_term, "foo");
        assert_eq!(b.preferences().region_filter, "");
    }

    #[test]
    fn lagging_view_reloads_from_store() {
        let store = Arc::new(PreferenceStore::new(
            crate::store::MemoryBackend::new(),
            "k",
            1,
        ));
        let mut reader = AppState::open(store.clone());
        let mut writer = AppState::open(store);

        writer.update(PreferencesPatch::search("one"));
        writer.update(PreferencesPatch::search("two"));
        writer.update(PreferencesPatch::search("three"));

        assert!(reader.sync());
        assert_eq!(reader.preferences().search_term, "three");
    }

    #[tokio::test]
    async fn awaits_changes_from_other_views() {
        let store = Arc::new(PreferenceStore::in_memory());
        let mut watcher = AppState::open(store.clone());
        let mut editor = AppState::open(store);

        editor.update(PreferencesPatch::health("Poor"));
        let seen = watcher.next_external_change().await.unwrap();
        assert_eq!(seen.health_filter, "Poor");
    }
}
