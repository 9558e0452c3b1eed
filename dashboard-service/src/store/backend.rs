use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::PathBuf,
    sync::Mutex,
};

use tempfile::NamedTempFile;

use super::StoreError;

/// Key/value string storage, scoped to one origin.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key under `dir`. Each write goes to its own uniquely named
/// temp file in `dir` that is renamed over the target, so readers see either
/// the old or the new blob and concurrent writers (in any process) never
/// share a temp path. The last rename wins.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_backend_roundtrips_and_reports_absent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("state"));

        assert_eq!(backend.get("prefs").unwrap(), None);
        backend.set("prefs", r#"{"searchTerm":"a"}"#).unwrap();
        backend.set("prefs", r#"{"searchTerm":"b"}"#).unwrap();
        assert_eq!(backend.get("prefs").unwrap().as_deref(), Some(r#"{"searchTerm":"b"}"#));
    }

    #[test]
    fn concurrent_file_writers_never_lose_a_write() {
        let dir = tempfile::tempdir().unwrap();
        let writers: Vec<_> = (0..2)
            .map(|w| {
                // Separate backends over one directory, like two processes.
                let backend = FileBackend::new(dir.path());
                std::thread::spawn(move || {
                    (0..200)
                        .filter(|i| {
                            let blob = format!(r#"{{"searchTerm":"w{w}-{i}"}}"#);
                            backend.set("prefs", &blob).is_err()
                        })
                        .count()
                })
            })
            .collect();

        let failed: usize = writers.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failed, 0);

        let blob = FileBackend::new(dir.path()).get("prefs").unwrap().unwrap();
        let last: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert!(last["searchTerm"].as_str().unwrap().ends_with("-199"));

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn memory_backend_keys_are_independent() {
        let backend = MemoryBackend::new();
        backend.set("a", "1").unwrap();
        assert_eq!(backend.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(backend.get("b").unwrap(), None);
    }
}
