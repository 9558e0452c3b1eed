use std::path::{Path, PathBuf};

use asset_client::domain::DataSource;

use crate::pipeline::{Envelope, IngestError, Source};

fn ensure_json_name(name: &str) -> Result<(), IngestError> {
    let is_json = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(())
    } else {
        Err(IngestError::Validation("Please select a JSON file".to_string()))
    }
}

/// A user-selected `.json` file on disk.
pub struct UploadedFileSource {
    path: PathBuf,
}

impl UploadedFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source for UploadedFileSource {
    fn kind(&self) -> DataSource {
        DataSource::Uploaded
    }

    async fn fetch(&self) -> Result<Envelope<Vec<u8>>, IngestError> {
        ensure_json_name(&self.path.to_string_lossy())?;
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "uploaded file unreadable");
            IngestError::Fetch(format!("Failed to read file: {e}"))
        })?;
        Ok(Envelope::new(bytes, self.kind()))
    }
}

/// Upload whose content has already been read, e.g. handed over by a UI.
pub struct UploadedContent {
    file_name: String,
    content: String,
}

impl UploadedContent {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

#[async_trait::async_trait]
impl Source for UploadedContent {
    fn kind(&self) -> DataSource {
        DataSource::Uploaded
    }

    async fn fetch(&self) -> Result<Envelope<Vec<u8>>, IngestError> {
        ensure_json_name(&self.file_name)?;
        Ok(Envelope::new(self.content.clone().into_bytes(), self.kind()))
    }
}
