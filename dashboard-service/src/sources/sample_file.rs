use std::path::PathBuf;

use asset_client::domain::DataSource;

use crate::pipeline::{Envelope, IngestError, Source};

/// The bundled sample data set, read from a fixed path.
pub struct SampleFileSource {
    path: PathBuf,
}

impl SampleFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source for SampleFileSource {
    fn kind(&self) -> DataSource {
        DataSource::Sample
    }

    async fn fetch(&self) -> Result<Envelope<Vec<u8>>, IngestError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "sample data unavailable");
            IngestError::Fetch(format!("Failed to load sample data: {e}"))
        })?;
        Ok(Envelope::new(bytes, self.kind()))
    }
}
