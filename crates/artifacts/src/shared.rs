use std::sync::Arc;

use storefront_core::artifacts::Artifacts;
use storefront_core::config::ArtifactsConfig;
use tokio::sync::OnceCell;

use crate::error::ArtifactError;
use crate::loader::{load_all, LoadReport};

#[derive(Debug)]
pub struct LoadedArtifacts {
    pub artifacts: Arc<Artifacts>,
    pub report: LoadReport,
}

/// Loads the artifact set at most once per handle. Concurrent first callers wait
/// on the same load; the file reads run on the blocking pool.
#[derive(Debug)]
pub struct SharedArtifacts {
    config: ArtifactsConfig,
    cell: OnceCell<Arc<LoadedArtifacts>>,
}

impl SharedArtifacts {
    pub fn new(config: ArtifactsConfig) -> Self {
        Self { config, cell: OnceCell::new() }
    }

    pub fn config(&self) -> &ArtifactsConfig {
        &self.config
    }

    pub async fn get(&self) -> Result<Arc<LoadedArtifacts>, ArtifactError> {
        let loaded = self
            .cell
            .get_or_try_init(|| async {
                let config = self.config.clone();
                let (artifacts, report) = tokio::task::spawn_blocking(move || load_all(&config))
                    .await
                    .map_err(|error| ArtifactError::Task(error.to_string()))?;
                Ok::<_, ArtifactError>(Arc::new(LoadedArtifacts {
                    artifacts: Arc::new(artifacts),
                    report,
                }))
            })
            .await?;
        Ok(Arc::clone(loaded))
    }

    /// The loaded set, if a previous `get` completed.
    pub fn loaded(&self) -> Option<Arc<LoadedArtifacts>> {
        self.cell.get().cloned()
    }
}
