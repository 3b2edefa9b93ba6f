use std::sync::Arc;

use axum::Router;
use storefront_artifacts::{ArtifactError, ImageIndex, LoadReport, SharedArtifacts};
use storefront_core::config::AppConfig;
use storefront_core::RecommendationContext;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::cart::{CartStore, InMemoryCartStore};
use crate::health;

pub struct Application {
    pub config: AppConfig,
    pub context: RecommendationContext,
    pub report: Arc<LoadReport>,
    pub images: Arc<ImageIndex>,
    pub carts: Arc<dyn CartStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("artifact loading failed: {0}")]
    Artifacts(#[from] ArtifactError),
}

impl Application {
    pub fn router(&self) -> Router {
        let state = ApiState::new(
            self.context.clone(),
            Arc::clone(&self.images),
            Arc::clone(&self.carts),
        );
        api::router(state).merge(health::router(Arc::clone(&self.report)))
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        artifacts_dir = %config.artifacts.dir.display(),
        "starting application bootstrap"
    );

    let loaded = SharedArtifacts::new(config.artifacts.clone()).get().await?;
    let degraded: Vec<&str> =
        loaded.report.degraded().map(|outcome| outcome.kind.as_str()).collect();
    info!(
        event_name = "system.bootstrap.artifacts_loaded",
        correlation_id = "bootstrap",
        catalog_size = loaded.artifacts.catalog.len(),
        degraded = ?degraded,
        "artifacts loaded"
    );

    let images = index_images(&config).await;

    let context = RecommendationContext::new(Arc::clone(&loaded.artifacts), config.recommend.clone());
    Ok(Application {
        context,
        report: Arc::new(loaded.report.clone()),
        images: Arc::new(images),
        carts: Arc::new(InMemoryCartStore::new(config.server.max_cart_sessions)),
        config,
    })
}

/// Images are optional; an unreadable directory serves cards without them.
async fn index_images(config: &AppConfig) -> ImageIndex {
    let images_dir = config.artifacts.images_path();
    let scanned = tokio::task::spawn_blocking(move || ImageIndex::scan(&images_dir))
        .await
        .map_err(|error| ArtifactError::Task(error.to_string()))
        .and_then(|result| result);

    match scanned {
        Ok(index) => {
            info!(
                event_name = "system.bootstrap.images_indexed",
                correlation_id = "bootstrap",
                images = index.len(),
                "product images indexed"
            );
            index
        }
        Err(error) => {
            warn!(
                event_name = "system.bootstrap.images_unavailable",
                correlation_id = "bootstrap",
                error = %error,
                "product images unavailable"
            );
            ImageIndex::default()
        }
    }
}
