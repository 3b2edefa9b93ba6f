use std::sync::Arc;

use crate::artifacts::Artifacts;
use crate::catalog::Product;
use crate::config::RecommendConfig;
use crate::errors::DomainError;
use crate::ids::ItemId;
use crate::recommend::{self, AlsoBought, ExpansionOptions, Recommendations};
use crate::search;

/// Immutable application context built once at startup and shared by every
/// request. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct RecommendationContext {
    artifacts: Arc<Artifacts>,
    settings: RecommendConfig,
}

impl RecommendationContext {
    pub fn new(artifacts: Arc<Artifacts>, settings: RecommendConfig) -> Self {
        Self { artifacts, settings }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn settings(&self) -> &RecommendConfig {
        &self.settings
    }

    pub fn recommend(&self, user_id: &str, limit: usize) -> Recommendations {
        recommend::resolve(&self.artifacts, user_id, limit)
    }

    pub fn also_bought(&self, user_id: &str, limit: usize) -> AlsoBought {
        recommend::expand(
            &self.artifacts,
            user_id,
            limit,
            ExpansionOptions {
                partner_fill: self.settings.partner_fill,
                recommendation_pool: self.settings.default_limit,
            },
        )
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<ItemId> {
        search::search(&self.artifacts.catalog, query, limit)
    }

    pub fn product(&self, item: &ItemId) -> Option<&Product> {
        self.artifacts.catalog.get(item)
    }

    /// Apply the configured default and bounds to a caller-supplied limit.
    pub fn resolve_limit(
        &self,
        requested: Option<usize>,
        default: usize,
    ) -> Result<usize, DomainError> {
        let limit = requested.unwrap_or(default);
        if limit == 0 || limit > self.settings.max_limit {
            return Err(DomainError::InvalidLimit { requested: limit, max: self.settings.max_limit });
        }
        Ok(limit)
    }
}

/// Reject blank user ids. Non-blank ids pass through untouched; user ids are
/// opaque and matched as-is.
pub fn validate_user_id(user_id: &str) -> Result<&str, DomainError> {
    if user_id.trim().is_empty() {
        return Err(DomainError::EmptyUserId);
    }
    Ok(user_id)
}
