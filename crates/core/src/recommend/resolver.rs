use serde::Serialize;

use super::scorer::try_score_user;
use crate::artifacts::Artifacts;
use crate::ids::ItemId;

/// The tier that answered a recommendation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Precomputed,
    LatentFactor,
    Popularity,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Precomputed => "precomputed",
            Self::LatentFactor => "latent_factor",
            Self::Popularity => "popularity",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub items: Vec<ItemId>,
    pub source: RecommendationSource,
}

/// Resolve up to `limit` recommendations through the fallback chain.
pub fn resolve(artifacts: &Artifacts, user_id: &str, limit: usize) -> Recommendations {
    // A precomputed entry wins outright, even when its list is empty.
    if let Some(candidates) = artifacts.candidates.get(user_id) {
        return Recommendations {
            items: candidates.iter().take(limit).cloned().collect(),
            source: RecommendationSource::Precomputed,
        };
    }

    match try_score_user(artifacts, user_id, true, limit) {
        Ok(items) if !items.is_empty() => {
            Recommendations { items, source: RecommendationSource::LatentFactor }
        }
        // Every scored item was a recent purchase; keep them out of the fallback too.
        Ok(_) => {
            let recent = artifacts
                .user_summaries
                .get(user_id)
                .map(|summary| summary.last_items.as_slice())
                .unwrap_or_default();
            Recommendations {
                items: artifacts.catalog.head_excluding(limit, recent),
                source: RecommendationSource::Popularity,
            }
        }
        Err(_) => Recommendations {
            items: artifacts.catalog.head(limit),
            source: RecommendationSource::Popularity,
        },
    }
}

/// Up to `limit` recommended item ids for `user_id`. Never fails.
pub fn recommend(artifacts: &Artifacts, user_id: &str, limit: usize) -> Vec<ItemId> {
    resolve(artifacts, user_id, limit).items
}
