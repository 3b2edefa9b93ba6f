use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storefront_core::artifacts::{Artifacts, ArtifactsBuilder};
use storefront_core::config::ArtifactsConfig;
use tracing::{info, warn};

use crate::catalog::load_catalog;
use crate::error::ArtifactError;
use crate::tables::{load_candidates, load_co_purchase, load_model, load_user_summaries};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Catalog,
    Model,
    CoPurchase,
    Candidates,
    UserSummaries,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] =
        [Self::Catalog, Self::Model, Self::CoPurchase, Self::Candidates, Self::UserSummaries];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Model => "model",
            Self::CoPurchase => "co_purchase",
            Self::Candidates => "candidates",
            Self::UserSummaries => "user_summaries",
        }
    }

    pub fn path(&self, config: &ArtifactsConfig) -> PathBuf {
        match self {
            Self::Catalog => config.catalog_path(),
            Self::Model => config.model_path(),
            Self::CoPurchase => config.co_purchase_path(),
            Self::Candidates => config.candidates_path(),
            Self::UserSummaries => config.user_summary_path(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Loaded { records: usize },
    Missing,
    Failed { error: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct ArtifactOutcome {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub status: ArtifactStatus,
    pub elapsed_ms: u64,
}

impl ArtifactOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, ArtifactStatus::Loaded { .. })
    }
}

/// Per-artifact outcome of one load pass.
#[derive(Clone, Debug, Serialize)]
pub struct LoadReport {
    pub loaded_at: DateTime<Utc>,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl LoadReport {
    pub fn outcome(&self, kind: ArtifactKind) -> Option<&ArtifactOutcome> {
        self.outcomes.iter().find(|outcome| outcome.kind == kind)
    }

    pub fn is_loaded(&self, kind: ArtifactKind) -> bool {
        self.outcome(kind).is_some_and(ArtifactOutcome::is_loaded)
    }

    pub fn all_loaded(&self) -> bool {
        self.outcomes.iter().all(ArtifactOutcome::is_loaded)
    }

    /// Artifacts that are serving as empty tables.
    pub fn degraded(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_loaded())
    }
}

/// Load every configured artifact. Never fails: problems are recorded in the report
/// and the affected table stays empty.
pub fn load_all(config: &ArtifactsConfig) -> (Artifacts, LoadReport) {
    let mut builder = Artifacts::builder();
    let mut outcomes = Vec::with_capacity(ArtifactKind::ALL.len());

    for kind in ArtifactKind::ALL {
        let path = kind.path(config);
        let started = Instant::now();
        let result = load_one(kind, &path, builder);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = match result {
            Ok((next, records)) => {
                builder = next;
                info!(
                    event_name = "artifacts.load.loaded",
                    artifact = kind.as_str(),
                    path = %path.display(),
                    records,
                    elapsed_ms,
                    "artifact loaded"
                );
                ArtifactStatus::Loaded { records }
            }
            Err((next, error)) if error.is_not_found() => {
                builder = next;
                warn!(
                    event_name = "artifacts.load.missing",
                    artifact = kind.as_str(),
                    path = %path.display(),
                    "artifact file not found; serving empty table"
                );
                ArtifactStatus::Missing
            }
            Err((next, error)) => {
                builder = next;
                warn!(
                    event_name = "artifacts.load.failed",
                    artifact = kind.as_str(),
                    path = %path.display(),
                    error = %error,
                    "artifact failed to load; serving empty table"
                );
                ArtifactStatus::Failed { error: error.to_string() }
            }
        };

        outcomes.push(ArtifactOutcome { kind, path, status, elapsed_ms });
    }

    let report = LoadReport { loaded_at: Utc::now(), outcomes };
    info!(
        event_name = "artifacts.load.completed",
        dir = %config.dir.display(),
        degraded = report.degraded().count(),
        "artifact load pass completed"
    );

    (builder.build(), report)
}

type LoadStep = Result<(ArtifactsBuilder, usize), (ArtifactsBuilder, ArtifactError)>;

fn load_one(kind: ArtifactKind, path: &Path, builder: ArtifactsBuilder) -> LoadStep {
    match kind {
        ArtifactKind::Catalog => match load_catalog(path) {
            Ok(catalog) => {
                let records = catalog.len();
                Ok((builder.catalog(catalog), records))
            }
            Err(error) => Err((builder, error)),
        },
        ArtifactKind::Model => match load_model(path) {
            Ok(model) => {
                let records = model.item_rows();
                Ok((builder.model(model), records))
            }
            Err(error) => Err((builder, error)),
        },
        ArtifactKind::CoPurchase => match load_co_purchase(path) {
            Ok(co_purchase) => {
                let records = co_purchase.len();
                Ok((builder.co_purchase(co_purchase), records))
            }
            Err(error) => Err((builder, error)),
        },
        ArtifactKind::Candidates => match load_candidates(path) {
            Ok(candidates) => {
                let records = candidates.len();
                Ok((builder.candidates(candidates), records))
            }
            Err(error) => Err((builder, error)),
        },
        ArtifactKind::UserSummaries => match load_user_summaries(path) {
            Ok(summaries) => {
                let records = summaries.len();
                Ok((builder.user_summaries(summaries), records))
            }
            Err(error) => Err((builder, error)),
        },
    }
}
