use std::path::PathBuf;

use storefront_core::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not read artifact `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed csv in `{path}`: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("malformed json in `{path}`: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("`{path}` has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("invalid model in `{path}`: {source}")]
    Model { path: PathBuf, source: ModelError },
    #[error("artifact loading task failed: {0}")]
    Task(String),
}

impl ArtifactError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
