pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod context;
pub mod errors;
pub mod ids;
pub mod model;
pub mod recommend;
pub mod search;
pub mod tables;

pub use artifacts::{Artifacts, ArtifactsBuilder};
pub use catalog::{Catalog, Product};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use context::{validate_user_id, RecommendationContext};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ids::{normalize, ItemId};
pub use model::{IdEncoder, LatentFactorModel, ModelArtifact, ModelError};
pub use recommend::{
    AlsoBought, AlsoBoughtSource, PartnerFill, RecommendationSource, Recommendations,
};
pub use tables::{CandidateMap, CoPurchaseEntry, CoPurchaseMap, UserSummary, UserSummaryMap};
