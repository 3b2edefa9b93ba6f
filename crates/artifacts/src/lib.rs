//! Loading of the offline-trained artifacts that back recommendation serving.
//!
//! Every artifact is optional. A missing or unreadable file leaves its table empty
//! and is recorded in the [`LoadReport`], so request handling never sees a load
//! failure.

pub mod catalog;
pub mod error;
pub mod images;
pub mod loader;
pub mod shared;
pub mod tables;

pub use catalog::{load_catalog, read_catalog};
pub use error::ArtifactError;
pub use images::ImageIndex;
pub use loader::{load_all, ArtifactKind, ArtifactOutcome, ArtifactStatus, LoadReport};
pub use shared::{LoadedArtifacts, SharedArtifacts};
pub use tables::{load_candidates, load_co_purchase, load_model, load_user_summaries};
