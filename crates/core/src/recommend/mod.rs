//! Recommendation resolution
//!
//! Personalized recommendations come from a fallback chain: precomputed candidate
//! lists, then latent-factor scoring, then catalog popularity. "Also bought"
//! suggestions expand a user's purchase history (or their recommendations) through
//! the co-purchase table.

mod expander;
mod resolver;
mod scorer;

pub use expander::{also_bought, expand, AlsoBought, AlsoBoughtSource, ExpansionOptions};
pub use resolver::{recommend, resolve, RecommendationSource, Recommendations};
pub use scorer::{score_user, try_score_user, PersonalizationGap};

use serde::{Deserialize, Serialize};

/// Recommendations returned when the caller does not ask for a specific count.
pub const DEFAULT_RECOMMENDATIONS: usize = 12;

/// "Also bought" suggestions returned by default.
pub const DEFAULT_ALSO_BOUGHT: usize = 5;

/// Search results returned by default.
pub const DEFAULT_SEARCH_RESULTS: usize = 12;

/// How many co-purchase partners each source item may contribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerFill {
    /// Each source contributes at most `limit` partners before deduplication.
    #[default]
    PerSource,
    /// Every stored partner is considered; truncation happens after deduplication.
    Exhaustive,
}

impl std::str::FromStr for PartnerFill {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per_source" | "per-source" => Ok(Self::PerSource),
            "exhaustive" => Ok(Self::Exhaustive),
            other => Err(format!(
                "unsupported partner fill `{other}` (expected per_source|exhaustive)"
            )),
        }
    }
}
