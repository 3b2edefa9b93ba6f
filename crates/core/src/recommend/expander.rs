use std::collections::HashSet;

use serde::Serialize;

use super::resolver::resolve;
use super::{PartnerFill, DEFAULT_RECOMMENDATIONS};
use crate::artifacts::Artifacts;
use crate::ids::ItemId;
use crate::tables::CoPurchaseMap;

/// The tier that answered an "also bought" request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlsoBoughtSource {
    PurchaseHistory,
    Recommendations,
    Popularity,
}

impl AlsoBoughtSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseHistory => "purchase_history",
            Self::Recommendations => "recommendations",
            Self::Popularity => "popularity",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlsoBought {
    pub items: Vec<ItemId>,
    pub source: AlsoBoughtSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpansionOptions {
    pub partner_fill: PartnerFill,
    /// How many recommendations seed the second tier.
    pub recommendation_pool: usize,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self { partner_fill: PartnerFill::default(), recommendation_pool: DEFAULT_RECOMMENDATIONS }
    }
}

/// Up to `limit` unique co-purchase suggestions for `user_id`, with the tier that
/// produced them.
pub fn expand(
    artifacts: &Artifacts,
    user_id: &str,
    limit: usize,
    options: ExpansionOptions,
) -> AlsoBought {
    if let Some(summary) = artifacts.user_summaries.get(user_id) {
        let partners = collect_partners(
            &artifacts.co_purchase,
            &summary.last_items,
            limit,
            options.partner_fill,
        );
        if partners.len() >= limit {
            return AlsoBought { items: partners, source: AlsoBoughtSource::PurchaseHistory };
        }
    }

    let recommended = resolve(artifacts, user_id, options.recommendation_pool);
    let partners =
        collect_partners(&artifacts.co_purchase, &recommended.items, limit, options.partner_fill);
    if partners.len() >= limit {
        return AlsoBought { items: partners, source: AlsoBoughtSource::Recommendations };
    }

    AlsoBought { items: artifacts.catalog.head(limit), source: AlsoBoughtSource::Popularity }
}

/// Up to `limit` "also bought" item ids for `user_id` with default options.
pub fn also_bought(artifacts: &Artifacts, user_id: &str, limit: usize) -> Vec<ItemId> {
    expand(artifacts, user_id, limit, ExpansionOptions::default()).items
}

/// Partners of each source in order, deduplicated globally by first occurrence and
/// truncated to `limit`.
fn collect_partners(
    co_purchase: &CoPurchaseMap,
    sources: &[ItemId],
    limit: usize,
    fill: PartnerFill,
) -> Vec<ItemId> {
    let mut seen = HashSet::new();
    let mut collected = Vec::new();

    for source in sources {
        if collected.len() >= limit {
            break;
        }
        let Some(partners) = co_purchase.partners(source) else { continue };
        let per_source = match fill {
            PartnerFill::PerSource => limit,
            PartnerFill::Exhaustive => partners.len(),
        };
        for entry in partners.iter().take(per_source) {
            if seen.insert(&entry.item_id) {
                collected.push(entry.item_id.clone());
            }
        }
    }

    collected.truncate(limit);
    collected
}
