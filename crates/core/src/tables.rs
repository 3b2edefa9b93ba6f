//! Read-only lookup tables produced offline: co-purchase partners, precomputed
//! candidates and per-user purchase summaries.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::ItemId;

/// An item bought together with some source item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoPurchaseEntry {
    pub item_id: ItemId,
    pub weight: Option<f32>,
}

impl CoPurchaseEntry {
    pub fn new(item_id: ItemId) -> Self {
        Self { item_id, weight: None }
    }

    pub fn weighted(item_id: ItemId, weight: f32) -> Self {
        Self { item_id, weight: Some(weight) }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoPurchaseEntry {
    Pair(ItemId, Option<f32>),
    Record { item_id: ItemId, weight: Option<f32> },
    Plain(ItemId),
}

impl<'de> Deserialize<'de> for CoPurchaseEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawCoPurchaseEntry::deserialize(deserializer)? {
            RawCoPurchaseEntry::Pair(item_id, weight)
            | RawCoPurchaseEntry::Record { item_id, weight } => Self { item_id, weight },
            RawCoPurchaseEntry::Plain(item_id) => Self::new(item_id),
        })
    }
}

/// Item → partners, most relevant first.
#[derive(Clone, Debug, Default)]
pub struct CoPurchaseMap {
    partners: HashMap<ItemId, Vec<CoPurchaseEntry>>,
}

impl CoPurchaseMap {
    /// Build from `(source, partners)` pairs. When two raw keys normalize to the same
    /// id the first one wins.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (ItemId, Vec<CoPurchaseEntry>)>,
    ) -> Self {
        let mut partners = HashMap::new();
        for (source, list) in entries {
            partners.entry(source).or_insert(list);
        }
        Self { partners }
    }

    pub fn partners(&self, item: &ItemId) -> Option<&[CoPurchaseEntry]> {
        self.partners.get(item).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

/// User → precomputed ranked recommendations.
#[derive(Clone, Debug, Default)]
pub struct CandidateMap {
    candidates: HashMap<String, Vec<ItemId>>,
}

impl CandidateMap {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<ItemId>)>) -> Self {
        Self { candidates: entries.into_iter().collect() }
    }

    pub fn get(&self, user_id: &str) -> Option<&[ItemId]> {
        self.candidates.get(user_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Per-user purchase summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Most recent purchases, newest first as produced offline.
    #[serde(default, rename = "last_5_items", deserialize_with = "null_as_empty")]
    pub last_items: Vec<ItemId>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ItemId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ItemId>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default)]
pub struct UserSummaryMap {
    summaries: HashMap<String, UserSummary>,
}

impl UserSummaryMap {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, UserSummary)>) -> Self {
        Self { summaries: entries.into_iter().collect() }
    }

    pub fn get(&self, user_id: &str) -> Option<&UserSummary> {
        self.summaries.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{CoPurchaseEntry, CoPurchaseMap, UserSummary};
    use crate::ids::normalize;

    #[test]
    fn co_purchase_entries_accept_every_source_shape() {
        let entries: Vec<CoPurchaseEntry> = serde_json::from_str(
            r#"[12, "13", [14, 0.5], {"item_id": "0000000015", "weight": 0.25}, {"item_id": 16}]"#,
        )
        .expect("entries should deserialize");

        assert_eq!(
            entries,
            vec![
                CoPurchaseEntry::new(normalize("12")),
                CoPurchaseEntry::new(normalize("13")),
                CoPurchaseEntry::weighted(normalize("14"), 0.5),
                CoPurchaseEntry::weighted(normalize("15"), 0.25),
                CoPurchaseEntry::new(normalize("16")),
            ]
        );
    }

    #[test]
    fn first_key_wins_when_sources_collide_after_normalization() {
        let map = CoPurchaseMap::from_entries([
            (normalize("1"), vec![CoPurchaseEntry::new(normalize("2"))]),
            (normalize("0000000001"), vec![CoPurchaseEntry::new(normalize("3"))]),
        ]);

        assert_eq!(map.len(), 1);
        let partners = map.partners(&normalize("1")).expect("partners");
        assert_eq!(partners[0].item_id, normalize("2"));
    }

    #[test]
    fn summary_tolerates_missing_and_null_history() {
        let summaries: BTreeMap<String, UserSummary> = serde_json::from_str(
            r#"{
                "a": {"last_5_items": [1, "2"], "segment": "ignored"},
                "b": {"last_5_items": null},
                "c": {}
            }"#,
        )
        .expect("summaries should deserialize");

        assert_eq!(summaries["a"].last_items, vec![normalize("1"), normalize("2")]);
        assert!(summaries["b"].last_items.is_empty());
        assert!(summaries["c"].last_items.is_empty());
    }
}
