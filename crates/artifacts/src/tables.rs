use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use storefront_core::ids::{normalize, ItemId};
use storefront_core::model::{LatentFactorModel, ModelArtifact};
use storefront_core::tables::{
    CandidateMap, CoPurchaseEntry, CoPurchaseMap, UserSummary, UserSummaryMap,
};

use crate::error::ArtifactError;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file =
        File::open(path).map_err(|source| ArtifactError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| ArtifactError::Json { path: path.to_path_buf(), source })
}

/// JSON object entries in document order.
struct OrderedEntries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

pub fn load_model(path: &Path) -> Result<LatentFactorModel, ArtifactError> {
    let artifact: ModelArtifact = read_json(path)?;
    LatentFactorModel::try_from(artifact)
        .map_err(|source| ArtifactError::Model { path: path.to_path_buf(), source })
}

/// Keys are normalized in file order, so the first spelling of a colliding id wins.
pub fn load_co_purchase(path: &Path) -> Result<CoPurchaseMap, ArtifactError> {
    let OrderedEntries(entries) = read_json::<OrderedEntries<Vec<CoPurchaseEntry>>>(path)?;
    Ok(CoPurchaseMap::from_entries(
        entries.into_iter().map(|(source, partners)| (normalize(&source), partners)),
    ))
}

pub fn load_candidates(path: &Path) -> Result<CandidateMap, ArtifactError> {
    let candidates: HashMap<String, Vec<ItemId>> = read_json(path)?;
    Ok(CandidateMap::from_entries(candidates))
}

pub fn load_user_summaries(path: &Path) -> Result<UserSummaryMap, ArtifactError> {
    let summaries: HashMap<String, UserSummary> = read_json(path)?;
    Ok(UserSummaryMap::from_entries(summaries))
}
