//! Matrix-factorization model: user and item factor matrices plus the encoders
//! that map ids to matrix rows.

use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;
use thiserror::Error;

use crate::ids::ItemId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("id `{0}` is not known to the encoder")]
    Unknown(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{encoder} encoder contains duplicate id `{id}`")]
    DuplicateId { encoder: &'static str, id: String },
    #[error("{matrix} row {row} has {found} factors, expected {expected}")]
    RaggedFactors { matrix: &'static str, row: usize, expected: usize, found: usize },
    #[error("user factor dimension {user} does not match item factor dimension {item}")]
    DimensionMismatch { user: usize, item: usize },
    #[error("invalid factor matrix shape: {0}")]
    Shape(String),
}

/// Bidirectional id ↔ row mapping. Position in `classes` is the row index.
#[derive(Clone, Debug, Default)]
pub struct IdEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl IdEncoder {
    pub fn new(classes: Vec<String>, encoder: &'static str) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(classes.len());
        for (row, id) in classes.iter().enumerate() {
            if index.insert(id.clone(), row).is_some() {
                return Err(ModelError::DuplicateId { encoder, id: id.clone() });
            }
        }
        Ok(Self { classes, index })
    }

    pub fn encode(&self, id: &str) -> Result<usize, EncodeError> {
        self.index.get(id).copied().ok_or_else(|| EncodeError::Unknown(id.to_owned()))
    }

    pub fn decode(&self, row: usize) -> Option<&str> {
        self.classes.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct LatentFactorModel {
    user_encoder: IdEncoder,
    item_encoder: IdEncoder,
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl LatentFactorModel {
    pub fn new(
        user_ids: Vec<String>,
        item_ids: Vec<ItemId>,
        user_factors: Array2<f32>,
        item_factors: Array2<f32>,
    ) -> Result<Self, ModelError> {
        let (user_dim, item_dim) = (user_factors.ncols(), item_factors.ncols());
        let both_populated = user_factors.nrows() > 0 && item_factors.nrows() > 0;
        if both_populated && user_dim != item_dim {
            return Err(ModelError::DimensionMismatch { user: user_dim, item: item_dim });
        }

        Ok(Self {
            user_encoder: IdEncoder::new(user_ids, "user")?,
            item_encoder: IdEncoder::new(
                item_ids.into_iter().map(ItemId::into_string).collect(),
                "item",
            )?,
            user_factors,
            item_factors,
        })
    }

    /// Build from row-major nested vectors, as stored in the model artifact.
    pub fn from_rows(
        user_ids: Vec<String>,
        item_ids: Vec<ItemId>,
        user_rows: Vec<Vec<f32>>,
        item_rows: Vec<Vec<f32>>,
    ) -> Result<Self, ModelError> {
        let user_factors = rows_to_matrix(user_rows, "user_factors")?;
        let item_factors = rows_to_matrix(item_rows, "item_factors")?;
        Self::new(user_ids, item_ids, user_factors, item_factors)
    }

    pub fn dimension(&self) -> usize {
        self.item_factors.ncols().max(self.user_factors.ncols())
    }

    pub fn user_rows(&self) -> usize {
        self.user_factors.nrows()
    }

    pub fn item_rows(&self) -> usize {
        self.item_factors.nrows()
    }

    /// Item rows that have an id to decode back to.
    pub fn decodable_item_rows(&self) -> usize {
        self.item_encoder.len().min(self.item_factors.nrows())
    }

    pub fn encode_user(&self, user_id: &str) -> Result<usize, EncodeError> {
        self.user_encoder.encode(user_id)
    }

    pub fn encode_item(&self, item: &ItemId) -> Result<usize, EncodeError> {
        self.item_encoder.encode(item.as_str())
    }

    pub fn decode_item(&self, row: usize) -> Option<ItemId> {
        self.item_encoder.decode(row).map(ItemId::normalize)
    }

    pub fn user_vector(&self, row: usize) -> Option<ArrayView1<'_, f32>> {
        (row < self.user_factors.nrows()).then(|| self.user_factors.row(row))
    }

    /// Dense inner product of every item row with the given user row. The returned
    /// vector is owned by the caller.
    pub fn score_items(&self, user_row: usize) -> Option<Array1<f32>> {
        let user = self.user_vector(user_row)?;
        if self.item_factors.nrows() == 0 {
            return Some(Array1::zeros(0));
        }
        Some(self.item_factors.dot(&user))
    }
}

fn rows_to_matrix(rows: Vec<Vec<f32>>, matrix: &'static str) -> Result<Array2<f32>, ModelError> {
    let expected = rows.first().map(Vec::len).unwrap_or(0);
    let row_count = rows.len();
    let mut flat = Vec::with_capacity(row_count * expected);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != expected {
            return Err(ModelError::RaggedFactors { matrix, row, expected, found: values.len() });
        }
        flat.extend(values);
    }
    Array2::from_shape_vec((row_count, expected), flat)
        .map_err(|error| ModelError::Shape(error.to_string()))
}

/// On-disk layout of the model artifact.
#[derive(Debug, Deserialize)]
pub struct ModelArtifact {
    pub user_ids: Vec<String>,
    pub item_ids: Vec<ItemId>,
    pub user_factors: Vec<Vec<f32>>,
    pub item_factors: Vec<Vec<f32>>,
}

impl TryFrom<ModelArtifact> for LatentFactorModel {
    type Error = ModelError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        Self::from_rows(
            artifact.user_ids,
            artifact.item_ids,
            artifact.user_factors,
            artifact.item_factors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{EncodeError, LatentFactorModel, ModelArtifact, ModelError};
    use crate::ids::normalize;

    fn model() -> LatentFactorModel {
        LatentFactorModel::from_rows(
            vec!["u1".to_owned(), "u2".to_owned()],
            vec![normalize("1"), normalize("2"), normalize("3")],
            vec![vec![1.0, 0.0], vec![0.5, 0.5]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 2.0]],
        )
        .expect("model should build")
    }

    #[test]
    fn encoders_round_trip_known_ids() {
        let model = model();
        let row = model.encode_item(&normalize("2")).expect("item should encode");
        assert_eq!(row, 1);
        assert_eq!(model.decode_item(row), Some(normalize("2")));
        assert_eq!(model.encode_user("u2"), Ok(1));
    }

    #[test]
    fn unknown_ids_fail_distinctly() {
        let model = model();
        assert_eq!(model.encode_user("nobody"), Err(EncodeError::Unknown("nobody".to_owned())));
        assert!(model.encode_item(&normalize("99")).is_err());
        assert_eq!(model.decode_item(7), None);
    }

    #[test]
    fn scores_are_dense_dot_products() {
        let scores = model().score_items(1).expect("user row should exist");
        assert_eq!(scores.to_vec(), vec![0.5, 0.5, 2.0]);
        assert!(model().score_items(2).is_none());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = LatentFactorModel::from_rows(
            vec!["u1".to_owned()],
            vec![normalize("1")],
            vec![vec![1.0, 0.0]],
            vec![vec![1.0]],
        );
        assert_eq!(result.err(), Some(ModelError::DimensionMismatch { user: 2, item: 1 }));

        let ragged = LatentFactorModel::from_rows(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(matches!(ragged, Err(ModelError::RaggedFactors { row: 1, .. })));
    }

    #[test]
    fn duplicate_encoder_ids_are_rejected() {
        let result = LatentFactorModel::from_rows(
            vec!["u1".to_owned(), "u1".to_owned()],
            Vec::new(),
            vec![vec![1.0], vec![2.0]],
            Vec::new(),
        );
        assert!(matches!(result, Err(ModelError::DuplicateId { encoder: "user", .. })));
    }

    #[test]
    fn artifact_layout_deserializes_numeric_item_ids() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{
                "user_ids": ["B"],
                "item_ids": [1, "2"],
                "user_factors": [[1.0, 0.0]],
                "item_factors": [[1.0, 0.0], [0.0, 1.0]]
            }"#,
        )
        .expect("artifact should deserialize");

        let model = LatentFactorModel::try_from(artifact).expect("model should build");
        assert_eq!(model.dimension(), 2);
        assert_eq!(model.encode_item(&normalize("0000000001")), Ok(0));
    }
}
