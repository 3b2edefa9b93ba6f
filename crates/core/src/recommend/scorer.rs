use std::cmp::Ordering;

use ndarray::Array1;

use crate::artifacts::Artifacts;
use crate::ids::ItemId;
use crate::model::LatentFactorModel;

/// Why latent-factor scoring produced nothing for a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersonalizationGap {
    ModelUnavailable,
    UnknownUser,
    UserRowOutOfRange,
}

impl PersonalizationGap {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::UnknownUser => "unknown_user",
            Self::UserRowOutOfRange => "user_row_out_of_range",
        }
    }
}

/// Score every item for `user_id` and return the best `top_k`. Absence of
/// personalization yields an empty list.
pub fn score_user(
    artifacts: &Artifacts,
    user_id: &str,
    exclude_recent: bool,
    top_k: usize,
) -> Vec<ItemId> {
    try_score_user(artifacts, user_id, exclude_recent, top_k).unwrap_or_default()
}

/// Like [`score_user`] but reports why no personalization was possible.
pub fn try_score_user(
    artifacts: &Artifacts,
    user_id: &str,
    exclude_recent: bool,
    top_k: usize,
) -> Result<Vec<ItemId>, PersonalizationGap> {
    let model = artifacts.model.as_ref().ok_or(PersonalizationGap::ModelUnavailable)?;
    let user_row = model.encode_user(user_id).map_err(|_| PersonalizationGap::UnknownUser)?;
    let mut scores =
        model.score_items(user_row).ok_or(PersonalizationGap::UserRowOutOfRange)?;

    let mut masked = vec![false; scores.len()];
    if exclude_recent {
        if let Some(summary) = artifacts.user_summaries.get(user_id) {
            for item in &summary.last_items {
                let Ok(row) = model.encode_item(item) else { continue };
                if let Some(score) = scores.get_mut(row) {
                    *score = f32::NEG_INFINITY;
                    masked[row] = true;
                }
            }
        }
    }

    Ok(top_items(model, &scores, &masked, top_k))
}

/// Highest scores first, ties by ascending row. Masked rows and rows without an
/// id are never emitted.
fn top_items(
    model: &LatentFactorModel,
    scores: &Array1<f32>,
    masked: &[bool],
    top_k: usize,
) -> Vec<ItemId> {
    if top_k == 0 {
        return Vec::new();
    }

    let mut rows: Vec<usize> =
        (0..model.decodable_item_rows().min(scores.len())).filter(|&row| !masked[row]).collect();

    let by_rank = |a: &usize, b: &usize| -> Ordering {
        rank_value(scores[*b]).total_cmp(&rank_value(scores[*a])).then_with(|| a.cmp(b))
    };

    if top_k < rows.len() {
        rows.select_nth_unstable_by(top_k, by_rank);
        rows.truncate(top_k);
    }
    rows.sort_unstable_by(by_rank);

    rows.into_iter().filter_map(|row| model.decode_item(row)).collect()
}

fn rank_value(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::{score_user, try_score_user, PersonalizationGap};
    use crate::artifacts::Artifacts;
    use crate::ids::normalize;
    use crate::model::LatentFactorModel;
    use crate::tables::{UserSummary, UserSummaryMap};

    fn artifacts_with(model: LatentFactorModel, history: &[&str]) -> Artifacts {
        Artifacts::builder()
            .model(model)
            .user_summaries(UserSummaryMap::from_entries([(
                "B".to_owned(),
                UserSummary { last_items: history.iter().map(|id| normalize(id)).collect() },
            )]))
            .build()
    }

    fn two_item_model() -> LatentFactorModel {
        LatentFactorModel::from_rows(
            vec!["B".to_owned()],
            vec![normalize("1"), normalize("2")],
            vec![vec![1.0, 0.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .expect("model should build")
    }

    #[test]
    fn recent_purchases_are_masked_out() {
        let artifacts = artifacts_with(two_item_model(), &["0000000001"]);

        assert_eq!(score_user(&artifacts, "B", true, 1), vec![normalize("2")]);
        assert_eq!(score_user(&artifacts, "B", true, 5), vec![normalize("2")]);
    }

    #[test]
    fn without_exclusion_history_is_ranked_normally() {
        let artifacts = artifacts_with(two_item_model(), &["0000000001"]);

        assert_eq!(score_user(&artifacts, "B", false, 2), vec![normalize("1"), normalize("2")]);
    }

    #[test]
    fn ties_break_by_ascending_row() {
        let model = LatentFactorModel::from_rows(
            vec!["B".to_owned()],
            vec![normalize("30"), normalize("10"), normalize("20"), normalize("40")],
            vec![vec![1.0]],
            vec![vec![1.0], vec![2.0], vec![1.0], vec![2.0]],
        )
        .expect("model should build");
        let artifacts = artifacts_with(model, &[]);

        assert_eq!(
            score_user(&artifacts, "B", true, 3),
            vec![normalize("10"), normalize("40"), normalize("30")]
        );
    }

    #[test]
    fn unknown_history_items_are_skipped() {
        let artifacts = artifacts_with(two_item_model(), &["0000000999"]);
        assert_eq!(score_user(&artifacts, "B", true, 2), vec![normalize("1"), normalize("2")]);
    }

    #[test]
    fn gaps_are_reported_distinctly() {
        assert_eq!(
            try_score_user(&Artifacts::default(), "B", true, 3),
            Err(PersonalizationGap::ModelUnavailable)
        );

        let artifacts = artifacts_with(two_item_model(), &[]);
        assert_eq!(
            try_score_user(&artifacts, "nobody", true, 3),
            Err(PersonalizationGap::UnknownUser)
        );

        let short_matrix = LatentFactorModel::from_rows(
            vec!["B".to_owned(), "C".to_owned()],
            vec![normalize("1")],
            vec![vec![1.0]],
            vec![vec![1.0]],
        )
        .expect("model should build");
        let artifacts = artifacts_with(short_matrix, &[]);
        assert_eq!(
            try_score_user(&artifacts, "C", true, 3),
            Err(PersonalizationGap::UserRowOutOfRange)
        );
        assert!(score_user(&artifacts, "C", true, 3).is_empty());
    }

    #[test]
    fn scoring_does_not_mutate_shared_model() {
        let artifacts = artifacts_with(two_item_model(), &["0000000001"]);
        let first = score_user(&artifacts, "B", true, 2);
        let unmasked = score_user(&artifacts, "B", false, 2);
        let second = score_user(&artifacts, "B", true, 2);

        assert_eq!(first, second);
        assert_eq!(unmasked.len(), 2);
    }

    #[test]
    fn zero_top_k_is_empty() {
        let artifacts = artifacts_with(two_item_model(), &[]);
        assert_eq!(try_score_user(&artifacts, "B", true, 0), Ok(Vec::new()));
    }
}
