use crate::catalog::Catalog;
use crate::model::LatentFactorModel;
use crate::tables::{CandidateMap, CoPurchaseMap, UserSummaryMap};

/// Every read-only structure the resolvers consult. Built once at startup and
/// shared immutably; a missing artifact is represented as empty (or `None` for
/// the model) rather than as an error.
#[derive(Clone, Debug, Default)]
pub struct Artifacts {
    pub catalog: Catalog,
    pub model: Option<LatentFactorModel>,
    pub co_purchase: CoPurchaseMap,
    pub candidates: CandidateMap,
    pub user_summaries: UserSummaryMap,
}

impl Artifacts {
    pub fn builder() -> ArtifactsBuilder {
        ArtifactsBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ArtifactsBuilder {
    artifacts: Artifacts,
}

impl ArtifactsBuilder {
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.artifacts.catalog = catalog;
        self
    }

    pub fn model(mut self, model: LatentFactorModel) -> Self {
        self.artifacts.model = Some(model);
        self
    }

    pub fn co_purchase(mut self, co_purchase: CoPurchaseMap) -> Self {
        self.artifacts.co_purchase = co_purchase;
        self
    }

    pub fn candidates(mut self, candidates: CandidateMap) -> Self {
        self.artifacts.candidates = candidates;
        self
    }

    pub fn user_summaries(mut self, user_summaries: UserSummaryMap) -> Self {
        self.artifacts.user_summaries = user_summaries;
        self
    }

    pub fn build(self) -> Artifacts {
        self.artifacts
    }
}
