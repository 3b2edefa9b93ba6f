use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_artifacts::ImageIndex;
use storefront_core::catalog::Product;
use storefront_core::errors::{ApplicationError, DomainError, InterfaceError};
use storefront_core::ids::{normalize, ItemId};
use storefront_core::recommend::{AlsoBoughtSource, RecommendationSource};
use storefront_core::{validate_user_id, RecommendationContext};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cart::CartStore;

#[derive(Clone)]
pub struct ApiState {
    context: RecommendationContext,
    images: Arc<ImageIndex>,
    carts: Arc<dyn CartStore>,
}

impl ApiState {
    pub fn new(
        context: RecommendationContext,
        images: Arc<ImageIndex>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self { context, images, carts }
    }

    fn card(&self, item: &ItemId) -> ProductCard {
        let image = self.images.get(item).map(|path| path.display().to_string());
        match self.context.product(item) {
            Some(product) => ProductCard {
                item_id: item.clone(),
                name: product.display_name(),
                colour: product.colour_name().map(str::to_owned),
                price: product.price,
                image,
            },
            None => ProductCard {
                item_id: item.clone(),
                name: Product::new(item.clone()).display_name(),
                colour: None,
                price: None,
                image,
            },
        }
    }

    fn cards(&self, items: &[ItemId]) -> Vec<ProductCard> {
        items.iter().map(|item| self.card(item)).collect()
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/users/{user_id}/recommendations", get(recommendations))
        .route("/api/v1/users/{user_id}/also-bought", get(also_bought))
        .route("/api/v1/search", get(search))
        .route("/api/v1/products/{item_id}", get(product))
        .route(
            "/api/v1/sessions/{session_id}/cart",
            get(view_cart).post(add_to_cart).delete(clear_cart),
        )
        .with_state(state)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductCard {
    pub item_id: ItemId,
    pub name: String,
    pub colour: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub user_id: String,
    pub source: RecommendationSource,
    pub items: Vec<ProductCard>,
}

#[derive(Debug, Serialize)]
pub struct AlsoBoughtResponse {
    pub user_id: String,
    pub source: AlsoBoughtSource,
    pub items: Vec<ProductCard>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub items: Vec<ProductCard>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub session_id: String,
    pub items: Vec<ProductCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
    correlation_id: String,
}

impl ApiError {
    fn new(error: impl Into<ApplicationError>, correlation_id: &str) -> Self {
        let interface = error.into().into_interface(correlation_id);
        warn!(
            event_name = "api.request.rejected",
            correlation_id,
            error = %interface,
            "request rejected"
        );
        Self(interface)
    }

    fn internal(message: impl Into<String>, correlation_id: &str) -> Self {
        let interface = InterfaceError::Internal {
            message: message.into(),
            correlation_id: correlation_id.to_string(),
        };
        warn!(
            event_name = "api.request.failed",
            correlation_id,
            error = %interface,
            "request failed"
        );
        Self(interface)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.user_message(),
            detail: self.0.to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Run resolution and card building on the blocking pool. Latent-factor scoring
/// touches every item row.
async fn off_runtime<T, F>(state: &ApiState, correlation_id: &str, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&ApiState) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || work(&state)).await.map_err(|error| {
        ApiError::internal(format!("resolution task failed: {error}"), correlation_id)
    })
}

pub async fn recommendations(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let correlation_id = correlation_id();
    let user_id =
        validate_user_id(&user_id).map_err(|e| ApiError::new(e, &correlation_id))?.to_owned();
    let limit = state
        .context
        .resolve_limit(query.limit, state.context.settings().default_limit)
        .map_err(|e| ApiError::new(e, &correlation_id))?;

    let user = user_id.clone();
    let (resolved, items) = off_runtime(&state, &correlation_id, move |state| {
        let resolved = state.context.recommend(&user, limit);
        let items = state.cards(&resolved.items);
        (resolved, items)
    })
    .await?;
    info!(
        event_name = "recommend.resolved",
        correlation_id = %correlation_id,
        user_id = %user_id,
        source = resolved.source.as_str(),
        count = items.len(),
        "recommendations resolved"
    );

    Ok(Json(RecommendationsResponse { user_id, source: resolved.source, items }))
}

pub async fn also_bought(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<AlsoBoughtResponse>, ApiError> {
    let correlation_id = correlation_id();
    let user_id =
        validate_user_id(&user_id).map_err(|e| ApiError::new(e, &correlation_id))?.to_owned();
    let limit = state
        .context
        .resolve_limit(query.limit, state.context.settings().also_bought_limit)
        .map_err(|e| ApiError::new(e, &correlation_id))?;

    let user = user_id.clone();
    let (expanded, items) = off_runtime(&state, &correlation_id, move |state| {
        let expanded = state.context.also_bought(&user, limit);
        let items = state.cards(&expanded.items);
        (expanded, items)
    })
    .await?;
    info!(
        event_name = "also_bought.resolved",
        correlation_id = %correlation_id,
        user_id = %user_id,
        source = expanded.source.as_str(),
        count = items.len(),
        "also-bought suggestions resolved"
    );

    Ok(Json(AlsoBoughtResponse { user_id, source: expanded.source, items }))
}

pub async fn search(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let correlation_id = correlation_id();
    let limit = state
        .context
        .resolve_limit(query.limit, state.context.settings().search_limit)
        .map_err(|e| ApiError::new(e, &correlation_id))?;

    let text = query.q.unwrap_or_default();
    let needle = text.clone();
    let items = off_runtime(&state, &correlation_id, move |state| {
        state.cards(&state.context.search(&needle, limit))
    })
    .await?;
    Ok(Json(SearchResponse { query: text, items }))
}

pub async fn product(
    State(state): State<ApiState>,
    Path(item_id): Path<String>,
) -> Result<Json<ProductCard>, ApiError> {
    let item = normalize(&item_id);
    if state.context.product(&item).is_none() {
        return Err(ApiError::new(DomainError::UnknownItem(item.into_string()), &correlation_id()));
    }
    Ok(Json(state.card(&item)))
}

pub async fn view_cart(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Json<CartResponse> {
    let items = state.carts.items(&session_id).await;
    Json(CartResponse { items: state.cards(&items), session_id, added: None })
}

pub async fn add_to_cart(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let item = request.item_id;
    if state.context.product(&item).is_none() {
        return Err(ApiError::new(DomainError::UnknownItem(item.into_string()), &correlation_id()));
    }

    let added = state.carts.add(&session_id, item).await;
    let items = state.carts.items(&session_id).await;
    Ok(Json(CartResponse { items: state.cards(&items), session_id, added: Some(added) }))
}

pub async fn clear_cart(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    state.carts.clear(&session_id).await;
    StatusCode::NO_CONTENT
}
