use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use marketfeed_models::{Market, OddsChangeEvent, RegistryError};
use marketfeed_registry::MarketRegistry;
use marketfeed_stream::EventBus;
use serde::Serialize;
use std::sync::Arc;

use crate::stream::stream_odds;
use crate::validation::{
    validate_create_market, validate_filters, validate_update_odds, CreateMarketRequest,
    MarketFilterParams, UpdateOddsRequest, ValidationError,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MarketRegistry>,
    pub bus: EventBus<OddsChangeEvent>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ValidationErrorsResponse {
    pub errors: Vec<ValidationError>,
}

#[derive(Serialize)]
pub struct NotFoundResponse {
    pub error: String,
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Market registry
        .route("/markets", post(create_market).get(list_markets))
        .route("/markets/stream", get(stream_odds))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/odds", post(update_odds))
}

fn validation_failure(errors: Vec<ValidationError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationErrorsResponse { errors }),
    )
        .into_response()
}

fn market_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Market not found".to_string(),
        }),
    )
        .into_response()
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn create_market(
    State(state): State<AppState>,
    Json(request): Json<CreateMarketRequest>,
) -> Response {
    match validate_create_market(&request) {
        Ok(valid) => {
            let market = state
                .registry
                .create_market(valid.sport, valid.event_id, valid.odds);
            (StatusCode::CREATED, Json(market)).into_response()
        }
        Err(errors) => validation_failure(errors),
    }
}

async fn list_markets(
    State(state): State<AppState>,
    Query(params): Query<MarketFilterParams>,
) -> Response {
    match validate_filters(&params) {
        Ok(filters) => {
            let markets: Vec<Market> = state.registry.filter_markets(&filters);
            Json(markets).into_response()
        }
        Err(errors) => validation_failure(errors),
    }
}

async fn get_market(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.registry.get_market(&id) {
        Some(market) => Json(market).into_response(),
        None => market_not_found(),
    }
}

async fn update_odds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOddsRequest>,
) -> Response {
    let odds = match validate_update_odds(&request) {
        Ok(odds) => odds,
        Err(errors) => return validation_failure(errors),
    };

    match state.registry.update_odds(&id, odds) {
        Ok(market) => Json(market).into_response(),
        Err(RegistryError::MarketNotFound { .. }) => market_not_found(),
    }
}
