use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use nabemap_common::ResolverError;
use nabemap_resolver::{features_to_collection, neighborhood_to_feature, AdjacentMatch};

use crate::AppState;

// --- Query structs ---

#[derive(Deserialize)]
pub struct LookupQuery {
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct AdjacentQuery {
    radius_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    borough: Option<String>,
}

// --- Helpers ---

fn error_response(e: &ResolverError) -> Response {
    let status = match e {
        ResolverError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ResolverError::DataUnavailable(_) => {
            warn!(error = %e, "Neighborhood dataset unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

fn query_error(rejection: QueryRejection) -> Response {
    (
        rejection.status(),
        Json(serde_json::json!({ "error": rejection.body_text() })),
    )
        .into_response()
}

fn not_found(code: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("unknown neighborhood code: {code}") })),
    )
        .into_response()
}

fn adjacent_features(matches: &[AdjacentMatch]) -> Vec<serde_json::Value> {
    matches
        .iter()
        .map(|m| {
            let mut feature = neighborhood_to_feature(&m.neighborhood);
            feature["properties"]["match"] = serde_json::json!(m.reason);
            feature
        })
        .collect()
}

// --- Handlers ---

pub async fn api_neighborhoods(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(query) => query,
        Err(rejection) => return query_error(rejection),
    };
    let set = match state.resolver.neighborhoods().await {
        Ok(set) => set,
        Err(e) => return error_response(&e),
    };

    let features: Vec<serde_json::Value> = match params.borough.as_deref() {
        Some(borough) => set.in_borough(borough).map(|h| neighborhood_to_feature(h)).collect(),
        None => set.iter().map(|h| neighborhood_to_feature(h)).collect(),
    };
    Json(features_to_collection(features)).into_response()
}

pub async fn api_lookup(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LookupQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(query) => query,
        Err(rejection) => return query_error(rejection),
    };
    match state.resolver.resolve(params.lng, params.lat, params.radius_km).await {
        Ok(resolution) => {
            let neighborhood = resolution
                .neighborhood
                .as_deref()
                .map(neighborhood_to_feature)
                .unwrap_or(serde_json::Value::Null);
            Json(serde_json::json!({
                "neighborhood": neighborhood,
                "adjacent": adjacent_features(&resolution.adjacent),
            }))
            .into_response()
        }
        Err(e) => error_response(&e),
    }
}

pub async fn api_neighborhood_detail(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let set = match state.resolver.neighborhoods().await {
        Ok(set) => set,
        Err(e) => return error_response(&e),
    };
    match set.get(&code) {
        Some(hood) => Json(neighborhood_to_feature(hood)).into_response(),
        None => not_found(&code),
    }
}

pub async fn api_adjacent(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    params: Result<Query<AdjacentQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(params) = match params {
        Ok(query) => query,
        Err(rejection) => return query_error(rejection),
    };
    let set = match state.resolver.neighborhoods().await {
        Ok(set) => set,
        Err(e) => return error_response(&e),
    };
    let Some(subject) = set.get(&code) else {
        return not_found(&code);
    };

    match state.resolver.find_adjacent(Some(subject.as_ref()), params.radius_km).await {
        Ok(matches) => Json(features_to_collection(adjacent_features(&matches))).into_response(),
        Err(e) => error_response(&e),
    }
}
