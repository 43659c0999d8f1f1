pub mod rest;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use nabemap_resolver::NeighborhoodResolver;

pub struct AppState {
    pub resolver: NeighborhoodResolver,
}

/// Build the HTTP router. `allowed_origins` empty means any origin.
pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // REST API
        .route("/api/neighborhoods", get(rest::api_neighborhoods))
        .route("/api/neighborhoods/lookup", get(rest::api_lookup))
        .route("/api/neighborhoods/{code}", get(rest::api_neighborhood_detail))
        .route("/api/neighborhoods/{code}/adjacent", get(rest::api_adjacent))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        // Boundaries are static for the life of the process
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=300"),
        ))
        // Logging layer: method + path only (no query params, coordinates stay out of logs)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(origin = o.as_str(), error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
