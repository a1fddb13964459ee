//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::docs::swagger_ui;
use super::handlers::{
    decode_dfpwm, download_audio, download_dfpwm, download_media, download_video, encode_pcm,
    extract_id, health_check, index, version_check,
};
use super::middleware::request_logger;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.limits.max_body_bytes();

    let codec_routes = Router::new()
        .route(
            "/encode",
            post(encode_pcm).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/decode",
            post(decode_dfpwm).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/download/media", get(download_dfpwm));

    let media_routes = Router::new()
        .route("/download", get(download_media))
        .route("/download/video", get(download_video))
        .route("/download/audio", get(download_audio))
        .route("/extract-id", get(extract_id));

    let mut router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .nest("/tools/codec", codec_routes)
        .nest("/tools/media", media_routes)
        .merge(swagger_ui())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::HEAD])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
            .max_age(Duration::from_secs(3600));
        router = router.layer(cors);
    }

    router.with_state(state)
}
