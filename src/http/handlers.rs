//! HTTP request handlers
//!
//! Implements handlers for the codec and media endpoints.

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;
use utoipa::IntoParams;
use uuid::Uuid;

use super::error::HttpError;
use crate::download::DownloadRequest;
use crate::error::ToolsError;
use crate::fetch::{extract_media_id, MediaIdentity, MediaStream, StreamFilter};
use crate::state::AppState;
use crate::transcode::TranscodeSpec;

/// Query parameters of the download endpoints
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// The video ID to download.
    #[param(required = true, example = "ptdgQMSZKVg")]
    pub id: Option<String>,
    /// Stream quality, `highest` (default) or `lowest`.
    #[param(example = "highest")]
    pub quality: Option<String>,
}

/// Query parameters of the id extraction endpoint
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExtractQuery {
    /// The URL to extract the ID from.
    #[param(required = true, example = "https://www.youtube.com/watch?v=ptdgQMSZKVg")]
    pub url: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("media-tools-server v", env!("CARGO_PKG_VERSION"))
}

/// GET /
pub async fn index() -> Redirect {
    Redirect::to("/docs")
}

/// PCM to DFPWM
#[utoipa::path(
    post,
    path = "/tools/codec/encode",
    tag = "codec",
    request_body(content = String, description = "Unsigned 8-bit mono PCM audio", content_type = "audio/wave"),
    responses(
        (status = 200, description = "The converted DFPWM audio", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Empty request body"),
        (status = 413, description = "Request body too large")
    )
)]
pub async fn encode_pcm(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, HttpError> {
    if body.is_empty() {
        return Err(HttpError::BadRequest("empty PCM body".to_string()));
    }

    let codec = state.codec.clone();
    let encoded = tokio::task::spawn_blocking(move || codec.encode(&body))
        .await
        .map_err(|e| HttpError::InternalError(e.to_string()))??;

    Ok(octet_stream(Body::from(encoded)))
}

/// DFPWM to PCM
#[utoipa::path(
    post,
    path = "/tools/codec/decode",
    tag = "codec",
    request_body(content = String, description = "DFPWM audio", content_type = "audio/wave"),
    responses(
        (status = 200, description = "The converted unsigned 8-bit PCM audio", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Empty request body"),
        (status = 413, description = "Request body too large")
    )
)]
pub async fn decode_dfpwm(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, HttpError> {
    if body.is_empty() {
        return Err(HttpError::BadRequest("empty DFPWM body".to_string()));
    }

    let codec = state.codec.clone();
    let decoded = tokio::task::spawn_blocking(move || codec.decode(&body))
        .await
        .map_err(|e| HttpError::InternalError(e.to_string()))??;

    Ok(octet_stream(Body::from(decoded)))
}

/// Audio of a video converted to DFPWM
#[utoipa::path(
    get,
    path = "/tools/codec/download/media",
    tag = "codec",
    params(DownloadQuery),
    responses(
        (status = 200, description = "The downloaded audio, in DFPWM format", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Missing id or invalid quality"),
        (status = 404, description = "The video is unavailable"),
        (status = 502, description = "The downloader or transcoder failed")
    )
)]
pub async fn download_dfpwm(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpError> {
    let request = DownloadRequest::from_query(StreamFilter::AudioOnly, query.id, query.quality)?;
    let span = download_span(&request);

    let stream = state
        .downloader
        .download_transcoded(&request, &TranscodeSpec::dfpwm())
        .instrument(span.clone())
        .await?;

    Ok(media_response(stream, span))
}

/// Video with both its video and audio tracks
#[utoipa::path(
    get,
    path = "/tools/media/download",
    tag = "media",
    params(DownloadQuery),
    responses(
        (status = 200, description = "The downloaded video", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Missing id or invalid quality"),
        (status = 404, description = "The video is unavailable"),
        (status = 502, description = "The downloader failed")
    )
)]
pub async fn download_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpError> {
    stream_download(&state, StreamFilter::AudioAndVideo, query).await
}

/// Video track only
#[utoipa::path(
    get,
    path = "/tools/media/download/video",
    tag = "media",
    params(DownloadQuery),
    responses(
        (status = 200, description = "The downloaded video track", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Missing id or invalid quality"),
        (status = 404, description = "The video is unavailable"),
        (status = 502, description = "The downloader failed")
    )
)]
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpError> {
    stream_download(&state, StreamFilter::VideoOnly, query).await
}

/// Audio track only
#[utoipa::path(
    get,
    path = "/tools/media/download/audio",
    tag = "media",
    params(DownloadQuery),
    responses(
        (status = 200, description = "The downloaded audio track", body = String, content_type = "application/octet-stream"),
        (status = 400, description = "Missing id or invalid quality"),
        (status = 404, description = "The video is unavailable"),
        (status = 502, description = "The downloader failed")
    )
)]
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpError> {
    stream_download(&state, StreamFilter::AudioOnly, query).await
}

/// Video ID from a video URL
#[utoipa::path(
    get,
    path = "/tools/media/extract-id",
    tag = "media",
    params(ExtractQuery),
    responses(
        (status = 200, description = "The URL and the extracted ID", body = MediaIdentity),
        (status = 400, description = "Missing url"),
        (status = 500, description = "No ID could be extracted")
    )
)]
pub async fn extract_id(
    Query(query): Query<ExtractQuery>,
) -> Result<Json<MediaIdentity>, HttpError> {
    let url = query
        .url
        .ok_or_else(|| HttpError::BadRequest("missing url".to_string()))?;
    let identity = extract_media_id(&url).map_err(ToolsError::from)?;
    Ok(Json(identity))
}

async fn stream_download(
    state: &AppState,
    filter: StreamFilter,
    query: DownloadQuery,
) -> Result<Response, HttpError> {
    let request = DownloadRequest::from_query(filter, query.id, query.quality)?;
    let span = download_span(&request);

    let stream = state
        .downloader
        .download(&request)
        .instrument(span.clone())
        .await?;

    Ok(media_response(stream, span))
}

fn download_span(request: &DownloadRequest) -> tracing::Span {
    tracing::info_span!(
        "download",
        request_id = %Uuid::new_v4(),
        media_id = %request.media_id,
        filter = %request.filter,
        quality = %request.quality,
    )
}

/// Stream a primed media stream as the response body.
///
/// The body is pulled on demand, so at most a chunk or two is in flight.
/// A failure after the first chunk can only abort the body.
fn media_response(stream: MediaStream, span: tracing::Span) -> Response {
    let stream = stream.inspect(move |item| match item {
        Ok(_) => {}
        Err(e) => span.in_scope(|| tracing::warn!("Aborting response mid-stream: {}", e)),
    });
    octet_stream(Body::from_stream(stream))
}

fn octet_stream(body: Body) -> Response {
    let mut response = body.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    response
}
