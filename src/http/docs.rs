//! OpenAPI documentation
//!
//! The document is generated from the handler annotations with `utoipa`.
//! Swagger UI is served at `/docs`, the raw document at
//! `/api-docs/openapi.json`.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::fetch::MediaIdentity;

/// Path of the Swagger UI
pub const DOCS_PATH: &str = "/docs";

/// Path of the generated OpenAPI document
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI documentation for the tool endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Media Tools - APIs",
        description = "REST APIs for DFPWM audio conversion and video downloads",
        license(name = "MIT", url = "https://spdx.org/licenses/MIT.html")
    ),
    tags(
        (name = "codec", description = "DFPWM conversion endpoints"),
        (name = "media", description = "Video download and URL endpoints")
    ),
    paths(
        super::handlers::encode_pcm,
        super::handlers::decode_dfpwm,
        super::handlers::download_dfpwm,
        super::handlers::download_media,
        super::handlers::download_video,
        super::handlers::download_audio,
        super::handlers::extract_id,
    ),
    components(schemas(MediaIdentity))
)]
pub struct ApiDoc;

/// Swagger UI plus the JSON document, ready to merge into the router
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(DOCS_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi())
}
