//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::{MediaError, ToolsError};

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    /// Missing or invalid parameter; answered without a body
    BadRequest(String),
    /// Media does not exist; answered without a body
    NotFound(String),
    /// Downloader or transcoder failed before sending data
    BadGateway(String),
    InternalError(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HttpError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            HttpError::BadRequest(msg) | HttpError::NotFound(msg) => {
                tracing::debug!("{}: {}", status, msg);
                status.into_response()
            }
            HttpError::BadGateway(msg) | HttpError::InternalError(msg) => {
                tracing::warn!("{}: {}", status, msg);
                (status, msg).into_response()
            }
        }
    }
}

impl From<ToolsError> for HttpError {
    fn from(err: ToolsError) -> Self {
        match err {
            ToolsError::InvalidRequest(msg) => HttpError::BadRequest(msg),
            ToolsError::Media(MediaError::NotFound(msg)) => HttpError::NotFound(msg),
            ToolsError::Media(err) => HttpError::BadGateway(err.to_string()),
            _ => HttpError::InternalError(err.to_string()),
        }
    }
}
