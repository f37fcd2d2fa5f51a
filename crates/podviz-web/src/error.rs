use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use podviz_types::SourceError;

use crate::handlers::StatusBody;

/// Request-path failure, reported to that one caller only
#[derive(Debug)]
pub struct ApiError(pub SourceError);

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "request failed");
        let body = StatusBody::new("error").with_error(&self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
