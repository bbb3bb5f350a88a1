use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use spacetraveling_shared::SpacetravelingError;

/// Error returned by handlers; renders as `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub SpacetravelingError);

impl From<SpacetravelingError> for ApiError {
    fn from(err: SpacetravelingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SpacetravelingError::NotFound { .. } => StatusCode::NOT_FOUND,
            SpacetravelingError::InvalidCursor { .. } => StatusCode::GONE,
            SpacetravelingError::Repository(_) | SpacetravelingError::Parse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            SpacetravelingError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, %status, "request failed");
        } else {
            warn!(error = %self.0, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status() {
        let cases = [
            (SpacetravelingError::not_found("posts", "x"), StatusCode::NOT_FOUND),
            (SpacetravelingError::invalid_cursor("expired"), StatusCode::GONE),
            (
                SpacetravelingError::Repository("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (SpacetravelingError::parse("bad json"), StatusCode::BAD_GATEWAY),
            (SpacetravelingError::validation("empty slug"), StatusCode::BAD_REQUEST),
            (
                SpacetravelingError::config("no endpoint"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
