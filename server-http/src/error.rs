use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Maps the storage error taxonomy onto HTTP statuses. Bodies are plain text.
#[derive(Debug)]
pub struct ApiError(pub shared::Error);

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            shared::Error::Validation(_) => StatusCode::BAD_REQUEST,
            shared::Error::NotFound => StatusCode::NOT_FOUND,
            shared::Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
            shared::Error::Transport(_)
            | shared::Error::Decode(_)
            | shared::Error::Configuration(_)
            | shared::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("request failed: {}", self.0);
        }
        (status, self.0.to_string()).into_response()
    }
}
