use axum::http::StatusCode;

/// GET /status
pub async fn status() -> StatusCode {
    StatusCode::NO_CONTENT
}
