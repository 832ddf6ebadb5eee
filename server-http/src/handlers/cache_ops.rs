use crate::api::{GetQuery, PutResponse};
use crate::error::ApiError;
use crate::state::AppState;
use application::payload::parse_put_request;
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use bytes::Bytes;
use tracing::info;

/// POST /cache
pub async fn put_values(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PutResponse>, ApiError> {
    let entries = parse_put_request(&body, &state.limits)?;
    info!("PUT: {} value(s)", entries.len());

    let ctx = state.context();
    let ids = state.app.put.exec(&ctx, entries).await?;
    Ok(Json(PutResponse::from(ids)))
}

/// GET /cache?uuid=<id>
pub async fn get_value(
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = query
        .uuid
        .filter(|id| !id.is_empty())
        .ok_or_else(|| shared::Error::Validation("missing required parameter uuid".into()))?;
    info!("GET: uuid={}", id);

    let ctx = state.context();
    let payload = state.app.get.exec(&ctx, &id).await.map_err(|err| {
        if matches!(err, shared::Error::NotFound) {
            info!("GET: nothing stored for uuid={}", id);
        }
        ApiError(err)
    })?;

    Ok((
        [(header::CONTENT_TYPE, payload.kind.content_type())],
        payload.body,
    ))
}
