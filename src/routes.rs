use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Extension, Path, rejection::PathRejection},
    http::header,
    response::{IntoResponse, Response},
    routing::{any, post},
};
use std::sync::Arc;

use crate::errors::ApiError;
use crate::storage::{FileId, Storage};

/// `/new` takes uploads, `/{file_id}` hands a file out once, anything else is
/// a 404. `max_upload_bytes` of `None` lifts axum's default body limit.
pub fn router(storage: Arc<dyn Storage>, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/new", post(upload).fallback(not_found))
        .route("/{file_id}", any(download))
        .fallback(not_found)
        .layer(body_limit)
        .layer(Extension(storage))
}

async fn upload(
    Extension(storage): Extension<Arc<dyn Storage>>,
    body: Bytes,
) -> Result<String, ApiError> {
    let size = body.len();
    let file_id = storage.save(body).await?;

    tracing::info!(%file_id, size, "stored upload");
    Ok(file_id.to_string())
}

async fn download(
    file_id: Result<Path<String>, PathRejection>,
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Response, ApiError> {
    let Path(file_id) = file_id.map_err(|rejection| {
        tracing::debug!(error = %rejection, "undecodable file id");
        ApiError::NotFound
    })?;
    let Ok(file_id) = file_id.parse::<FileId>() else {
        tracing::debug!(%file_id, "not a file id");
        return Err(ApiError::NotFound);
    };

    let bytes = storage.take(&file_id).await?;
    tracing::info!(%file_id, size = bytes.len(), "served and removed file");

    Ok((
        [(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())],
        bytes,
    )
        .into_response())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
