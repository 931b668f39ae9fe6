use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info};

use crate::analysis::summarize;
use crate::ingest::ingest;
use crate::models::{AppState, DatasetRecord, StatusMessage};
use crate::types::{AppError, AppResult};

pub const NO_DATASET_MESSAGE: &str = "No dataset uploaded yet";
const FILE_FIELD: &str = "file";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload_dataset).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/dataset", get(get_current_dataset).delete(delete_dataset))
        .route("/dataset/summary", get(get_dataset_summary))
}

/// Oversized bodies keep their 413; every other multipart problem is a bad request.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(err.body_text())
    }
}

/// POST /upload - multipart body with the dataset in the `file` field
async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DatasetRecord>> {
    info!("Dataset upload request received");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().map(|name| name.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;

        let record = ingest(&state.store, filename, bytes).await?;
        return Ok(Json(record));
    }

    Err(AppError::InvalidInput("No file provided".to_string()))
}

/// GET /dataset - the stored dataset, or a not-found marker
async fn get_current_dataset(State(state): State<AppState>) -> AppResult<Response> {
    match state.store.load().await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Ok(Json(StatusMessage::failed(NO_DATASET_MESSAGE)).into_response()),
    }
}

/// DELETE /dataset - always acknowledges
async fn delete_dataset(State(state): State<AppState>) -> AppResult<Json<StatusMessage>> {
    state.store.clear().await?;
    Ok(Json(StatusMessage::ok("Dataset cleared")))
}

/// GET /dataset/summary - totals, closure rate and filter values
async fn get_dataset_summary(State(state): State<AppState>) -> AppResult<Response> {
    match state.store.load().await? {
        Some(record) => Ok(Json(summarize(&record)).into_response()),
        None => Ok(Json(StatusMessage::failed(NO_DATASET_MESSAGE)).into_response()),
    }
}
