use anyhow::anyhow;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::RANGE, HeaderMap},
    response::Response,
};
use tracing::info;

use super::routes_state::RouteState;
use crate::{http_objects::GatewayAPIError, streaming};

/// Download a file
///
/// Fetches the file through the CLI into the download directory, then
/// streams it back. A single `Range: bytes=start-end` is honoured.
#[utoipa::path(
    get,
    path = "/buckets/{bucket}/files/{file}/download",
    tag = "files",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("file" = String, Path, description = "File name"),
    ),
    responses(
        (status = 200, description = "Whole file", content_type = "application/octet-stream"),
        (status = 206, description = "Requested byte range", content_type = "application/octet-stream"),
        (status = RANGE_NOT_SATISFIABLE, description = "Requested range not satisfiable"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error")
    ),
)]
pub async fn download_file(
    Path((bucket, file)): Path<(String, String)>,
    State(state): State<RouteState>,
    headers: HeaderMap,
) -> Result<Response<Body>, GatewayAPIError> {
    let client = state.client.require().await?;
    info!(bucket = %bucket, file = %file, "Processing download request");

    tokio::fs::create_dir_all(&state.download_dir)
        .await
        .map_err(|e| {
            GatewayAPIError::internal_error(anyhow!("failed to create download dir: {}", e))
        })?;
    let path = client
        .download_file(&bucket, &file, &state.download_dir)
        .await?;

    let range = headers.get(RANGE).and_then(|v| v.to_str().ok());
    streaming::serve_file(&path, &file, range).await
}
