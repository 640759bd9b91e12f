use axum::{
    body,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use bytes::Bytes;
use ipc_client::{normalize_file_name, CommandOutput, IpcClient};
use tracing::{info, warn};

use super::routes_state::RouteState;
use crate::http_objects::{ApiResponse, ErrorResponse, GatewayAPIError, UploadFromPathRequest};

const UPLOAD_FIELDS: [&str; 2] = ["file", "file1"];
const TEMP_DIR_PREFIX: &str = "akave-";
const FALLBACK_FILE_NAME: &str = "upload";

/// List files in a bucket
#[utoipa::path(
    get,
    path = "/buckets/{bucket}/files",
    tag = "files",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Files in the bucket"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn list_files(
    Path(bucket): Path<String>,
    State(state): State<RouteState>,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    let output = client.list_files(&bucket).await?;
    Ok(ApiResponse::ok(output))
}

/// Get file metadata
#[utoipa::path(
    get,
    path = "/buckets/{bucket}/files/{file}",
    tag = "files",
    params(
        ("bucket" = String, Path, description = "Bucket name"),
        ("file" = String, Path, description = "File name"),
    ),
    responses(
        (status = 200, description = "File metadata"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn file_info(
    Path((bucket, file)): Path<(String, String)>,
    State(state): State<RouteState>,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    let output = client.file_info(&bucket, &file).await?;
    Ok(ApiResponse::ok(output))
}

struct Upload {
    file_name: String,
    data: Bytes,
}

/// Upload a file
///
/// Accepts either a multipart form with a `file` (or `file1`) field, or a
/// JSON body naming a file already on the gateway host.
#[utoipa::path(
    post,
    path = "/buckets/{bucket}/files",
    tag = "files",
    params(("bucket" = String, Path, description = "Bucket name")),
    request_body(content = UploadFromPathRequest, description = "multipart/form-data with a file field, or JSON with filePath"),
    responses(
        (status = 200, description = "File uploaded"),
        (status = BAD_REQUEST, description = "No file or filePath provided", body = ErrorResponse),
        (status = PAYLOAD_TOO_LARGE, description = "File exceeds the upload limit", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn upload_file(
    Path(bucket): Path<String>,
    State(state): State<RouteState>,
    request: Request,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    info!(bucket = %bucket, "Processing file upload request");

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let output = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| GatewayAPIError::new(e.status(), &e.body_text()))?;
        let upload = read_upload(multipart, state.max_upload_bytes)
            .await?
            .ok_or_else(no_file_provided)?;
        upload_buffer(&client, &bucket, upload).await?
    } else {
        let body = body::to_bytes(request.into_body(), state.max_upload_bytes)
            .await
            .map_err(|e| GatewayAPIError::bad_request(&e.to_string()))?;
        let file_path = parse_upload_path(&body)?.ok_or_else(no_file_provided)?;
        info!(bucket = %bucket, file_path = %file_path, "uploading file from path");
        client
            .upload_file(&bucket, std::path::Path::new(&file_path))
            .await?
    };

    Ok(ApiResponse::ok(output))
}

fn no_file_provided() -> GatewayAPIError {
    GatewayAPIError::bad_request("No file or filePath provided")
}

fn parse_upload_path(body: &[u8]) -> Result<Option<String>, GatewayAPIError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: UploadFromPathRequest =
        serde_json::from_slice(body).map_err(|e| GatewayAPIError::bad_request(&e.to_string()))?;
    Ok(request.file_path.filter(|p| !p.is_empty()))
}

/// Pull the uploaded file out of the form. `file` wins over `file1`.
async fn read_upload(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<Option<Upload>, GatewayAPIError> {
    let mut upload: Option<(usize, Upload)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayAPIError::new(e.status(), &e.body_text()))?
    {
        let Some(rank) = field
            .name()
            .and_then(|name| UPLOAD_FIELDS.iter().position(|f| *f == name))
        else {
            continue;
        };
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILE_NAME)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| GatewayAPIError::new(e.status(), &e.body_text()))?;
        if data.len() > max_upload_bytes {
            return Err(GatewayAPIError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "File exceeds the upload limit",
            ));
        }
        if upload.as_ref().map_or(true, |(current, _)| rank < *current) {
            upload = Some((rank, Upload { file_name, data }));
        }
    }
    Ok(upload.map(|(_, upload)| upload))
}

/// Stage the buffer in a fresh temp dir, upload it, then remove the dir.
async fn upload_buffer(
    client: &IpcClient,
    bucket: &str,
    upload: Upload,
) -> Result<CommandOutput, GatewayAPIError> {
    let temp_dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir()
        .map_err(|e| GatewayAPIError::internal_error(e.into()))?;
    let path = temp_dir.path().join(normalize_file_name(&upload.file_name));
    info!(
        bucket = %bucket,
        file_name = %upload.file_name,
        size = upload.data.len(),
        "uploading file from form data"
    );

    let result = match tokio::fs::write(&path, &upload.data).await {
        Ok(()) => client.upload_file(bucket, &path).await.map_err(Into::into),
        Err(e) => Err(GatewayAPIError::internal_error(e.into())),
    };

    let temp_path = temp_dir.path().to_path_buf();
    if let Err(e) = temp_dir.close() {
        warn!(path = %temp_path.display(), error = %e, "failed to remove temp upload dir");
    }
    result
}
