use axum::{
    extract::{Path, State},
    Json,
};
use ipc_client::CommandOutput;
use tracing::info;

use super::routes_state::RouteState;
use crate::http_objects::{ApiResponse, CreateBucketRequest, ErrorResponse, GatewayAPIError};

/// Create a bucket
#[utoipa::path(
    post,
    path = "/buckets",
    tag = "buckets",
    request_body = CreateBucketRequest,
    responses(
        (status = 200, description = "Bucket created"),
        (status = BAD_REQUEST, description = "Missing bucket name", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn create_bucket(
    State(state): State<RouteState>,
    Json(request): Json<CreateBucketRequest>,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    let Some(bucket) = request.bucket_name.filter(|b| !b.is_empty()) else {
        return Err(GatewayAPIError::bad_request("bucketName is required"));
    };
    info!(bucket = %bucket, "creating bucket");
    let output = client.create_bucket(&bucket).await?;
    Ok(ApiResponse::ok(output))
}

/// List buckets
#[utoipa::path(
    get,
    path = "/buckets",
    tag = "buckets",
    responses(
        (status = 200, description = "Buckets visible to the connected wallet"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn list_buckets(
    State(state): State<RouteState>,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    let output = client.list_buckets().await?;
    Ok(ApiResponse::ok(output))
}

/// View a bucket
#[utoipa::path(
    get,
    path = "/buckets/{bucket}",
    tag = "buckets",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket details"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn view_bucket(
    Path(bucket): Path<String>,
    State(state): State<RouteState>,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    let output = client.view_bucket(&bucket).await?;
    Ok(ApiResponse::ok(output))
}

/// Delete a bucket
#[utoipa::path(
    delete,
    path = "/buckets/{bucket}",
    tag = "buckets",
    params(("bucket" = String, Path, description = "Bucket name")),
    responses(
        (status = 200, description = "Bucket deleted"),
        (status = INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse)
    ),
)]
pub async fn delete_bucket(
    Path(bucket): Path<String>,
    State(state): State<RouteState>,
) -> Result<Json<ApiResponse<CommandOutput>>, GatewayAPIError> {
    let client = state.client.require().await?;
    info!(bucket = %bucket, "deleting bucket");
    let output = client.delete_bucket(&bucket).await?;
    Ok(ApiResponse::ok(output))
}
