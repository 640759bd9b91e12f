use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ipc_client::IpcError;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// Error returned by every handler, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub struct GatewayAPIError {
    status_code: StatusCode,
    message: String,
}

impl GatewayAPIError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
        }
    }

    pub fn internal_error(e: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string().as_str())
    }

    pub fn internal_error_str(e: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[cfg(test)]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for GatewayAPIError {
    fn into_response(self) -> Response {
        error!("API Error: {} - {}", self.status_code, self.message);
        let body = ErrorResponse {
            success: false,
            error: self.message,
        };
        (self.status_code, Json(body)).into_response()
    }
}

impl From<IpcError> for GatewayAPIError {
    fn from(e: IpcError) -> Self {
        match e {
            IpcError::InvalidPrivateKey(_) => Self::bad_request(&e.to_string()),
            _ => Self::internal_error_str(&e.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Success envelope, `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub connected: bool,
    pub address: Option<String>,
    pub node_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectWalletRequest {
    pub private_key: Option<String>,
    pub node_address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    pub node_address: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Disconnected {
    pub disconnected: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    pub bucket_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFromPathRequest {
    pub file_path: Option<String>,
}
