use axum::{extract::State, Json};
use ipc_client::IpcClient;
use tracing::info;

use super::routes_state::RouteState;
use crate::http_objects::{
    AdminStatus,
    ApiResponse,
    ConnectWalletRequest,
    Disconnected,
    ErrorResponse,
    GatewayAPIError,
    WalletInfo,
};

/// Wallet connection status
#[utoipa::path(
    get,
    path = "/admin/status",
    tag = "admin",
    responses(
        (status = 200, description = "Connection status", body = AdminStatus),
    ),
)]
pub async fn status(State(state): State<RouteState>) -> Json<ApiResponse<AdminStatus>> {
    let client = state.client.current().await;
    ApiResponse::ok(AdminStatus {
        connected: client.is_some(),
        address: client.as_ref().map(|c| c.credentials().masked_address()),
        node_address: client.as_ref().map(|c| c.node_address().to_string()),
    })
}

/// Connect a wallet, replacing the active one
#[utoipa::path(
    post,
    path = "/admin/wallet",
    tag = "admin",
    request_body = ConnectWalletRequest,
    responses(
        (status = 200, description = "Wallet connected", body = WalletInfo),
        (status = BAD_REQUEST, description = "Missing or invalid credentials", body = ErrorResponse),
    ),
)]
pub async fn connect_wallet(
    State(state): State<RouteState>,
    Json(request): Json<ConnectWalletRequest>,
) -> Result<Json<ApiResponse<WalletInfo>>, GatewayAPIError> {
    let (Some(private_key), Some(node_address)) = (
        request.private_key.filter(|k| !k.is_empty()),
        request.node_address.filter(|n| !n.is_empty()),
    ) else {
        return Err(GatewayAPIError::bad_request(
            "privateKey and nodeAddress are required",
        ));
    };

    let client = IpcClient::connect(&node_address, &private_key, &state.cli_path)
        .map_err(|e| GatewayAPIError::bad_request(&e.to_string()))?;
    let client = state.client.replace(client).await;

    let address = client.credentials().masked_address();
    info!(address = %address, node_address = %node_address, "wallet connected");
    Ok(ApiResponse::ok(WalletInfo {
        address,
        node_address,
    }))
}

/// Disconnect the active wallet
#[utoipa::path(
    post,
    path = "/admin/disconnect",
    tag = "admin",
    responses(
        (status = 200, description = "Wallet disconnected", body = Disconnected),
    ),
)]
pub async fn disconnect(State(state): State<RouteState>) -> Json<ApiResponse<Disconnected>> {
    state.client.clear().await;
    info!("wallet disconnected");
    ApiResponse::ok(Disconnected { disconnected: true })
}
