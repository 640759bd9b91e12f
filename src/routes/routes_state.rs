use std::{path::PathBuf, sync::Arc};

use ipc_client::IpcClient;
use tokio::sync::RwLock;

use crate::http_objects::GatewayAPIError;

pub const CLIENT_NOT_CONFIGURED: &str = "Client not configured. Connect a wallet first.";

/// Holds the client built from the active wallet, if any.
///
/// Reconnecting swaps the whole client; handlers take an `Arc` snapshot at
/// the start of a call and keep it until they finish.
#[derive(Default)]
pub struct ClientSlot {
    client: RwLock<Option<Arc<IpcClient>>>,
}

impl ClientSlot {
    pub fn new(client: Option<IpcClient>) -> Self {
        Self {
            client: RwLock::new(client.map(Arc::new)),
        }
    }

    pub async fn current(&self) -> Option<Arc<IpcClient>> {
        self.client.read().await.clone()
    }

    pub async fn require(&self) -> Result<Arc<IpcClient>, GatewayAPIError> {
        self.current()
            .await
            .ok_or_else(|| GatewayAPIError::internal_error_str(CLIENT_NOT_CONFIGURED))
    }

    pub async fn replace(&self, client: IpcClient) -> Arc<IpcClient> {
        let client = Arc::new(client);
        *self.client.write().await = Some(client.clone());
        client
    }

    pub async fn clear(&self) {
        self.client.write().await.take();
    }
}

#[derive(Clone)]
pub struct RouteState {
    pub client: Arc<ClientSlot>,
    pub cli_path: PathBuf,
    pub download_dir: PathBuf,
    pub max_upload_bytes: usize,
}
