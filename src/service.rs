use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum_server::Handle;
use ipc_client::IpcClient;
use tokio::signal;
use tracing::{info, warn};

use crate::{
    config::GatewayConfig,
    routes::{create_routes, ClientSlot, RouteState},
};

pub struct Service {
    pub config: GatewayConfig,
    pub route_state: RouteState,
}

impl Service {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = match config.credentials() {
            Some((node_address, private_key)) => {
                info!(
                    node_address = %node_address,
                    private_key_len = private_key.len(),
                    "creating client from configured credentials"
                );
                let client = IpcClient::connect(node_address, private_key, &config.cli_path)
                    .context("error initializing client from configured credentials")?;
                info!(address = %client.credentials().masked_address(), "client ready");
                Some(client)
            }
            None => {
                warn!("no wallet configured, connect one via /admin/wallet");
                None
            }
        };

        let route_state = RouteState {
            client: Arc::new(ClientSlot::new(client)),
            cli_path: config.cli_path.clone(),
            download_dir: config.download_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        };

        Ok(Self {
            config,
            route_state,
        })
    }

    pub async fn start(&self) -> Result<()> {
        let handle = Handle::new();
        let handle_sh = handle.clone();
        tokio::spawn(async move {
            shutdown_signal(handle_sh).await;
            info!("graceful shutdown signal received, shutting down server gracefully");
        });

        let addr: SocketAddr = self.config.listen_addr.parse()?;
        info!(
            cli_path = %self.config.cli_path.display(),
            download_dir = %self.config.download_dir.display(),
            "gateway api listening on {}", self.config.listen_addr
        );
        let routes = create_routes(self.route_state.clone(), &self.config);
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    handle.graceful_shutdown(None);
    info!("signal received, shutting down server gracefully");
}
