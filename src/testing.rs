use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use ipc_client::{test_support::fake_cli, IpcClient};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    config::GatewayConfig,
    routes::{create_routes, ClientSlot, RouteState},
};

pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_MASKED_ADDRESS: &str = "0xf39F...2266";
pub const TEST_NODE_ADDRESS: &str = "127.0.0.1:5500";

/// A router wired to a fake CLI and a private download directory.
pub struct TestGateway {
    pub dir: TempDir,
    pub state: RouteState,
    router: Router,
}

impl TestGateway {
    /// Gateway with a wallet already connected.
    pub fn new(cli_body: &str) -> Self {
        Self::build(cli_body, true, |_| {})
    }

    pub fn disconnected(cli_body: &str) -> Self {
        Self::build(cli_body, false, |_| {})
    }

    /// Connected gateway with `configure` applied to the config first.
    pub fn configured(cli_body: &str, configure: impl FnOnce(&mut GatewayConfig)) -> Self {
        Self::build(cli_body, true, configure)
    }

    fn build(
        cli_body: &str,
        connected: bool,
        configure: impl FnOnce(&mut GatewayConfig),
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let cli_path = fake_cli(&dir, cli_body);
        let mut config = GatewayConfig {
            cli_path: cli_path.clone(),
            download_dir: dir.path().join("downloads"),
            ..Default::default()
        };
        configure(&mut config);

        let client = connected.then(|| {
            IpcClient::connect(TEST_NODE_ADDRESS, TEST_PRIVATE_KEY, &cli_path).unwrap()
        });
        let state = RouteState {
            client: Arc::new(ClientSlot::new(client)),
            cli_path,
            download_dir: config.download_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        };
        let router = create_routes(state.clone(), &config);

        Self { dir, state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
