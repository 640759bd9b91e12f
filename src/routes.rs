use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json,
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod admin;
mod buckets;
mod download;
mod files;
pub mod routes_state;

pub use routes_state::{ClientSlot, RouteState};

use crate::{
    config::GatewayConfig,
    http_objects::{
        AdminStatus,
        ConnectWalletRequest,
        CreateBucketRequest,
        Disconnected,
        ErrorResponse,
        HealthResponse,
        UploadFromPathRequest,
        WalletInfo,
    },
    middleware::GatewayRequestSpan,
};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
        paths(
            health,
            admin::status,
            admin::connect_wallet,
            admin::disconnect,
            buckets::create_bucket,
            buckets::list_buckets,
            buckets::view_bucket,
            buckets::delete_bucket,
            files::list_files,
            files::file_info,
            files::upload_file,
            download::download_file,
        ),
        components(
            schemas(
                ErrorResponse,
                HealthResponse,
                AdminStatus,
                ConnectWalletRequest,
                WalletInfo,
                Disconnected,
                CreateBucketRequest,
                UploadFromPathRequest,
            )
        ),
        tags(
            (name = "akave-gateway", description = "Akave Gateway API")
        )
    )]
struct ApiDoc;

pub fn create_routes(route_state: RouteState, config: &GatewayConfig) -> Router {
    let body_limit = config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(SwaggerUi::new("/docs/swagger").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/admin/status", get(admin::status))
        .route("/admin/wallet", post(admin::connect_wallet))
        .route("/admin/disconnect", post(admin::disconnect))
        .route(
            "/buckets",
            post(buckets::create_bucket).get(buckets::list_buckets),
        )
        .route(
            "/buckets/{bucket}",
            get(buckets::view_bucket).delete(buckets::delete_bucket),
        )
        .route(
            "/buckets/{bucket}/files",
            get(files::list_files).post(files::upload_file),
        )
        .route("/buckets/{bucket}/files/{file}", get(files::file_info))
        .route(
            "/buckets/{bucket}/files/{file}/download",
            get(download::download_file),
        )
        .with_state(route_state)
        .layer(TraceLayer::new_for_http().make_span_with(GatewayRequestSpan::new(&config.env)))
        .layer(cors_layer(&config.cors_origin))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// `*` allows any origin without credentials. Otherwise a comma separated
/// list of origins, with credentials allowed.
fn cors_layer(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::PATCH,
        Method::POST,
        Method::DELETE,
    ]);

    if origins.trim() == "*" {
        return cors.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!(origin, error = %e, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "operations",
    responses(
        (status = 200, description = "Gateway is up", body = HealthResponse),
    ),
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
