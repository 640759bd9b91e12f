use hyper::Request;
use nanoid::nanoid;
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Opens one span per request carrying a fresh request id.
#[derive(Clone)]
pub struct GatewayRequestSpan {
    env: String,
}

impl GatewayRequestSpan {
    pub fn new(env: &str) -> Self {
        Self {
            env: env.to_string(),
        }
    }
}

impl<B> MakeSpan<B> for GatewayRequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            env = %self.env,
            request_id = %nanoid!(),
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}
