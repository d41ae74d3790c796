use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::controllers::{ProxyController, StreamController};

mod proxy;
mod root;
mod stream;

pub use proxy::proxy_route;
pub use root::{health_check_route, root_route};
pub use stream::stream_route;

#[derive(Clone)]
pub struct AppState {
    pub stream: Arc<StreamController>,
    pub proxy: Arc<ProxyController>,
}

/// First value of a repeated query key, like `URLSearchParams::get`.
pub fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_route))
        .route("/health", get(health_check_route))
        .route("/api/stream", get(stream_route))
        .route("/api/proxy", get(proxy_route))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
