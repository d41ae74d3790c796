use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};

use crate::routers::{AppState, first_param};

pub async fn proxy_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    state.proxy.proxy_audio(first_param(&params, "url"), &headers).await
}
