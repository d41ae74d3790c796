use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::routers::{AppState, first_param};

pub async fn stream_route(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    state.stream.get_stream(first_param(&params, "video")).await
}
