use axum::extract::State;

use crate::controllers::RootController;
use crate::routers::AppState;

pub async fn root_route() -> impl axum::response::IntoResponse {
    RootController::root().await
}

pub async fn health_check_route(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    RootController::health_check(state.stream.extractor()).await
}
