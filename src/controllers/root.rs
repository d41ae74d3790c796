use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::controllers::extractor::MetadataExtractor;

pub struct RootController;

impl RootController {
    pub async fn root() -> Response {
        (
            StatusCode::OK,
            Json(json!({
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "endpoints": ["/api/stream?video=", "/api/proxy?url=", "/health"],
            })),
        )
            .into_response()
    }

    /// Always 200; the extractor block reports whether yt-dlp can be run.
    pub async fn health_check(extractor: &dyn MetadataExtractor) -> Response {
        let version = extractor.version().await;
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "extractor": {
                    "available": version.is_some(),
                    "version": version,
                },
            })),
        )
            .into_response()
    }
}
