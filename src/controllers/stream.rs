use std::sync::Arc;

use axum::{
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info};

use crate::controllers::extractor::{ExtractError, MetadataExtractor};
use crate::models::stream::{Format, StreamResponse};

const VIDEO_ID_LEN: usize = 11;
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Video parameter is required")]
    MissingVideo,

    #[error("Invalid YouTube URL or video ID")]
    InvalidVideo,

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("No audio format found")]
    NoAudioFormat,
}

impl ResolveError {
    fn status(&self) -> StatusCode {
        match self {
            ResolveError::MissingVideo | ResolveError::InvalidVideo => StatusCode::BAD_REQUEST,
            ResolveError::Extract(ExtractError::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
            ResolveError::Extract(_) | ResolveError::NoAudioFormat => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Accepts `youtube.com/watch?v=<id>` and `youtu.be/<id>`, with optional
/// `http(s)://` and `www.` prefixes and nothing after the id.
pub fn is_valid_youtube_url(input: &str) -> bool {
    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    rest.strip_prefix("youtube.com/watch?v=")
        .or_else(|| rest.strip_prefix("youtu.be/"))
        .is_some_and(is_valid_video_id)
}

/// Turns the `video` query value into the URL handed to the extractor.
pub fn video_url(query: Option<&str>) -> Result<String, ResolveError> {
    let query = query.filter(|q| !q.is_empty()).ok_or(ResolveError::MissingVideo)?;
    if is_valid_youtube_url(query) {
        Ok(query.to_string())
    } else if is_valid_video_id(query) {
        Ok(format!("{}{}", WATCH_URL_PREFIX, query))
    } else {
        Err(ResolveError::InvalidVideo)
    }
}

/// Highest `abr` among audio-only formats that carry a URL. Formats without a
/// bitrate rank last; on a tie the earlier format wins.
pub fn select_audio_format(formats: &[Format]) -> Option<&Format> {
    formats
        .iter()
        .filter(|f| f.is_audio_only() && f.url.as_deref().is_some_and(|u| !u.is_empty()))
        .fold(None, |best: Option<&Format>, f| match best {
            Some(b) if rank(f) <= rank(b) => Some(b),
            _ => Some(f),
        })
}

fn rank(format: &Format) -> f64 {
    format.abr.filter(|abr| abr.is_finite()).unwrap_or(f64::NEG_INFINITY)
}

pub struct StreamController {
    extractor: Arc<dyn MetadataExtractor>,
}

impl StreamController {
    pub fn new(extractor: Arc<dyn MetadataExtractor>) -> Self {
        StreamController { extractor }
    }

    pub fn extractor(&self) -> &dyn MetadataExtractor {
        self.extractor.as_ref()
    }

    pub async fn resolve(&self, query: Option<&str>) -> Result<StreamResponse, ResolveError> {
        let url = video_url(query)?;
        let info = self.extractor.extract(&url).await?;

        let format = select_audio_format(&info.formats).ok_or(ResolveError::NoAudioFormat)?;
        info!(
            "Resolved {} to format {} ({}, {:?} kbps)",
            info.id,
            format.format_id.as_deref().unwrap_or("?"),
            format.ext.as_deref().unwrap_or("?"),
            format.abr
        );

        Ok(StreamResponse {
            url: format.url.clone().unwrap_or_default(),
            title: info.title,
            content_type: format.content_type().to_string(),
        })
    }

    pub async fn get_stream(&self, query: Option<&str>) -> Response {
        match self.resolve(query).await {
            Ok(stream) => (
                StatusCode::OK,
                [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
                Json(stream),
            )
                .into_response(),
            Err(e) => {
                if e.status().is_server_error() {
                    error!("Streaming error: {}", e);
                }
                e.into_response()
            }
        }
    }
}
