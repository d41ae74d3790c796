// Audio byte-stream proxy
use axum::{
    body::Body,
    extract::Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use crate::secrets::Settings;

const DEFAULT_CONTENT_TYPE: &str = "audio/webm";

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Host not allowed")]
    HostNotAllowed,

    #[error("Failed to fetch audio")]
    Upstream(StatusCode),

    #[error("Failed to proxy audio stream")]
    Request(#[from] reqwest::Error),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl => StatusCode::BAD_REQUEST,
            ProxyError::HostNotAllowed => StatusCode::FORBIDDEN,
            ProxyError::Upstream(status) => *status,
            ProxyError::Request(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

pub struct ProxyController {
    client: Client,
    allowed_hosts: Vec<String>,
}

impl ProxyController {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        // No overall timeout: bodies are long-lived audio streams.
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(settings.proxy_connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(ProxyController {
            client,
            allowed_hosts: settings.proxy_allowed_hosts.clone(),
        })
    }

    fn is_allowed_host(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let host = host.to_lowercase();
        self.allowed_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
    }

    pub fn target(&self, raw: Option<&str>) -> Result<Url, ProxyError> {
        let raw = raw.filter(|r| !r.is_empty()).ok_or(ProxyError::MissingUrl)?;
        let url = Url::parse(raw).map_err(|_| ProxyError::InvalidUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidUrl);
        }
        let host = url.host_str().ok_or(ProxyError::InvalidUrl)?;
        if !self.is_allowed_host(host) {
            return Err(ProxyError::HostNotAllowed);
        }
        Ok(url)
    }

    async fn forward(&self, raw: Option<&str>, headers: &HeaderMap) -> Result<Response, ProxyError> {
        let target = self.target(raw)?;

        let mut request = self.client.get(target.clone());
        if let Some(range) = headers.get(header::RANGE) {
            request = request.header(header::RANGE, range.clone());
        }

        let upstream = request.send().await?;
        let status = upstream.status();
        if !status.is_success() {
            warn!("Upstream {} answered {}", target.host_str().unwrap_or(""), status);
            return Err(ProxyError::Upstream(status));
        }
        debug!(
            "Proxying {} status={} length={:?}",
            target.host_str().unwrap_or(""),
            status,
            upstream.content_length()
        );

        let upstream_headers = upstream.headers();
        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            header::CONTENT_TYPE,
            upstream_headers
                .get(header::CONTENT_TYPE)
                .cloned()
                .unwrap_or(HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
        );
        for name in [header::CONTENT_LENGTH, header::CONTENT_RANGE] {
            if let Some(value) = upstream_headers.get(&name) {
                response_headers.insert(name, value.clone());
            }
        }
        response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let body = Body::from_stream(upstream.bytes_stream());
        Ok((status, response_headers, body).into_response())
    }

    pub async fn proxy_audio(&self, raw: Option<&str>, headers: &HeaderMap) -> Response {
        match self.forward(raw, headers).await {
            Ok(response) => response,
            Err(e) => {
                if let ProxyError::Request(ref source) = e {
                    error!("Proxy error: {}", source);
                }
                e.into_response()
            }
        }
    }
}
