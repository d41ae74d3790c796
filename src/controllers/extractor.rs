// yt-dlp process wrapper
use std::process::Stdio;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::models::stream::VideoInfo;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to run yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("yt-dlp failed: {0}")]
    Failed(String),

    #[error("yt-dlp timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("Failed to parse yt-dlp output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Something that turns a video URL into its metadata and format list.
pub trait MetadataExtractor: Send + Sync {
    fn extract<'a>(&'a self, video_url: &'a str) -> BoxFuture<'a, Result<VideoInfo, ExtractError>>;

    /// Version string of the backing tool, if it can be run at all.
    fn version(&self) -> BoxFuture<'_, Option<String>>;
}

pub struct YtDlp {
    bin: String,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        YtDlp {
            bin: bin.into(),
            timeout,
        }
    }

    fn args(video_url: &str) -> Vec<&str> {
        vec![
            "--dump-single-json",
            "--no-warnings",
            "--no-check-certificate",
            "--prefer-free-formats",
            "--extractor-args",
            "youtube:skip=dash",
            "--",
            video_url,
        ]
    }

    async fn run(&self, video_url: &str) -> Result<VideoInfo, ExtractError> {
        let child = Command::new(&self.bin)
            .args(Self::args(video_url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExtractError::Spawn)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractError::TimedOut(self.timeout))?
            .map_err(ExtractError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("yt-dlp exited with {} for {}", output.status, video_url);
            return Err(ExtractError::Failed(if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            }));
        }

        debug!("yt-dlp_stdout_len={}", output.stdout.len());
        parse_info(&output.stdout)
    }
}

impl MetadataExtractor for YtDlp {
    fn extract<'a>(&'a self, video_url: &'a str) -> BoxFuture<'a, Result<VideoInfo, ExtractError>> {
        Box::pin(self.run(video_url))
    }

    fn version(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            let mut cmd = Command::new(&self.bin);
            cmd.arg("--version").stdin(Stdio::null()).kill_on_drop(true);
            match tokio::time::timeout(VERSION_TIMEOUT, cmd.output()).await {
                Ok(Ok(out)) if out.status.success() => {
                    Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
                }
                _ => None,
            }
        })
    }
}

pub fn parse_info(stdout: &[u8]) -> Result<VideoInfo, ExtractError> {
    Ok(serde_json::from_slice(stdout)?)
}
