use serde::{Deserialize, Serialize};

/// The subset of `yt-dlp --dump-single-json` output the resolver reads.
#[derive(Deserialize, Clone, Debug)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub formats: Vec<Format>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Format {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Average audio bitrate in kbit/s.
    #[serde(default)]
    pub abr: Option<f64>,
}

impl Format {
    pub fn is_audio_only(&self) -> bool {
        let has_audio = matches!(self.acodec.as_deref(), Some(codec) if codec != "none");
        has_audio && self.vcodec.as_deref() == Some("none")
    }

    pub fn content_type(&self) -> &'static str {
        match self.acodec.as_deref() {
            Some("opus") => "audio/ogg",
            _ => "audio/mp4",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub url: String,
    pub title: String,
    pub content_type: String,
}
