//! Flat records handed to the host as JSON.

use serde::Serialize;
use yt_dlp::{Format, VideoInfo};

pub const UNKNOWN_TITLE: &str = "unknown_video";

/// One downloadable stream variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub format_id: String,
    pub ext: String,
    /// `"audio only"` when the format carries no video.
    pub resolution: String,
    /// Total bitrate in kbps, 0 if unknown.
    pub bitrate: u64,
    /// Bytes, exact when known, else approximate, else 0.
    pub size: u64,
    pub vcodec: String,
    pub acodec: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoInfoRecord {
    pub title: String,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatDescriptor>
}

pub fn extract_format_info(format: &Format) -> FormatDescriptor {
    let resolution = if format.has_video() {
        format.resolution.clone().unwrap_or_else(|| "unknown".to_string())
    } else {
        "audio only".to_string()
    };

    FormatDescriptor {
        format_id: format.format_id.clone().unwrap_or_else(|| "unknown".to_string()),
        ext: format.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        resolution,
        bitrate: format
            .tbr
            .filter(|t| t.is_finite() && *t > 0.0)
            .map_or(0, |t| t as u64),
        size: format.estimated_size().unwrap_or(0),
        vcodec: format.vcodec.clone().unwrap_or_else(|| "none".to_string()),
        acodec: format.acodec.clone().unwrap_or_else(|| "none".to_string())
    }
}

impl VideoInfoRecord {
    pub fn from_info(info: &VideoInfo) -> Self {
        Self {
            title: info.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            thumbnail: info.thumbnail.clone(),
            formats: info.formats.iter().map(extract_format_info).collect()
        }
    }

    /// Returned in place of an error when metadata cannot be fetched.
    pub fn empty() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            thumbnail: None,
            formats: Vec::new()
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize video info: {}", e);
            EMPTY_RECORD_JSON.to_string()
        })
    }
}

const EMPTY_RECORD_JSON: &str = r#"{"title":"unknown_video","thumbnail":null,"formats":[]}"#;
