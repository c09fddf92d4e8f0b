use std::path::{Path, PathBuf};

use yt_dlp::YtDlp;

/// yt-dlp settings, read from `YTDLP_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub ytdlp_path: Option<PathBuf>,
    pub cookies_file: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    /// One extractor argument per line.
    pub extractor_args: String,
    pub deno_path: Option<PathBuf>
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };

        Self {
            ytdlp_path: path("YTDLP_PATH"),
            cookies_file: path("YTDLP_COOKIES_FILE"),
            ffmpeg_path: path("YTDLP_FFMPEG_PATH"),
            extractor_args: lookup("YTDLP_EXTRACTOR_ARGS").unwrap_or_default(),
            deno_path: path("YTDLP_DENO_PATH")
        }
    }

    pub fn into_client(self) -> YtDlp {
        let mut yt_dlp = match self.ytdlp_path {
            Some(ref path) => {
                tracing::info!("Using custom yt-dlp path: {}", path.display());
                YtDlp::with_binary(path)
            }
            None => YtDlp::new()
        };

        let parsed = parse_extractor_args(&self.extractor_args);
        if !parsed.is_empty() {
            yt_dlp.set_extra_args(parsed);
        }

        if let Some(path) = self.cookies_file {
            if path.exists() {
                tracing::info!("Using cookies file: {}", path.display());
                yt_dlp.set_cookies_file(Some(path));
            } else {
                tracing::warn!("Cookies file not found, ignoring: {}", path.display());
            }
        }

        if let Some(path) = self.ffmpeg_path {
            tracing::info!("Using custom ffmpeg path: {}", path.display());
            yt_dlp.set_ffmpeg_location(Some(path));
        }

        if let Some(parent) = self.deno_path.as_deref().and_then(Path::parent) {
            yt_dlp.set_env("PATH_PREPEND".to_string(), parent.to_string_lossy().to_string());
            tracing::info!("Using custom deno path: {}", parent.display());
        }

        yt_dlp
    }
}

pub fn parse_extractor_args(input: &str) -> Vec<String> {
    let joined: Vec<&str> = input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if joined.is_empty() {
        return Vec::new();
    }
    vec![
        "--extractor-args".to_string(),
        joined.join(";")
    ]
}
