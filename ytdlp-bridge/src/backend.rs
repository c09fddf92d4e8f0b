use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio_stream::Stream;
use yt_dlp::{DownloadEvent, DownloadOptions, OutputFormat, VideoInfo, YtDlp};

pub type EventStream = Pin<Box<dyn Stream<Item = yt_dlp::Result<DownloadEvent>> + Send>>;

/// What the host asked to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    pub output_path: PathBuf,
    pub overwrite: bool
}

impl DownloadRequest {
    pub fn new(
        url: impl Into<String>,
        format_id: impl Into<String>,
        output_path: impl Into<PathBuf>,
        overwrite: bool
    ) -> Self {
        Self {
            url: url.into(),
            format_id: format_id.into(),
            output_path: output_path.into(),
            overwrite
        }
    }

    pub fn options(&self) -> DownloadOptions {
        DownloadOptions::new()
            .format(OutputFormat::Custom(self.format_id.clone()))
            .force_overwrites(self.overwrite)
    }
}

/// The media library the bridge drives.
pub trait MediaBackend {
    fn extract_info(
        &self,
        url: &str,
        format: &OutputFormat
    ) -> impl Future<Output = yt_dlp::Result<VideoInfo>>;

    fn download(&self, request: &DownloadRequest) -> EventStream;
}

impl MediaBackend for YtDlp {
    async fn extract_info(&self, url: &str, format: &OutputFormat) -> yt_dlp::Result<VideoInfo> {
        self.get_video_info_with_format(url, format).await
    }

    fn download(&self, request: &DownloadRequest) -> EventStream {
        self.download_with_progress(&request.url, &request.output_path, &request.options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_options() {
        let request = DownloadRequest::new("https://example.com/v", "251", "/tmp/a.webm", true);
        let options = request.options();
        assert_eq!(options.format.as_arg().as_deref(), Some("251"));
        assert!(options.force_overwrites);
        assert!(options.cookies_file.is_none());
    }
}
