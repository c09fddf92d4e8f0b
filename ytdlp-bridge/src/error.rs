#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    YtDlp(#[from] yt_dlp::Error),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error)
}

pub type Result<T> = std::result::Result<T, DownloadError>;
