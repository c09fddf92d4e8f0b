use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("yt-dlp binary not found: {0}")]
    BinaryNotFound(PathBuf),

    #[error("yt-dlp binary not executable: {0}")]
    BinaryNotExecutable(PathBuf),

    #[error("failed to execute yt-dlp: {0}")]
    ExecutionFailed(#[from] std::io::Error),

    #[error("yt-dlp command failed with exit code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("failed to parse JSON output: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("no formats available")]
    NoFormatsAvailable
}

impl Error {
    /// Spawn errors for a missing binary surface as `BinaryNotFound`.
    pub(crate) fn from_spawn(err: std::io::Error, binary: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::BinaryNotFound(binary.to_path_buf())
        } else {
            Error::ExecutionFailed(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
