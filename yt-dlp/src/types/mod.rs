mod options;
mod progress;
mod video_info;

pub use options::{DownloadOptions, OutputFormat};
pub use progress::{DownloadEvent, DownloadProgress, ProgressStatus};
pub use video_info::{Format, VideoInfo};
