//! Async Rust wrapper for the yt-dlp CLI.
//!
//! Metadata is read from `--dump-json`, downloads report progress through a
//! machine-readable progress template so callers see exact byte counts.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//! use yt_dlp::{DownloadEvent, DownloadOptions, OutputFormat, YtDlp};
//!
//! #[tokio::main]
//! async fn main() -> yt_dlp::Result<()> {
//!     let client = YtDlp::new();
//!
//!     let version = client.check_binary().await?;
//!     println!("yt-dlp version: {}", version);
//!
//!     let info = client.get_video_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     println!("Title: {:?}, {} formats", info.title, info.formats.len());
//!
//!     let options = DownloadOptions::new().format(OutputFormat::Custom("18".into()));
//!     let stream = client.download_with_progress(
//!         "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!         "video.mp4",
//!         &options
//!     );
//!     tokio::pin!(stream);
//!     while let Some(event) = stream.next().await {
//!         if let DownloadEvent::Progress(p) = event? {
//!             println!("{}/{}", p.downloaded_bytes, p.total_or_estimate());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod command;
pub mod error;
pub mod types;

pub use client::YtDlp;
pub use error::{Error, Result};
pub use types::{
    DownloadEvent, DownloadOptions, DownloadProgress, Format, OutputFormat, ProgressStatus,
    VideoInfo
};
