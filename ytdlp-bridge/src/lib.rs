//! Host-facing bridge over yt-dlp.
//!
//! Two blocking calls make up the whole surface a host application needs:
//!
//! - [`get_video_info`] returns a JSON record with the title, thumbnail and
//!   every available format. It never fails; an empty `formats` list means
//!   the metadata could not be fetched.
//! - [`download_format`] downloads one format to a path and relays byte
//!   progress to a host [`ProgressReceiver`]. Download failures are returned;
//!   receiver failures are only logged.
//!
//! ```no_run
//! use ytdlp_bridge::{MethodTable, download_format, get_video_info, logging};
//!
//! logging::init();
//! let info = get_video_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
//! println!("{info}");
//!
//! let receiver = MethodTable::on_progress(|downloaded, total| {
//!     println!("{downloaded}/{total}");
//! });
//! download_format(
//!     "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!     "18",
//!     "/tmp/video.mp4",
//!     true,
//!     &receiver
//! )?;
//! # Ok::<(), ytdlp_bridge::DownloadError>(())
//! ```

mod backend;
mod bridge;
pub mod config;
pub mod dispatch;
mod error;
mod format_info;
pub mod logging;
mod receiver;

pub use backend::{DownloadRequest, EventStream, MediaBackend};
pub use bridge::{Bridge, download_format, get_video_info};
pub use config::BridgeConfig;
pub use error::{DownloadError, Result};
pub use format_info::{FormatDescriptor, UNKNOWN_TITLE, VideoInfoRecord, extract_format_info};
pub use receiver::{
    CallError, CallResult, FnReceiver, MethodTable, ON_PROGRESS, ProgressReceiver, from_fn
};
