//! The two host entry points: info fetch and format download.

use std::path::PathBuf;

use tokio_stream::StreamExt;
use tracing::Instrument;
use yt_dlp::{DownloadEvent, DownloadProgress, OutputFormat, ProgressStatus, YtDlp};

use crate::backend::{DownloadRequest, MediaBackend};
use crate::config::BridgeConfig;
use crate::dispatch::{Phase, available_members, dispatch};
use crate::error::{DownloadError, Result};
use crate::format_info::VideoInfoRecord;
use crate::receiver::ProgressReceiver;

#[derive(Debug, Clone)]
pub struct Bridge<B = YtDlp> {
    backend: B
}

impl Bridge<YtDlp> {
    pub fn from_config(config: BridgeConfig) -> Self {
        Self::new(config.into_client())
    }

    pub fn from_env() -> Self {
        Self::from_config(BridgeConfig::from_env())
    }
}

impl<B: MediaBackend> Bridge<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Metadata and format list for `url`. Never fails: on any error the
    /// result is [`VideoInfoRecord::empty`], so an empty `formats` list is
    /// the failure signal.
    pub async fn fetch_video_info(&self, url: &str) -> VideoInfoRecord {
        let span = tracing::info_span!("get_video_info", url = %url);
        async {
            match self.backend.extract_info(url, &OutputFormat::BestVideoAudio).await {
                Ok(info) => {
                    let record = VideoInfoRecord::from_info(&info);
                    tracing::info!("Fetched info for {}: {} formats", url, record.formats.len());
                    record
                }
                Err(e) => {
                    tracing::error!("Error fetching info for {}: {}", url, e);
                    VideoInfoRecord::empty()
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Downloads one format, relaying progress to `receiver`.
    ///
    /// Receiver failures are logged and never abort the download. Failures of
    /// the download itself are logged and returned.
    pub async fn run_download<R: ProgressReceiver + ?Sized>(
        &self,
        request: &DownloadRequest,
        receiver: &R
    ) -> Result<()> {
        let url = request.url.as_str();
        let span = tracing::info_span!("download_format", url = %url);
        async {
            tracing::info!("Setting up download for {} with format {}", url, request.format_id);
            tracing::info!("Progress receiver type: {}", receiver.type_name());
            tracing::info!("Available methods: {:?}", available_members(receiver));

            tracing::info!(
                "Starting download: {} format {} to {}",
                url,
                request.format_id,
                request.output_path.display()
            );

            let mut events = self.backend.download(request);
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => handle_event(url, &event, receiver),
                    Err(e) => {
                        tracing::error!("Download failed for {}: {}", url, e);
                        return Err(DownloadError::from(e));
                    }
                }
            }

            tracing::info!("Download completed for {}", url);
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Blocking form of [`Bridge::fetch_video_info`], serialized to JSON.
    ///
    /// Must not be called from inside an async runtime.
    pub fn get_video_info(&self, url: &str) -> String {
        let record = match runtime() {
            Ok(rt) => rt.block_on(self.fetch_video_info(url)),
            Err(e) => {
                tracing::error!("Error fetching info for {}: {}", url, e);
                VideoInfoRecord::empty()
            }
        };
        record.to_json()
    }

    /// Blocking form of [`Bridge::run_download`].
    ///
    /// Must not be called from inside an async runtime.
    pub fn download_format<R: ProgressReceiver + ?Sized>(
        &self,
        url: &str,
        format_id: &str,
        output_path: impl Into<PathBuf>,
        overwrite: bool,
        receiver: &R
    ) -> Result<()> {
        let request = DownloadRequest::new(url, format_id, output_path, overwrite);
        let rt = runtime().map_err(|e| {
            tracing::error!("Download failed for {}: {}", url, e);
            DownloadError::Runtime(e)
        })?;
        rt.block_on(self.run_download(&request, receiver))
    }
}

/// Maps one collaborator event onto the progress-hook contract.
fn handle_event<R: ProgressReceiver + ?Sized>(url: &str, event: &DownloadEvent, receiver: &R) {
    match event {
        DownloadEvent::Progress(progress) => handle_progress(url, progress, receiver),
        DownloadEvent::Error { message } => {
            tracing::error!("Download error for {}: {}", url, message);
        }
        DownloadEvent::Warning { message } => tracing::warn!("{}", message),
        DownloadEvent::DownloadStarted { filename } => {
            tracing::debug!("yt-dlp output: Destination: {}", filename);
        }
        DownloadEvent::MergingFormats => tracing::debug!("yt-dlp output: merging formats"),
        DownloadEvent::PostProcessing { status } => tracing::debug!("yt-dlp output: {}", status),
        DownloadEvent::Completed { filename } => {
            tracing::debug!("yt-dlp output: wrote {}", filename);
        }
    }
}

fn handle_progress<R: ProgressReceiver + ?Sized>(
    url: &str,
    progress: &DownloadProgress,
    receiver: &R
) {
    let total = progress.total_or_estimate();
    match progress.status {
        ProgressStatus::Downloading => {
            if total > 0 {
                let downloaded = progress.downloaded_bytes;
                tracing::info!("Progress for {}: {}/{} bytes", url, downloaded, total);
                dispatch(receiver, downloaded, total, Phase::Downloading);
            }
        }
        ProgressStatus::Finished => {
            tracing::info!("Download finished for {}: {} bytes", url, total);
            dispatch(receiver, total, total, Phase::Finished);
        }
        ProgressStatus::Error => {
            tracing::error!("Download error for {}: progress hook reported an error", url);
        }
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// [`Bridge::get_video_info`] with configuration from the environment.
pub fn get_video_info(url: &str) -> String {
    Bridge::from_env().get_video_info(url)
}

/// [`Bridge::download_format`] with configuration from the environment.
pub fn download_format<R: ProgressReceiver + ?Sized>(
    url: &str,
    format_id: &str,
    output_path: impl Into<PathBuf>,
    overwrite: bool,
    receiver: &R
) -> Result<()> {
    Bridge::from_env().download_format(url, format_id, output_path, overwrite, receiver)
}
