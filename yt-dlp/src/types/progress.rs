#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error
}

impl ProgressStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "downloading" => Some(ProgressStatus::Downloading),
            "finished" => Some(ProgressStatus::Finished),
            "error" => Some(ProgressStatus::Error),
            _ => None
        }
    }
}

/// One snapshot reported by yt-dlp's progress hook.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub status: ProgressStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    pub speed: Option<f64>,
    pub eta: Option<f64>,
    pub fragment_index: Option<u32>,
    pub fragment_count: Option<u32>
}

impl DownloadProgress {
    pub fn new(status: ProgressStatus, downloaded_bytes: u64) -> Self {
        Self {
            status,
            downloaded_bytes,
            total_bytes: None,
            total_bytes_estimate: None,
            speed: None,
            eta: None,
            fragment_index: None,
            fragment_count: None
        }
    }

    /// Exact total if known, else yt-dlp's estimate, else 0.
    pub fn total_or_estimate(&self) -> u64 {
        self.total_bytes
            .or(self.total_bytes_estimate)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    DownloadStarted { filename: String },
    Progress(DownloadProgress),
    PostProcessing { status: String },
    MergingFormats,
    /// The yt-dlp process exited successfully.
    Completed { filename: String },
    Error { message: String },
    Warning { message: String }
}
