use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub enum OutputFormat {
    #[default]
    Default,
    Best,
    /// Best video merged with best audio, falling back to the best combined file.
    BestVideoAudio,
    Custom(String)
}

impl OutputFormat {
    pub fn as_arg(&self) -> Option<String> {
        match self {
            OutputFormat::Default => None,
            OutputFormat::Best => Some("best".to_string()),
            OutputFormat::BestVideoAudio => Some("bestvideo+bestaudio/best".to_string()),
            OutputFormat::Custom(s) => Some(s.clone())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub format: OutputFormat,
    pub force_overwrites: bool,
    pub cookies_file: Option<PathBuf>,
    pub extra_args: Vec<String>
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn force_overwrites(mut self, overwrite: bool) -> Self {
        self.force_overwrites = overwrite;
        self
    }

    pub fn cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    pub fn extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}
