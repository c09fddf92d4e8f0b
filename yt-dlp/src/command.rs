use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::types::DownloadOptions;

/// Machine-readable progress line: `[progress] status downloaded total estimate speed eta
/// fragment fragment_count`. yt-dlp prints `NA` for fields it does not know.
pub(crate) const PROGRESS_TEMPLATE: &str = "download:[progress] %(progress.status)s \
     %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s \
     %(progress.speed)s %(progress.eta)s %(progress.fragment_index)s %(progress.fragment_count)s";

pub(crate) const PROGRESS_PREFIX: &str = "[progress]";

pub struct CommandBuilder {
    binary: PathBuf,
    args: Vec<String>
}

impl CommandBuilder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn url(self, url: impl Into<String>) -> Self {
        self.arg(url)
    }

    pub fn json_output(self) -> Self {
        self.arg("--dump-json")
    }

    pub fn skip_download(self) -> Self {
        self.arg("--skip-download")
    }

    pub fn output(self, path: impl AsRef<Path>) -> Self {
        self.arg("-o").arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.arg("-f").arg(format)
    }

    pub fn force_overwrites(self) -> Self {
        self.arg("--force-overwrites")
    }

    pub fn cookies_file(self, path: impl AsRef<Path>) -> Self {
        self.arg("--cookies").arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn cookies_file_opt(self, path: Option<&PathBuf>) -> Self {
        match path {
            Some(p) => self.cookies_file(p),
            None => self
        }
    }

    pub fn progress_template(self, template: impl Into<String>) -> Self {
        self.arg("--progress-template").arg(template)
    }

    pub fn newline_progress(self) -> Self {
        self.arg("--newline")
    }

    pub fn no_playlist(self) -> Self {
        self.arg("--no-playlist")
    }

    pub fn ffmpeg_location(self, path: impl AsRef<Path>) -> Self {
        self.arg("--ffmpeg-location").arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn with_options(mut self, options: &DownloadOptions) -> Self {
        if let Some(format_arg) = options.format.as_arg() {
            self = self.format(format_arg);
        }

        if options.force_overwrites {
            self = self.force_overwrites();
        }

        if let Some(ref path) = options.cookies_file {
            self = self.cookies_file(path);
        }

        for arg in &options.extra_args {
            self = self.arg(arg.clone());
        }

        self
    }

    pub fn build_with_env(&self, env_vars: &HashMap<String, String>) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args);

        if let Some(path_prepend) = env_vars.get("PATH_PREPEND") {
            let current_path = std::env::var("PATH").unwrap_or_default();
            cmd.env("PATH", format!("{path_prepend}:{current_path}"));
        }

        for (key, value) in env_vars {
            if key != "PATH_PREPEND" {
                cmd.env(key, value);
            }
        }

        cmd
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}
