use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures_core::Stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::command::{CommandBuilder, PROGRESS_PREFIX, PROGRESS_TEMPLATE};
use crate::error::{Error, Result};
use crate::types::{
    DownloadEvent, DownloadOptions, DownloadProgress, Format, OutputFormat, ProgressStatus,
    VideoInfo
};

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    cookies_file: Option<PathBuf>,
    extra_args: Vec<String>,
    ffmpeg_location: Option<PathBuf>,
    env_vars: HashMap<String, String>
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self::with_binary("yt-dlp")
    }

    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: path.into(),
            cookies_file: None,
            extra_args: Vec::new(),
            ffmpeg_location: None,
            env_vars: HashMap::new()
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn set_binary(&mut self, path: PathBuf) {
        self.binary = path;
    }

    pub fn set_cookies_file(&mut self, path: Option<PathBuf>) {
        self.cookies_file = path;
    }

    pub fn set_extra_args(&mut self, args: Vec<String>) {
        self.extra_args = args;
    }

    pub fn set_ffmpeg_location(&mut self, path: Option<PathBuf>) {
        self.ffmpeg_location = path;
    }

    pub fn set_env(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }

    pub async fn check_binary(&self) -> Result<String> {
        let output = CommandBuilder::new(&self.binary)
            .arg("--version")
            .build_with_env(&self.env_vars)
            .output()
            .await
            .map_err(|e| Error::from_spawn(e, &self.binary))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(Error::BinaryNotExecutable(self.binary.clone()))
        }
    }

    pub async fn get_video_info(&self, url: &str) -> Result<VideoInfo> {
        self.get_video_info_with_format(url, &OutputFormat::Default)
            .await
    }

    /// Metadata only. The selector biases which formats yt-dlp resolves as
    /// `requested_formats`; the `formats` list is always returned in full.
    pub async fn get_video_info_with_format(
        &self,
        url: &str,
        format: &OutputFormat
    ) -> Result<VideoInfo> {
        let mut builder = self
            .command()
            .json_output()
            .skip_download()
            .no_playlist();

        if let Some(selector) = format.as_arg() {
            builder = builder.format(selector);
        }

        tracing::debug!(args = ?builder.get_args(), "fetching video info");

        let output = builder
            .url(url)
            .build_with_env(&self.env_vars)
            .output()
            .await
            .map_err(|e| Error::from_spawn(e, &self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(Error::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr
            });
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    pub async fn list_formats(&self, url: &str) -> Result<Vec<Format>> {
        let info = self.get_video_info(url).await?;
        if info.formats.is_empty() {
            Err(Error::NoFormatsAvailable)
        } else {
            Ok(info.formats)
        }
    }

    /// Runs a download and streams yt-dlp's progress hook as events.
    ///
    /// A non-zero exit ends the stream with [`Error::CommandFailed`]; a clean exit
    /// ends it with [`DownloadEvent::Completed`].
    pub fn download_with_progress(
        &self,
        url: &str,
        output: impl AsRef<Path>,
        options: &DownloadOptions
    ) -> Pin<Box<dyn Stream<Item = Result<DownloadEvent>> + Send + 'static>> {
        let output_path = output.as_ref().to_path_buf();
        let builder = self
            .command()
            .with_options(options)
            .output(&output_path)
            .newline_progress()
            .progress_template(PROGRESS_TEMPLATE)
            .url(url);
        let binary = self.binary.clone();
        let env_vars = self.env_vars.clone();

        Box::pin(async_stream::try_stream! {
            tracing::debug!(
                binary = %builder.binary().display(),
                args = ?builder.get_args(),
                "spawning yt-dlp"
            );

            let mut cmd = builder.build_with_env(&env_vars);
            cmd.stdout(std::process::Stdio::piped());
            cmd.stderr(std::process::Stdio::piped());
            cmd.kill_on_drop(true);

            let mut child = cmd.spawn().map_err(|e| Error::from_spawn(e, &binary))?;

            let stderr = child.stderr.take().ok_or_else(|| not_captured("stderr"))?;
            let stderr_task = tokio::spawn(async move {
                let mut collected = Vec::new();
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if !line.trim().is_empty() {
                        tracing::debug!("yt-dlp output: {}", line.trim());
                        collected.push(line);
                    }
                }
                collected
            });

            let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;
            let mut reader = BufReader::new(stdout).lines();

            let mut current_filename: Option<String> = None;

            while let Some(line) = reader.next_line().await? {
                tracing::trace!(line = %line, "yt-dlp stdout");
                if let Some(event) = parse_progress_line(&line, &mut current_filename) {
                    yield event;
                }
            }

            let status = child.wait().await?;
            let stderr_lines = stderr_task.await.unwrap_or_default();

            for line in &stderr_lines {
                if let Some(message) = line.trim().strip_prefix("ERROR:") {
                    yield DownloadEvent::Error { message: message.trim().to_string() };
                }
            }

            if !status.success() {
                Err::<(), Error>(Error::CommandFailed {
                    code: status.code().unwrap_or(-1),
                    stderr: stderr_summary(&stderr_lines)
                })?;
            }

            let filename = current_filename
                .unwrap_or_else(|| output_path.to_string_lossy().to_string());
            yield DownloadEvent::Completed { filename };
        })
    }

    fn command(&self) -> CommandBuilder {
        let mut builder = CommandBuilder::new(&self.binary)
            .cookies_file_opt(self.cookies_file.as_ref())
            .args(self.extra_args.iter().map(String::as_str));

        if let Some(ref ffmpeg_path) = self.ffmpeg_location {
            builder = builder.ffmpeg_location(ffmpeg_path);
        }

        builder
    }
}

fn not_captured(stream: &str) -> Error {
    Error::ExecutionFailed(std::io::Error::other(format!("{stream} not captured")))
}

/// `ERROR:` lines when yt-dlp printed any, otherwise the last few stderr lines.
fn stderr_summary(lines: &[String]) -> String {
    let errors: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR:"))
        .collect();
    if errors.is_empty() {
        let start = lines.len().saturating_sub(5);
        lines[start..].join("\n")
    } else {
        errors.join("\n")
    }
}

fn parse_progress_line(line: &str, current_filename: &mut Option<String>) -> Option<DownloadEvent> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        return parse_hook_progress(rest).map(DownloadEvent::Progress);
    }

    if let Some(filename) = line.strip_prefix("[download] Destination:") {
        let filename = filename.trim();
        *current_filename = Some(filename.to_string());
        return Some(DownloadEvent::DownloadStarted {
            filename: filename.to_string()
        });
    }

    // yt-dlp fires the finished hook for a file that already exists but does not
    // print the progress template for it.
    if let Some(idx) = line.find(" has already been downloaded") {
        let filename = line[..idx].trim_start_matches("[download]").trim();
        if !filename.is_empty() {
            *current_filename = Some(filename.to_string());
        }
        let size = current_filename
            .as_deref()
            .and_then(|f| std::fs::metadata(f).ok())
            .map(|m| m.len());
        let mut progress = DownloadProgress::new(ProgressStatus::Finished, size.unwrap_or(0));
        progress.total_bytes = size;
        return Some(DownloadEvent::Progress(progress));
    }

    if line.starts_with("[Merger]") || line.contains("Merging formats") {
        if let Some(start) = line.find('"')
            && let Some(end) = line.rfind('"')
            && end > start
        {
            *current_filename = Some(line[start + 1..end].to_string());
        }
        return Some(DownloadEvent::MergingFormats);
    }

    if line.starts_with("[ExtractAudio]") || line.starts_with("[ffmpeg]") || line.starts_with("[Fixup") {
        return Some(DownloadEvent::PostProcessing {
            status: line.to_string()
        });
    }

    if let Some(message) = line.strip_prefix("WARNING:") {
        return Some(DownloadEvent::Warning {
            message: message.trim().to_string()
        });
    }

    if let Some(message) = line.strip_prefix("ERROR:") {
        return Some(DownloadEvent::Error {
            message: message.trim().to_string()
        });
    }

    None
}

/// Parses the fields printed by [`PROGRESS_TEMPLATE`] after its prefix.
fn parse_hook_progress(fields: &str) -> Option<DownloadProgress> {
    let parts: Vec<&str> = fields.split_whitespace().collect();
    let status = ProgressStatus::parse(parts.first()?)?;
    let field = |i: usize| parts.get(i).copied().and_then(parse_number);

    Some(DownloadProgress {
        status,
        downloaded_bytes: field(1).map_or(0, to_count),
        total_bytes: field(2).map(to_count),
        total_bytes_estimate: field(3).map(to_count),
        speed: field(4),
        eta: field(5),
        fragment_index: field(6).and_then(|v| u32::try_from(to_count(v)).ok()),
        fragment_count: field(7).and_then(|v| u32::try_from(to_count(v)).ok())
    })
}

fn parse_number(s: &str) -> Option<f64> {
    match s {
        "NA" | "None" | "N/A" | "" => None,
        _ => s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
    }
}

fn to_count(value: f64) -> u64 {
    value as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn test_parse_hook_progress_downloading() {
        let mut filename = None;
        let event = parse_progress_line(
            "[progress] downloading 500 1000 NA 250000.5 2 NA NA",
            &mut filename
        );
        let Some(DownloadEvent::Progress(p)) = event else {
            panic!("expected progress event");
        };
        assert_eq!(p.status, ProgressStatus::Downloading);
        assert_eq!(p.downloaded_bytes, 500);
        assert_eq!(p.total_bytes, Some(1000));
        assert_eq!(p.total_bytes_estimate, None);
        assert_eq!(p.speed, Some(250_000.5));
        assert_eq!(p.eta, Some(2.0));
        assert_eq!(p.fragment_index, None);
    }

    #[test]
    fn test_parse_hook_progress_estimate_only() {
        let p = parse_hook_progress(" finished 2048 NA 2048.0 NA NA 3 3").unwrap();
        assert_eq!(p.status, ProgressStatus::Finished);
        assert_eq!(p.total_bytes, None);
        assert_eq!(p.total_bytes_estimate, Some(2048));
        assert_eq!(p.total_or_estimate(), 2048);
        assert_eq!(p.fragment_index, Some(3));
        assert_eq!(p.fragment_count, Some(3));
    }

    #[test]
    fn test_parse_hook_progress_unknown_status() {
        assert!(parse_hook_progress(" paused 1 2 NA NA NA NA NA").is_none());
        assert!(parse_hook_progress("").is_none());
    }

    #[test]
    fn test_parse_progress_line_destination() {
        let mut filename = None;
        let event = parse_progress_line(
            "[download] Destination: video.mp4",
            &mut filename
        );
        assert!(matches!(event, Some(DownloadEvent::DownloadStarted { .. })));
        assert_eq!(filename, Some("video.mp4".to_string()));
    }

    #[test]
    fn test_parse_progress_line_already_downloaded_missing_file() {
        let mut filename = None;
        let event = parse_progress_line(
            "[download] /nonexistent/clip.webm has already been downloaded",
            &mut filename
        );
        let Some(DownloadEvent::Progress(p)) = event else {
            panic!("expected finished progress");
        };
        assert_eq!(p.status, ProgressStatus::Finished);
        assert_eq!(p.total_or_estimate(), 0);
        assert_eq!(filename.as_deref(), Some("/nonexistent/clip.webm"));
    }

    #[test]
    fn test_parse_progress_line_merger() {
        let mut filename = None;
        let event = parse_progress_line(
            "[Merger] Merging formats into \"out.mkv\"",
            &mut filename
        );
        assert!(matches!(event, Some(DownloadEvent::MergingFormats)));
        assert_eq!(filename.as_deref(), Some("out.mkv"));
    }

    #[test]
    fn test_parse_progress_line_error_and_warning() {
        let mut filename = None;
        let event = parse_progress_line("ERROR: Video unavailable", &mut filename);
        assert!(matches!(event, Some(DownloadEvent::Error { ref message }) if message == "Video unavailable"));

        let event = parse_progress_line("WARNING: slow connection", &mut filename);
        assert!(matches!(event, Some(DownloadEvent::Warning { .. })));

        assert!(parse_progress_line("[youtube] abc: Downloading webpage", &mut filename).is_none());
    }

    #[test]
    fn test_stderr_summary_prefers_error_lines() {
        let lines = vec![
            "[debug] Command-line config".to_string(),
            "ERROR: [youtube] abc: Video unavailable".to_string()
        ];
        assert_eq!(stderr_summary(&lines), "ERROR: [youtube] abc: Video unavailable");

        let lines: Vec<String> = (0..8).map(|i| format!("line {i}")).collect();
        assert_eq!(stderr_summary(&lines), "line 3\nline 4\nline 5\nline 6\nline 7");
    }

    #[test]
    fn test_ytdlp_default() {
        let client = YtDlp::default();
        assert_eq!(client.binary, PathBuf::from("yt-dlp"));
        assert!(client.cookies_file.is_none());
        assert!(client.extra_args.is_empty());
    }

    #[test]
    fn test_ytdlp_command_carries_client_settings() {
        let mut client = YtDlp::with_binary("/opt/yt-dlp");
        client.set_cookies_file(Some(PathBuf::from("/tmp/cookies.txt")));
        client.set_extra_args(vec![
            "--extractor-args".to_string(),
            "youtube:player-client=mweb".to_string()
        ]);
        client.set_ffmpeg_location(Some(PathBuf::from("/usr/local/bin/ffmpeg")));

        let builder = client.command();
        assert_eq!(builder.binary(), Path::new("/opt/yt-dlp"));
        assert_eq!(builder.get_args(), &[
            "--cookies", "/tmp/cookies.txt",
            "--extractor-args", "youtube:player-client=mweb",
            "--ffmpeg-location", "/usr/local/bin/ffmpeg"
        ]);
    }

    #[test]
    fn test_ytdlp_env_vars() {
        let mut client = YtDlp::new();
        client.set_env("PATH_PREPEND".to_string(), "/opt/bin".to_string());
        assert_eq!(client.env_vars.get("PATH_PREPEND"), Some(&"/opt/bin".to_string()));
    }

    /// A client whose "yt-dlp" is a shell script; the script's arguments are
    /// written to `args` next to it.
    fn scripted_client(dir: &tempfile::TempDir, body: &str) -> YtDlp {
        let script = dir.path().join("yt-dlp.sh");
        let args_file = dir.path().join("args");
        std::fs::write(
            &script,
            format!("printf '%s\\n' \"$@\" > '{}'\n{body}\n", args_file.display())
        )
        .unwrap();
        let mut client = YtDlp::with_binary("sh");
        client.set_extra_args(vec![script.to_string_lossy().to_string()]);
        client
    }

    fn recorded_args(dir: &tempfile::TempDir) -> Vec<String> {
        std::fs::read_to_string(dir.path().join("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    async fn collect(client: &YtDlp, options: &DownloadOptions) -> Vec<Result<DownloadEvent>> {
        let stream = client.download_with_progress("https://example.com/v", "out.mp4", options);
        tokio::pin!(stream);
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_download_streams_hook_events_then_completes() {
        let dir = tempfile::tempdir().unwrap();
        let client = scripted_client(&dir, "\
echo '[download] Destination: out.mp4'
echo '[progress] downloading 500 1000 NA 100.0 5 NA NA'
echo '[progress] finished 1000 1000 NA NA NA NA NA'
echo 'WARNING: slow' >&2
exit 0");
        let options = DownloadOptions::new()
            .format(OutputFormat::Custom("18".into()))
            .force_overwrites(true);

        let items = collect(&client, &options).await;
        let events: Vec<DownloadEvent> = items.into_iter().map(|i| i.unwrap()).collect();

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], DownloadEvent::DownloadStarted { ref filename } if filename == "out.mp4"));
        let DownloadEvent::Progress(ref p) = events[1] else {
            panic!("expected downloading progress");
        };
        assert_eq!((p.status, p.downloaded_bytes, p.total_bytes), (ProgressStatus::Downloading, 500, Some(1000)));
        let DownloadEvent::Progress(ref p) = events[2] else {
            panic!("expected finished progress");
        };
        assert_eq!((p.status, p.total_or_estimate()), (ProgressStatus::Finished, 1000));
        assert!(matches!(events[3], DownloadEvent::Completed { ref filename } if filename == "out.mp4"));

        let args = recorded_args(&dir);
        assert!(args.windows(2).any(|w| w == ["-f", "18"]));
        assert!(args.iter().any(|a| a == "--force-overwrites"));
        assert!(args.iter().any(|a| a == "--newline"));
        assert!(args.windows(2).any(|w| w[0] == "--progress-template" && w[1] == PROGRESS_TEMPLATE));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }

    #[tokio::test]
    async fn test_download_nonzero_exit_ends_with_command_failed() {
        let dir = tempfile::tempdir().unwrap();
        let client = scripted_client(&dir, "\
echo '[progress] downloading 1 2 NA NA NA NA NA'
echo 'ERROR: boom' >&2
exit 1");

        let mut items = collect(&client, &DownloadOptions::new()).await;

        assert_eq!(items.len(), 3);
        let last = items.pop().unwrap();
        assert!(matches!(
            last,
            Err(Error::CommandFailed { code: 1, ref stderr }) if stderr == "ERROR: boom"
        ));
        assert!(matches!(items[1], Ok(DownloadEvent::Error { ref message }) if message == "boom"));
        assert!(!items.iter().any(|i| matches!(i, Ok(DownloadEvent::Completed { .. }))));
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_download() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("still-running");
        let client = scripted_client(&dir, &format!("\
echo '[progress] downloading 1 10 NA NA NA NA NA'
sleep 1
touch '{}'", marker.display()));

        {
            let stream = client.download_with_progress("u", "out.mp4", &DownloadOptions::new());
            tokio::pin!(stream);
            assert!(matches!(stream.next().await, Some(Ok(DownloadEvent::Progress(_)))));
        }

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_video_info_passes_selector_and_parses_output() {
        let dir = tempfile::tempdir().unwrap();
        let client = scripted_client(&dir, r#"echo '{"title":"t","formats":[{"format_id":"a","vcodec":"vp9","height":720.0},{"format_id":"b"}]}'"#);

        let info = client
            .get_video_info_with_format("https://example.com/v", &OutputFormat::BestVideoAudio)
            .await
            .unwrap();

        assert_eq!(info.title.as_deref(), Some("t"));
        assert_eq!(info.formats.len(), 2);
        assert_eq!(info.formats[0].height, Some(720));
        let args = recorded_args(&dir);
        assert!(args.iter().any(|a| a == "--dump-json"));
        assert!(args.windows(2).any(|w| w == ["-f", "bestvideo+bestaudio/best"]));
    }

    #[tokio::test]
    async fn test_video_info_nonzero_exit_is_command_failed() {
        let dir = tempfile::tempdir().unwrap();
        let client = scripted_client(&dir, "echo 'ERROR: Unsupported URL: u' >&2\nexit 2");

        let err = client.get_video_info("u").await.unwrap_err();

        assert!(matches!(
            err,
            Error::CommandFailed { code: 2, ref stderr } if stderr.contains("Unsupported URL")
        ));
    }

    #[tokio::test]
    async fn test_list_formats_empty_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = scripted_client(&dir, r#"echo '{"title":"t","formats":[]}'"#);
        assert!(matches!(client.list_formats("u").await, Err(Error::NoFormatsAvailable)));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_found() {
        let client = YtDlp::with_binary("/nonexistent/yt-dlp-binary");
        let err = client.check_binary().await.unwrap_err();
        assert!(matches!(err, Error::BinaryNotFound(_)));
    }
}
