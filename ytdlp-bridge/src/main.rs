//! Command-line host for the bridge: the same two calls a mobile host makes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ytdlp_bridge::{Bridge, BridgeConfig, MethodTable, logging};

/// Fetch video metadata and download single formats through yt-dlp
#[derive(Parser)]
#[command(name = "ytdlp-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// yt-dlp binary to run
    #[arg(long, env = "YTDLP_PATH")]
    ytdlp_path: Option<PathBuf>,

    /// Netscape cookies file passed to yt-dlp
    #[arg(long, env = "YTDLP_COOKIES_FILE")]
    cookies_file: Option<PathBuf>,

    /// ffmpeg binary used for merging
    #[arg(long, env = "YTDLP_FFMPEG_PATH")]
    ffmpeg_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands
}

#[derive(Subcommand)]
enum Commands {
    /// Print title, thumbnail and formats as JSON
    Info {
        url: String
    },

    /// Download one format to a file
    Download {
        url: String,

        /// Format id as listed by `info`
        format_id: String,

        output: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        overwrite: bool
    },

    /// Print the yt-dlp version
    Version
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();

    let mut config = BridgeConfig::from_env();
    if cli.ytdlp_path.is_some() {
        config.ytdlp_path = cli.ytdlp_path;
    }
    if cli.cookies_file.is_some() {
        config.cookies_file = cli.cookies_file;
    }
    if cli.ffmpeg_path.is_some() {
        config.ffmpeg_path = cli.ffmpeg_path;
    }

    let bridge = Bridge::from_config(config);

    match cli.command {
        Commands::Info { url } => {
            println!("{}", bridge.get_video_info(&url));
        }
        Commands::Download {
            url,
            format_id,
            output,
            overwrite
        } => {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                    .progress_chars("#>-")
            );

            let receiver = MethodTable::on_progress(|downloaded, total| {
                pb.set_length(total);
                pb.set_position(downloaded);
            });

            let result = bridge.download_format(&url, &format_id, &output, overwrite, &receiver);
            match result {
                Ok(()) => pb.finish_with_message("done"),
                Err(_) => pb.abandon()
            }
            result.with_context(|| format!("downloading {url} (format {format_id})"))?;
            println!("{}", output.display());
        }
        Commands::Version => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let version = rt.block_on(bridge.backend().check_binary())?;
            println!("{version}");
        }
    }

    Ok(())
}
