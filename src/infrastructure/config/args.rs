use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "lazyimg",
    version,
    about = "Lazily load images into a simulated terminal viewport",
    long_about = None
)]
pub struct CliArgs {
    /// Image URLs, one slot each, top to bottom.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Directory holding load markers.
    #[arg(long, value_name = "PATH")]
    pub marker_dir: Option<PathBuf>,

    /// Defer loading until an image scrolls into view.
    #[arg(long)]
    pub lazy: Option<bool>,

    /// Skip the visibility gate for images that loaded before.
    #[arg(long)]
    pub cache: Option<bool>,

    /// Decode images before reporting success.
    #[arg(long)]
    pub decode: Option<bool>,

    /// Visibility quiet period in milliseconds.
    #[arg(long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Additional attempts after the first failure.
    #[arg(long, value_name = "N")]
    pub retry_count: Option<u32>,

    /// Delay before each retry in milliseconds.
    #[arg(long, value_name = "MS")]
    pub retry_delay: Option<u64>,

    /// Cross-origin mode (anonymous, use-credentials).
    #[arg(long)]
    pub cross_origin: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Visible rows of the simulated viewport.
    #[arg(long)]
    pub viewport_height: Option<u16>,
}
