//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::entities::{CrossOrigin, RetryPolicy};
use crate::domain::ports::ObserverOptions;
use crate::presentation::lazy_image::{DEFAULT_DEBOUNCE_MS, ImageProps};

const APP_NAME: &str = "lazyimg";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory holding load markers. Defaults to the user cache dir.
    #[serde(default)]
    pub marker_dir: Option<PathBuf>,

    /// HTTP loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Default image props.
    #[serde(default)]
    pub image: ImageDefaults,

    /// Simulated viewport.
    #[serde(default)]
    pub viewport: ViewportConfig,
}

/// HTTP loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// `Authorization` header value sent for `use-credentials` requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            credentials: None,
        }
    }
}

/// Props applied to every image mounted by the binary.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDefaults {
    /// Gate loading behind visibility.
    #[serde(default = "default_true")]
    pub lazy: bool,

    /// Use and write load markers.
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Decode before reporting success.
    #[serde(default = "default_true")]
    pub decode: bool,

    /// Quiet period in milliseconds.
    #[serde(default = "default_debounce")]
    pub debounce: u64,

    /// Retry budget.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Placeholder visual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Error visual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Cross-origin mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<CrossOrigin>,

    /// Intersection options.
    #[serde(default)]
    pub observer_options: ObserverOptions,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            lazy: true,
            cache: true,
            decode: true,
            debounce: DEFAULT_DEBOUNCE_MS,
            retry: RetryPolicy::default(),
            placeholder: None,
            error: None,
            cross_origin: None,
            observer_options: ObserverOptions::default(),
        }
    }
}

impl ImageDefaults {
    /// Builds props for `src` from these defaults.
    #[must_use]
    pub fn props(&self, src: impl Into<String>) -> ImageProps {
        ImageProps::new(src)
            .with_lazy(self.lazy)
            .with_cache(self.cache)
            .with_decode(self.decode)
            .with_debounce(self.debounce)
            .with_retry(self.retry.clone())
            .with_placeholder(self.placeholder.clone())
            .with_error(self.error.clone())
            .with_cross_origin(self.cross_origin)
            .with_observer_options(self.observer_options)
    }
}

/// Simulated scrolling viewport used by the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// Visible rows.
    #[serde(default = "default_viewport_height")]
    pub height: u16,

    /// Height of each image slot in rows.
    #[serde(default = "default_slot_height")]
    pub slot_height: u16,

    /// Rows scrolled per tick.
    #[serde(default = "default_scroll_step")]
    pub scroll_step: u16,

    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            height: default_viewport_height(),
            slot_height: default_slot_height(),
            scroll_step: default_scroll_step(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl ViewportConfig {
    /// Rows scrolled per tick, at least one so scrolling always advances.
    #[must_use]
    pub fn scroll_rows(&self) -> u16 {
        self.scroll_step.max(1)
    }

    /// Tick interval, at least one millisecond.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_ms.max(1))
    }
}

fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_debounce() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

const fn default_viewport_height() -> u16 {
    24
}

const fn default_slot_height() -> u16 {
    8
}

const fn default_scroll_step() -> u16 {
    4
}

const fn default_tick_ms() -> u64 {
    100
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(marker_dir) = &args.marker_dir {
            self.marker_dir = Some(marker_dir.clone());
        }
        if let Some(lazy) = args.lazy {
            self.image.lazy = lazy;
        }
        if let Some(cache) = args.cache {
            self.image.cache = cache;
        }
        if let Some(decode) = args.decode {
            self.image.decode = decode;
        }
        if let Some(debounce) = args.debounce {
            self.image.debounce = debounce;
        }
        if let Some(count) = args.retry_count {
            self.image.retry.count = Some(count);
        }
        if let Some(delay) = args.retry_delay {
            self.image.retry.delay = Some(delay);
        }
        if let Some(cross_origin) = &args.cross_origin {
            self.image.cross_origin = Some(CrossOrigin::parse(cross_origin));
        }
        if let Some(timeout) = args.timeout_secs {
            self.loader.timeout_secs = timeout;
        }
        if let Some(height) = args.viewport_height {
            self.viewport.height = height;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("lazyimg.log"))
    }

    /// Returns default marker directory.
    #[must_use]
    pub fn default_marker_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.cache_dir().join("markers"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns effective marker directory.
    #[must_use]
    pub fn effective_marker_dir(&self) -> Option<PathBuf> {
        self.marker_dir.clone().or_else(Self::default_marker_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            marker_dir: None,
            loader: LoaderConfig::default(),
            image: ImageDefaults::default(),
            viewport: ViewportConfig::default(),
        }
    }
}
