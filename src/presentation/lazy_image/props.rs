//! Configuration surface of a lazy image element.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{CrossOrigin, FailedLoad, LoadRequest, LoadedImage, RetryPolicy};
use crate::domain::ports::ObserverOptions;

/// Default quiet period before a visible target starts loading.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Notification fired after the target image loaded.
pub type LoadCallback = Arc<dyn Fn(&LoadedImage) + Send + Sync>;

/// Notification fired after the target image failed for good.
pub type ErrorCallback = Arc<dyn Fn(&FailedLoad) + Send + Sync>;

/// Props of a [`LazyImage`](super::LazyImage).
#[derive(Clone)]
pub struct ImageProps {
    /// Target URL.
    pub src: String,
    /// Visual shown before load and as failure fallback.
    pub placeholder: Option<String>,
    /// Visual shown on terminal failure.
    pub error: Option<String>,
    /// Cross-origin mode of the target fetch.
    pub cross_origin: Option<CrossOrigin>,
    /// Require an explicit decode step before success.
    pub decode: bool,
    /// Gate loading behind visibility.
    pub lazy: bool,
    /// Bypass the gate for previously loaded URLs and remember new ones.
    pub cache: bool,
    /// Quiet period for visibility settling, in milliseconds.
    pub debounce: u64,
    /// Passed through to the intersection capability.
    pub observer_options: ObserverOptions,
    /// Retry budget.
    pub retry: RetryPolicy,
    /// Applied only while the target is displayed.
    pub src_set: Option<String>,
    /// Applied only while the target is displayed.
    pub sizes: Option<String>,
    /// Alternative text.
    pub alt: Option<String>,
    /// Load notification.
    pub on_load: Option<LoadCallback>,
    /// Error notification.
    pub on_error: Option<ErrorCallback>,
}

impl ImageProps {
    /// Creates props for `src` with default settings.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            placeholder: None,
            error: None,
            cross_origin: None,
            decode: true,
            lazy: true,
            cache: true,
            debounce: DEFAULT_DEBOUNCE_MS,
            observer_options: ObserverOptions::default(),
            retry: RetryPolicy::none(),
            src_set: None,
            sizes: None,
            alt: None,
            on_load: None,
            on_error: None,
        }
    }

    /// Sets the target URL.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    /// Sets the placeholder visual.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: Option<String>) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Sets the error visual.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// Sets the cross-origin mode.
    #[must_use]
    pub const fn with_cross_origin(mut self, cross_origin: Option<CrossOrigin>) -> Self {
        self.cross_origin = cross_origin;
        self
    }

    /// Enables or disables the decode step.
    #[must_use]
    pub const fn with_decode(mut self, decode: bool) -> Self {
        self.decode = decode;
        self
    }

    /// Enables or disables visibility gating.
    #[must_use]
    pub const fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Enables or disables load markers.
    #[must_use]
    pub const fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the debounce in milliseconds.
    #[must_use]
    pub const fn with_debounce(mut self, debounce_ms: u64) -> Self {
        self.debounce = debounce_ms;
        self
    }

    /// Sets the observer options.
    #[must_use]
    pub const fn with_observer_options(mut self, options: ObserverOptions) -> Self {
        self.observer_options = options;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the source set.
    #[must_use]
    pub fn with_src_set(mut self, src_set: Option<String>) -> Self {
        self.src_set = src_set;
        self
    }

    /// Sets the sizes.
    #[must_use]
    pub fn with_sizes(mut self, sizes: Option<String>) -> Self {
        self.sizes = sizes;
        self
    }

    /// Sets the alternative text.
    #[must_use]
    pub fn with_alt(mut self, alt: Option<String>) -> Self {
        self.alt = alt;
        self
    }

    /// Registers the load notification.
    #[must_use]
    pub fn on_load(mut self, callback: impl Fn(&LoadedImage) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Arc::new(callback));
        self
    }

    /// Registers the error notification.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&FailedLoad) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Returns the request identifying the current fetch sequence.
    #[must_use]
    pub fn request(&self) -> LoadRequest {
        LoadRequest {
            url: self.src.clone(),
            cross_origin: self.cross_origin,
            decode: self.decode,
            retry: self.retry.clone(),
        }
    }

    /// Returns the debounce as a duration.
    #[must_use]
    pub const fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }
}

impl std::fmt::Debug for ImageProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProps")
            .field("src", &self.src)
            .field("placeholder", &self.placeholder)
            .field("error", &self.error)
            .field("cross_origin", &self.cross_origin)
            .field("decode", &self.decode)
            .field("lazy", &self.lazy)
            .field("cache", &self.cache)
            .field("debounce", &self.debounce)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
