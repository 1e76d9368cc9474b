//! Retrying image fetcher.
//!
//! Owns at most one load sequence. Each sequence runs on its own task and
//! reports exactly one terminal outcome through the callbacks it was started
//! with, unless it is unloaded first.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::entities::{
    CrossOrigin, FailedLoad, FetchedImage, LoadRequest, LoadedImage, RetryPolicy,
};
use crate::domain::errors::LoadError;
use crate::domain::ports::{FailureCallback, ImageFetcherPort, ImageSourcePort, SuccessCallback};
use crate::domain::services::should_retry;

struct Handlers {
    on_failure: FailureCallback,
    on_success: SuccessCallback,
}

/// Shared slot the sequence task takes its callbacks from.
/// Emptied on unload so late completions have nothing to call.
type HandlerSlot = Arc<Mutex<Option<Handlers>>>;

struct ActiveLoad {
    url: String,
    handle: JoinHandle<()>,
    handlers: HandlerSlot,
}

/// Drives load attempts against an [`ImageSourcePort`] with retries.
pub struct Imager {
    source: Arc<dyn ImageSourcePort>,
    active: Option<ActiveLoad>,
}

impl std::fmt::Debug for Imager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Imager")
            .field("active", &self.active.as_ref().map(|a| &a.url))
            .finish_non_exhaustive()
    }
}

impl Imager {
    /// Creates an idle fetcher over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn ImageSourcePort>) -> Self {
        Self {
            source,
            active: None,
        }
    }

    /// Returns true while a sequence is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }
}

impl ImageFetcherPort for Imager {
    fn load(
        &mut self,
        url: String,
        cross_origin: Option<CrossOrigin>,
        decode: bool,
        retry: RetryPolicy,
        on_failure: FailureCallback,
        on_success: SuccessCallback,
    ) {
        self.unload();

        let request = LoadRequest {
            url,
            cross_origin,
            decode,
            retry,
        };
        debug!(
            url = %request.url,
            decode = request.decode,
            retries = request.retry.max_attempts(),
            "Starting image load"
        );

        let handlers: HandlerSlot = Arc::new(Mutex::new(Some(Handlers {
            on_failure,
            on_success,
        })));
        let url = request.url.clone();
        let handle = tokio::spawn(run_sequence(
            self.source.clone(),
            request,
            handlers.clone(),
        ));

        self.active = Some(ActiveLoad {
            url,
            handle,
            handlers,
        });
    }

    fn unload(&mut self) {
        if let Some(active) = self.active.take() {
            let detached = active.handlers.lock().take();
            active.handle.abort();
            if detached.is_some() {
                debug!(url = %active.url, "Unloaded in-flight image load");
            } else {
                trace!(url = %active.url, "Unloaded settled image load");
            }
        }
    }
}

impl Drop for Imager {
    fn drop(&mut self) {
        self.unload();
    }
}

async fn run_sequence(source: Arc<dyn ImageSourcePort>, request: LoadRequest, handlers: HandlerSlot) {
    let mut attempt: u32 = 0;

    loop {
        match attempt_load(source.as_ref(), &request).await {
            Ok((fetched, image)) => {
                let event = LoadedImage {
                    url: request.url.clone(),
                    attempts: attempt + 1,
                    bytes: fetched.bytes,
                    content_type: fetched.content_type,
                    image,
                };
                debug!(url = %request.url, attempts = event.attempts, "Image loaded");

                let taken = handlers.lock().take();
                if let Some(handlers) = taken {
                    (handlers.on_success)(event);
                }
                return;
            }
            Err(error) => {
                let decision = should_retry(attempt, &request.retry);
                if !decision.retry {
                    warn!(
                        url = %request.url,
                        attempts = attempt + 1,
                        error = %error,
                        "Image load failed"
                    );

                    let taken = handlers.lock().take();
                    if let Some(handlers) = taken {
                        (handlers.on_failure)(FailedLoad {
                            url: request.url.clone(),
                            attempts: attempt + 1,
                            error,
                        });
                    }
                    return;
                }

                debug!(
                    url = %request.url,
                    attempt = attempt,
                    delay_ms = decision.delay.as_millis(),
                    error = %error,
                    "Image load attempt failed, retrying"
                );
                tokio::time::sleep(decision.delay).await;
                attempt += 1;
            }
        }
    }
}

/// Runs one fetch, followed by the decode step when requested.
async fn attempt_load(
    source: &dyn ImageSourcePort,
    request: &LoadRequest,
) -> Result<(FetchedImage, Option<Arc<image::DynamicImage>>), LoadError> {
    let fetched = source.fetch(&request.url, request.cross_origin).await?;
    if !request.decode {
        return Ok((fetched, None));
    }

    let bytes = fetched.bytes.clone();
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| LoadError::decode(format!("Decode task panicked: {e}")))?
        .map_err(|e| LoadError::decode(format!("Failed to decode image: {e}")))?;

    Ok((fetched, Some(Arc::new(decoded))))
}
