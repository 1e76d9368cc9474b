//! Debounced, one-shot visibility trigger.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::ports::{IntersectionEntry, IntersectionPort, ObserverOptions, TargetId};

/// Watches one target and latches `start_load` once it settles as visible.
///
/// The latch never reverts, even if the target scrolls away afterwards.
pub struct Observer {
    port: Arc<dyn IntersectionPort>,
    debounce: Duration,
    options: ObserverOptions,
    target: Option<TargetId>,
    latch: Arc<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("debounce", &self.debounce)
            .field("options", &self.options)
            .field("target", &self.target)
            .field("start_load", &self.start_load())
            .finish_non_exhaustive()
    }
}

impl Observer {
    /// Creates a detached observer.
    #[must_use]
    pub fn new(port: Arc<dyn IntersectionPort>, debounce: Duration, options: ObserverOptions) -> Self {
        let (latch, _) = watch::channel(false);
        Self {
            port,
            debounce,
            options,
            target: None,
            latch: Arc::new(latch),
            task: None,
        }
    }

    /// Attaches the watched target, replacing the previous one.
    /// `None` detaches.
    pub fn set_ref(&mut self, target: Option<TargetId>) {
        if self.target == target {
            return;
        }
        self.detach();
        self.target = target;

        let Some(target) = target else {
            return;
        };
        if self.start_load() {
            return;
        }

        trace!(target = %target, debounce_ms = self.debounce.as_millis(), "Observing target");
        let entries = self.port.observe(target, &self.options);
        self.task = Some(tokio::spawn(debounce_intersections(
            entries,
            self.debounce,
            self.latch.clone(),
            self.port.clone(),
            target,
        )));
    }

    /// Returns the latched visibility signal.
    #[must_use]
    pub fn start_load(&self) -> bool {
        *self.latch.borrow()
    }

    /// Subscribes to the visibility signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.latch.subscribe()
    }

    /// Resolves once the signal is latched.
    pub async fn wait_for_start(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|started| *started).await;
    }

    /// Stops watching. The latch keeps its value.
    pub fn disconnect(&mut self) {
        self.detach();
        self.target = None;
    }

    fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(target) = self.target {
            self.port.unobserve(target);
        }
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Coalesces intersection changes until `debounce` passes without one, then
/// latches if the settled state is intersecting.
async fn debounce_intersections(
    mut entries: mpsc::UnboundedReceiver<IntersectionEntry>,
    debounce: Duration,
    latch: Arc<watch::Sender<bool>>,
    port: Arc<dyn IntersectionPort>,
    target: TargetId,
) {
    while let Some(entry) = entries.recv().await {
        let mut intersecting = entry.is_intersecting;

        if debounce.is_zero() {
            while let Ok(next) = entries.try_recv() {
                intersecting = next.is_intersecting;
            }
        } else {
            while let Ok(Some(next)) = tokio::time::timeout(debounce, entries.recv()).await {
                intersecting = next.is_intersecting;
            }
        }

        if intersecting {
            debug!(target = %target, "Target settled in view, start loading");
            latch.send_replace(true);
            port.unobserve(target);
            return;
        }
        trace!(target = %target, "Target settled out of view");
    }
}
