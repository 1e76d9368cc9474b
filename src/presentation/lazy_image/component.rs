//! Mounted lazy image: composes the fetcher, the visibility trigger and the
//! cache gate behind a single event loop.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::props::ImageProps;
use super::state::{ImageAttributes, ImageView, LoadState};
use crate::application::{CacheGate, Observer};
use crate::domain::entities::{FailedLoad, LoadedImage};
use crate::domain::ports::{ImageFetcherPort, IntersectionPort, TargetId};

#[derive(Debug)]
enum Command {
    SetProps(Box<ImageProps>),
    SetRef(Option<TargetId>),
    Unmount,
}

/// Terminal outcome tagged with the sequence it belongs to.
struct Outcome {
    sequence: u64,
    result: Result<LoadedImage, FailedLoad>,
}

/// Progress of the current sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    InFlight,
    Settled,
}

/// Handle to a mounted image element.
///
/// All transitions happen on one task; the handle only sends commands and
/// reads published snapshots. Dropping the handle unmounts the image.
pub struct LazyImage {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<ImageView>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for LazyImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyImage")
            .field("view", &*self.view.borrow())
            .finish_non_exhaustive()
    }
}

impl LazyImage {
    /// Mounts an image and runs its mount effect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount<F>(
        props: ImageProps,
        fetcher: F,
        gate: CacheGate,
        intersection: Arc<dyn IntersectionPort>,
    ) -> Self
    where
        F: ImageFetcherPort + 'static,
    {
        let observer = Observer::new(
            intersection,
            props.debounce_duration(),
            props.observer_options,
        );
        let state = LoadState::new(&props);
        let (view_tx, view) = watch::channel(state.view(&props));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let component = Component {
            props,
            fetcher,
            gate,
            observer,
            state,
            sequence: 0,
            phase: Phase::Idle,
            outcome_tx,
            view_tx,
        };
        let task = tokio::spawn(component.run(command_rx, outcome_rx));

        Self {
            commands,
            view,
            task: Some(task),
        }
    }

    /// Replaces the props. Request changes restart loading.
    pub fn set_props(&self, props: ImageProps) {
        let _ = self.commands.send(Command::SetProps(Box::new(props)));
    }

    /// Attaches the visibility target. `None` detaches.
    pub fn set_ref(&self, target: Option<TargetId>) {
        let _ = self.commands.send(Command::SetRef(target));
    }

    /// Returns the latest snapshot.
    #[must_use]
    pub fn view(&self) -> ImageView {
        self.view.borrow().clone()
    }

    /// Returns the attributes of the rendered element.
    #[must_use]
    pub fn render(&self) -> ImageAttributes {
        self.view.borrow().attributes.clone()
    }

    /// Subscribes to snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ImageView> {
        self.view.clone()
    }

    /// Waits until the current sequence reaches a terminal outcome.
    pub async fn settled(&self) -> ImageView {
        let mut rx = self.view.clone();
        let settled = rx
            .wait_for(|view| view.status.is_settled())
            .await
            .map(|view| view.clone());
        settled.unwrap_or_else(|_| rx.borrow().clone())
    }

    /// Unmounts and waits for cleanup to finish.
    pub async fn unmount(mut self) {
        let _ = self.commands.send(Command::Unmount);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LazyImage {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Unmount);
    }
}

struct Component<F> {
    props: ImageProps,
    fetcher: F,
    gate: CacheGate,
    observer: Observer,
    state: LoadState,
    sequence: u64,
    phase: Phase,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    view_tx: watch::Sender<ImageView>,
}

impl<F: ImageFetcherPort> Component<F> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<Outcome>,
    ) {
        let mut visibility = self.observer.subscribe();
        let mut visibility_open = true;

        self.restart(false).await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::SetProps(props)) => self.update_props(*props).await,
                    Some(Command::SetRef(target)) => self.observer.set_ref(target),
                    Some(Command::Unmount) | None => break,
                },
                changed = visibility.changed(), if visibility_open => {
                    if changed.is_err() {
                        visibility_open = false;
                    } else if *visibility.borrow_and_update() {
                        self.on_visible();
                    }
                }
                Some(outcome) = outcomes.recv() => self.apply(outcome).await,
            }
        }

        self.fetcher.unload();
        self.observer.disconnect();
        debug!(src = %self.props.src, "Image unmounted");
    }

    /// Mount effect, re-run whenever the request or the cache flag changes.
    async fn restart(&mut self, reset: bool) {
        self.fetcher.unload();
        self.sequence += 1;
        self.phase = Phase::Idle;
        if reset {
            self.state.reset(&self.props);
        }

        let immediate =
            !self.props.lazy || (self.props.cache && self.gate.get(&self.props.src).await);

        if immediate || self.observer.start_load() {
            self.start_fetch();
        } else {
            trace!(src = %self.props.src, "Deferring load until visible");
            self.state.defer();
        }
        self.publish();
    }

    fn on_visible(&mut self) {
        if self.phase == Phase::Idle {
            self.start_fetch();
            self.publish();
        }
    }

    fn start_fetch(&mut self) {
        let sequence = self.sequence;
        let failure_tx = self.outcome_tx.clone();
        let success_tx = self.outcome_tx.clone();

        self.phase = Phase::InFlight;
        self.state.begin();
        self.fetcher.load(
            self.props.src.clone(),
            self.props.cross_origin,
            self.props.decode,
            self.props.retry.clone(),
            Box::new(move |failed| {
                let _ = failure_tx.send(Outcome {
                    sequence,
                    result: Err(failed),
                });
            }),
            Box::new(move |loaded| {
                let _ = success_tx.send(Outcome {
                    sequence,
                    result: Ok(loaded),
                });
            }),
        );
    }

    async fn apply(&mut self, outcome: Outcome) {
        if outcome.sequence != self.sequence || self.phase != Phase::InFlight {
            trace!(
                src = %self.props.src,
                sequence = outcome.sequence,
                current = self.sequence,
                "Dropping stale load outcome"
            );
            return;
        }
        self.phase = Phase::Settled;

        match outcome.result {
            Ok(loaded) => {
                if let Some(on_load) = &self.props.on_load {
                    on_load(&loaded);
                }
                self.state.succeed(&self.props, &loaded);
                if self.props.cache {
                    self.gate.set(&self.props.src).await;
                }
                debug!(src = %self.props.src, attempts = loaded.attempts, "Displaying target image");
            }
            Err(failed) => {
                if let Some(on_error) = &self.props.on_error {
                    on_error(&failed);
                }
                self.state.fail(&self.props, &failed);
                debug!(
                    src = %self.props.src,
                    attempts = failed.attempts,
                    error = %failed.error,
                    "Displaying fallback visual"
                );
            }
        }
        self.publish();
    }

    async fn update_props(&mut self, props: ImageProps) {
        let request_changed = props.request() != self.props.request();
        let cache_changed = props.cache != self.props.cache;
        self.props = props;

        if request_changed || cache_changed {
            debug!(src = %self.props.src, "Image inputs changed, restarting load");
            self.restart(request_changed).await;
        } else {
            self.publish();
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.state.view(&self.props));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::application::Imager;
    use crate::domain::entities::{
        CrossOrigin, DEFAULT_PLACEHOLDER, DisplayedSource, ImageStatus, RetryPolicy,
    };
    use crate::domain::ports::ObserverOptions;
    use crate::domain::ports::mocks::{
        LoadCall, ManualIntersection, MockMarkerStore, RecordingFetcher, Script,
        ScriptedImageSource,
    };

    const FAILURE_SRC: &str = "FAILURE_SRC";
    const SUCCESS_SRC: &str = "SUCCESS_SRC";
    const TARGET: TargetId = TargetId(1);

    struct Harness {
        fetcher: RecordingFetcher,
        store: Arc<MockMarkerStore>,
        port: Arc<ManualIntersection>,
        loads: Arc<AtomicUsize>,
        errors: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new(fetcher: RecordingFetcher, store: MockMarkerStore) -> Self {
            Self {
                fetcher,
                store: Arc::new(store),
                port: Arc::new(ManualIntersection::new()),
                loads: Arc::new(AtomicUsize::new(0)),
                errors: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn standard() -> Self {
            Self::new(RecordingFetcher::failing(&[FAILURE_SRC]), MockMarkerStore::new())
        }

        fn props(&self, src: &str) -> ImageProps {
            let loads = self.loads.clone();
            let errors = self.errors.clone();
            ImageProps::new(src)
                .with_placeholder(Some("PLACEHOLDER_SRC".into()))
                .with_error(Some("ERROR_SRC".into()))
                .with_cross_origin(Some(CrossOrigin::Anonymous))
                .with_decode(true)
                .with_lazy(true)
                .with_debounce(300)
                .with_observer_options(ObserverOptions {
                    root_margin: 50,
                    threshold: 0.01,
                })
                .with_retry(RetryPolicy::new(5, 2))
                .with_src_set(Some("cool.png".into()))
                .with_sizes(Some("100vw".into()))
                .with_alt(Some("Cool Image".into()))
                .on_load(move |_| {
                    loads.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |_| {
                    errors.fetch_add(1, Ordering::SeqCst);
                })
        }

        fn mount(&self, props: ImageProps) -> LazyImage {
            let image = LazyImage::mount(
                props,
                self.fetcher.clone(),
                CacheGate::new(self.store.clone()),
                self.port.clone(),
            );
            image.set_ref(Some(TARGET));
            image
        }

        fn expected_call(&self, src: &str) -> LoadCall {
            LoadCall {
                url: src.to_string(),
                cross_origin: Some(CrossOrigin::Anonymous),
                decode: true,
                retry: RetryPolicy::new(5, 2),
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        fn errors(&self) -> usize {
            self.errors.load(Ordering::SeqCst)
        }
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_receives_props() {
        let h = Harness::standard();
        let _image = h.mount(h.props(SUCCESS_SRC));
        advance(1).await;

        assert_eq!(
            h.port.observed(),
            vec![(
                TARGET,
                ObserverOptions {
                    root_margin: 50,
                    threshold: 0.01,
                }
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_unloads() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC));
        advance(1).await;
        let before = h.fetcher.unloads();

        image.unmount().await;
        assert_eq!(h.fetcher.unloads(), before + 1);
        assert_eq!(h.port.unobserved(), vec![TARGET]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_placeholder_until_visible() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC));
        advance(1).await;

        let view = image.view();
        assert_eq!(view.source, DisplayedSource::Placeholder("PLACEHOLDER_SRC".into()));
        assert_eq!(view.status, ImageStatus::Deferred);
        assert_eq!(
            image.render(),
            ImageAttributes {
                src: "PLACEHOLDER_SRC".into(),
                cross_origin: None,
                src_set: None,
                sizes: None,
                alt: Some("Cool Image".into()),
            }
        );
        assert!(h.fetcher.calls().is_empty());
        assert_eq!(h.loads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_default_placeholder() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC).with_placeholder(None));
        advance(1).await;

        assert_eq!(image.view().source, DisplayedSource::DefaultPlaceholder);
        assert_eq!(image.render().src, DEFAULT_PLACEHOLDER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_disabled_ignores_marker() {
        let h = Harness::new(
            RecordingFetcher::failing(&[FAILURE_SRC]),
            MockMarkerStore::with_marked(&[SUCCESS_SRC]),
        );
        let image = h.mount(h.props(SUCCESS_SRC).with_cache(false));
        advance(1).await;

        assert_eq!(image.render().src, "PLACEHOLDER_SRC");
        assert!(h.fetcher.calls().is_empty());
        assert_eq!(h.store.mark_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_disabled_success_never_marks() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC).with_lazy(false).with_cache(false));

        let view = image.settled().await;
        assert_eq!(view.status, ImageStatus::Ready);
        assert_eq!(view.source, DisplayedSource::Target(SUCCESS_SRC.into()));
        assert_eq!(h.loads(), 1);
        assert_eq!(h.store.mark_calls(), 0);
        assert!(!h.store.is_marked(SUCCESS_SRC).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_after_failure() {
        let h = Harness::standard();
        let image = h.mount(h.props(FAILURE_SRC).with_lazy(false));

        let view = image.settled().await;
        assert!(view.status.is_failed());
        assert_eq!(view.source, DisplayedSource::Error("ERROR_SRC".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_after_visibility_settles() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC));
        advance(1).await;

        h.port.emit(TARGET, true);
        advance(299).await;
        assert!(h.fetcher.calls().is_empty());

        advance(2).await;
        assert_eq!(h.fetcher.calls(), vec![h.expected_call(SUCCESS_SRC)]);
        assert_eq!(h.loads(), 1);
        assert!(h.store.is_marked(SUCCESS_SRC).await);
        assert_eq!(
            image.render(),
            ImageAttributes {
                src: SUCCESS_SRC.into(),
                cross_origin: Some(CrossOrigin::Anonymous),
                src_set: Some("cool.png".into()),
                sizes: Some("100vw".into()),
                alt: Some("Cool Image".into()),
            }
        );
        assert_eq!(image.view().status, ImageStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_lazy_loads_immediately() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC).with_lazy(false));
        advance(1).await;

        assert_eq!(h.fetcher.calls(), vec![h.expected_call(SUCCESS_SRC)]);
        assert_eq!(h.loads(), 1);
        assert_eq!(h.store.mark_calls(), 1);
        assert_eq!(image.view().source, DisplayedSource::Target(SUCCESS_SRC.into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_url_loads_immediately() {
        let h = Harness::new(
            RecordingFetcher::failing(&[FAILURE_SRC]),
            MockMarkerStore::with_marked(&[SUCCESS_SRC]),
        );
        let image = h.mount(h.props(SUCCESS_SRC));
        advance(1).await;

        assert_eq!(h.fetcher.calls(), vec![h.expected_call(SUCCESS_SRC)]);
        assert_eq!(h.loads(), 1);
        assert_eq!(h.store.mark_calls(), 1);
        assert_eq!(image.render().src, SUCCESS_SRC);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_renders_error_visual() {
        let h = Harness::standard();
        let image = h.mount(h.props(FAILURE_SRC).with_lazy(false));
        advance(1).await;

        assert_eq!(h.errors(), 1);
        assert_eq!(h.loads(), 0);
        assert_eq!(image.view().source, DisplayedSource::Error("ERROR_SRC".into()));
        assert_eq!(image.render().cross_origin, None);
        assert!(image.view().status.is_failed());
        assert_eq!(h.store.mark_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_falls_back_to_placeholder() {
        let h = Harness::standard();
        let image = h.mount(h.props(FAILURE_SRC).with_lazy(false).with_error(None));
        advance(1).await;

        assert_eq!(h.errors(), 1);
        assert_eq!(image.render().src, "PLACEHOLDER_SRC");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_visuals_keeps_default() {
        let h = Harness::standard();
        let props = h
            .props(FAILURE_SRC)
            .with_lazy(false)
            .with_error(None)
            .with_placeholder(None);
        let image = h.mount(props);
        advance(1).await;

        assert_eq!(h.errors(), 1);
        assert_eq!(image.view().source, DisplayedSource::DefaultPlaceholder);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_debounce_never_fetches() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC));
        advance(1).await;

        h.port.emit(TARGET, true);
        advance(100).await;
        image.unmount().await;
        advance(1_000).await;

        assert!(h.fetcher.calls().is_empty());
        assert!(h.fetcher.unloads() >= 1);
        assert_eq!(h.loads(), 0);
        assert_eq!(h.errors(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_outcome_is_ignored() {
        let h = Harness::new(RecordingFetcher::deferred(), MockMarkerStore::new());
        let image = h.mount(h.props("first.png").with_lazy(false));
        advance(1).await;

        image.set_props(h.props("second.png").with_lazy(false));
        advance(1).await;
        assert_eq!(h.fetcher.calls().len(), 2);
        assert_eq!(image.view().source, DisplayedSource::Placeholder("PLACEHOLDER_SRC".into()));

        h.fetcher.complete_pending();
        advance(1).await;

        assert_eq!(h.loads(), 1);
        assert_eq!(image.view().source, DisplayedSource::Target("second.png".into()));
        assert!(!h.store.is_marked("first.png").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_src_change_restarts_from_placeholder() {
        let h = Harness::new(RecordingFetcher::deferred(), MockMarkerStore::new());
        let image = h.mount(h.props("first.png").with_lazy(false));
        advance(1).await;
        h.fetcher.complete_pending();
        advance(1).await;
        assert_eq!(image.view().source, DisplayedSource::Target("first.png".into()));

        let unloads = h.fetcher.unloads();
        image.set_props(h.props("second.png").with_lazy(false));
        advance(1).await;

        assert_eq!(h.fetcher.unloads(), unloads + 1);
        let view = image.view();
        assert_eq!(view.source, DisplayedSource::Placeholder("PLACEHOLDER_SRC".into()));
        assert_eq!(view.status, ImageStatus::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visual_prop_change_does_not_restart() {
        let h = Harness::standard();
        let image = h.mount(h.props(SUCCESS_SRC).with_lazy(false));
        advance(1).await;
        assert_eq!(h.fetcher.calls().len(), 1);

        image.set_props(
            h.props(SUCCESS_SRC)
                .with_lazy(false)
                .with_alt(Some("Renamed".into())),
        );
        advance(1).await;

        assert_eq!(h.fetcher.calls().len(), 1);
        assert_eq!(image.render().alt.as_deref(), Some("Renamed"));
        assert_eq!(image.render().src, SUCCESS_SRC);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_with_retrying_imager() {
        let source = Arc::new(
            ScriptedImageSource::new().script("flaky.png", Script::FailTimes(2)),
        );
        let store = Arc::new(MockMarkerStore::new());
        let port = Arc::new(ManualIntersection::new());
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();

        let props = ImageProps::new("flaky.png")
            .with_retry(RetryPolicy::new(2, 100))
            .with_debounce(50)
            .on_load(move |loaded| {
                seen.store(loaded.attempts as usize, Ordering::SeqCst);
            });
        let image = LazyImage::mount(
            props,
            Imager::new(source.clone()),
            CacheGate::new(store.clone()),
            port.clone(),
        );
        image.set_ref(Some(TARGET));
        advance(1).await;
        port.emit(TARGET, true);

        let view = image.settled().await;
        assert_eq!(view.status, ImageStatus::Ready);
        assert_eq!(view.image.as_ref().map(|img| img.width()), Some(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(source.calls_for("flaky.png"), 3);
        assert!(store.is_marked("flaky.png").await);
    }
}
