//! Scrollable viewport that reports target intersections.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::ports::{IntersectionEntry, IntersectionPort, ObserverOptions, TargetId};

struct Subscription {
    options: ObserverOptions,
    sender: mpsc::UnboundedSender<IntersectionEntry>,
    last: Option<bool>,
}

struct Target {
    rect: Rect,
    subscriptions: Vec<Subscription>,
}

struct State {
    viewport: Rect,
    scroll: u16,
    targets: HashMap<TargetId, Target>,
}

/// Targets are laid out in content coordinates; the viewport shows rows
/// `scroll..scroll + height`.
///
/// Observers receive the current state on subscribe and every change after.
pub struct ViewportIntersector {
    state: Mutex<State>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ViewportIntersector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ViewportIntersector")
            .field("viewport", &state.viewport)
            .field("scroll", &state.scroll)
            .field("targets", &state.targets.len())
            .finish()
    }
}

impl ViewportIntersector {
    /// Creates an intersector for a viewport of `area` size, scrolled to top.
    #[must_use]
    pub fn new(area: Rect) -> Self {
        Self {
            state: Mutex::new(State {
                viewport: area,
                scroll: 0,
                targets: HashMap::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a target occupying `rect` in content coordinates.
    pub fn register(&self, rect: Rect) -> TargetId {
        let id = TargetId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.state.lock().targets.insert(
            id,
            Target {
                rect,
                subscriptions: Vec::new(),
            },
        );
        id
    }

    /// Moves a registered target.
    pub fn move_target(&self, target: TargetId, rect: Rect) {
        let mut state = self.state.lock();
        if let Some(entry) = state.targets.get_mut(&target) {
            entry.rect = rect;
        }
        state.notify();
    }

    /// Forgets a target and closes its observations.
    pub fn remove(&self, target: TargetId) {
        self.state.lock().targets.remove(&target);
    }

    /// Scrolls to an absolute row.
    pub fn scroll_to(&self, row: u16) {
        let mut state = self.state.lock();
        if state.scroll != row {
            state.scroll = row;
            trace!(scroll = row, "Viewport scrolled");
            state.notify();
        }
    }

    /// Scrolls by `delta` rows, clamped at the top.
    pub fn scroll_by(&self, delta: i32) {
        let current = i32::from(self.scroll());
        let row = (current + delta).clamp(0, i32::from(u16::MAX));
        self.scroll_to(u16::try_from(row).unwrap_or(u16::MAX));
    }

    /// Returns the scroll offset.
    #[must_use]
    pub fn scroll(&self) -> u16 {
        self.state.lock().scroll
    }

    /// Resizes the viewport.
    pub fn set_viewport(&self, area: Rect) {
        let mut state = self.state.lock();
        state.viewport = area;
        state.notify();
    }

    /// Returns the visible window in content coordinates.
    #[must_use]
    pub fn visible_area(&self) -> Rect {
        self.state.lock().visible_area()
    }

    /// Returns the on-screen area of `target`, clipped to the viewport.
    #[must_use]
    pub fn screen_area(&self, target: TargetId) -> Option<Rect> {
        let state = self.state.lock();
        let rect = state.targets.get(&target)?.rect;
        let visible = state.visible_area();
        let clipped = rect.intersection(visible);
        if clipped.is_empty() {
            return None;
        }
        Some(Rect::new(
            state.viewport.x + clipped.x.saturating_sub(visible.x),
            state.viewport.y + clipped.y.saturating_sub(visible.y),
            clipped.width,
            clipped.height,
        ))
    }
}

impl State {
    fn visible_area(&self) -> Rect {
        Rect::new(0, self.scroll, self.viewport.width, self.viewport.height)
    }

    fn notify(&mut self) {
        let visible = self.visible_area();
        for (id, target) in &mut self.targets {
            let rect = target.rect;
            target.subscriptions.retain_mut(|sub| {
                let entry = evaluate(*id, rect, visible, &sub.options);
                if sub.last == Some(entry.is_intersecting) {
                    return true;
                }
                sub.last = Some(entry.is_intersecting);
                sub.sender.send(entry).is_ok()
            });
        }
    }
}

impl IntersectionPort for ViewportIntersector {
    fn observe(
        &self,
        target: TargetId,
        options: &ObserverOptions,
    ) -> mpsc::UnboundedReceiver<IntersectionEntry> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        let visible = state.visible_area();

        let Some(entry) = state.targets.get_mut(&target) else {
            trace!(target = %target, "Observing unknown target");
            return receiver;
        };

        let initial = evaluate(target, entry.rect, visible, options);
        if sender.send(initial).is_ok() {
            entry.subscriptions.push(Subscription {
                options: *options,
                sender,
                last: Some(initial.is_intersecting),
            });
        }
        receiver
    }

    fn unobserve(&self, target: TargetId) {
        if let Some(entry) = self.state.lock().targets.get_mut(&target) {
            entry.subscriptions.clear();
        }
    }
}

/// Intersection of `rect` with the viewport grown by `root_margin` cells on
/// every side. The ratio is relative to the target area.
#[allow(clippy::cast_precision_loss)]
fn evaluate(
    target: TargetId,
    rect: Rect,
    visible: Rect,
    options: &ObserverOptions,
) -> IntersectionEntry {
    let root = expand(visible, options.root_margin);
    let overlap_w = overlap(rect.x, rect.width, root.0, root.2);
    let overlap_h = overlap(rect.y, rect.height, root.1, root.3);
    let overlap_area = overlap_w * overlap_h;
    let target_area = i64::from(rect.width) * i64::from(rect.height);

    let ratio = if target_area > 0 {
        overlap_area as f64 / target_area as f64
    } else {
        0.0
    };
    let is_intersecting = overlap_area > 0 && ratio >= options.threshold;

    IntersectionEntry {
        target,
        is_intersecting,
        ratio,
    }
}

/// Returns `(x, y, width, height)` of `area` grown by `margin`, in signed
/// coordinates so negative margins and offsets stay representable.
fn expand(area: Rect, margin: i32) -> (i64, i64, i64, i64) {
    let margin = i64::from(margin);
    (
        i64::from(area.x) - margin,
        i64::from(area.y) - margin,
        (i64::from(area.width) + 2 * margin).max(0),
        (i64::from(area.height) + 2 * margin).max(0),
    )
}

fn overlap(start: u16, len: u16, root_start: i64, root_len: i64) -> i64 {
    let start = i64::from(start);
    let end = start + i64::from(len);
    (end.min(root_start + root_len) - start.max(root_start)).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(root_margin: i32, threshold: f64) -> ObserverOptions {
        ObserverOptions {
            root_margin,
            threshold,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<IntersectionEntry>) -> Vec<bool> {
        let mut out = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            out.push(entry.is_intersecting);
        }
        out
    }

    #[test]
    fn test_reports_initial_state() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let visible = viewport.register(Rect::new(0, 2, 20, 4));
        let hidden = viewport.register(Rect::new(0, 30, 20, 4));

        let mut rx = viewport.observe(visible, &ObserverOptions::default());
        assert_eq!(drain(&mut rx), vec![true]);

        let mut rx = viewport.observe(hidden, &ObserverOptions::default());
        assert_eq!(drain(&mut rx), vec![false]);
    }

    #[test]
    fn test_scroll_reports_changes_only() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let target = viewport.register(Rect::new(0, 15, 20, 4));
        let mut rx = viewport.observe(target, &ObserverOptions::default());
        assert_eq!(drain(&mut rx), vec![false]);

        viewport.scroll_by(2);
        assert!(drain(&mut rx).is_empty());

        viewport.scroll_by(5);
        assert_eq!(drain(&mut rx), vec![true]);

        viewport.scroll_by(1);
        assert!(drain(&mut rx).is_empty());

        viewport.scroll_to(0);
        assert_eq!(drain(&mut rx), vec![false]);
    }

    #[test]
    fn test_root_margin_extends_viewport() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let target = viewport.register(Rect::new(0, 12, 20, 4));

        let mut plain = viewport.observe(target, &options(0, 0.0));
        let mut margin = viewport.observe(target, &options(5, 0.0));
        assert_eq!(drain(&mut plain), vec![false]);
        assert_eq!(drain(&mut margin), vec![true]);
    }

    #[test]
    fn test_negative_margin_shrinks_viewport() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let target = viewport.register(Rect::new(0, 8, 20, 2));

        let mut rx = viewport.observe(target, &options(-3, 0.0));
        assert_eq!(drain(&mut rx), vec![false]);
    }

    #[test]
    fn test_threshold_requires_visible_ratio() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let target = viewport.register(Rect::new(0, 8, 20, 8));

        let mut half = viewport.observe(target, &options(0, 0.5));
        assert_eq!(drain(&mut half), vec![false]);

        viewport.scroll_by(2);
        assert_eq!(drain(&mut half), vec![true]);
    }

    #[test]
    fn test_unobserve_stops_reports() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let target = viewport.register(Rect::new(0, 15, 20, 4));
        let mut rx = viewport.observe(target, &ObserverOptions::default());
        drain(&mut rx);

        viewport.unobserve(target);
        viewport.scroll_to(14);
        assert!(drain(&mut rx).is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unknown_target_closes_immediately() {
        let viewport = ViewportIntersector::new(Rect::new(0, 0, 20, 10));
        let mut rx = viewport.observe(TargetId(99), &ObserverOptions::default());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_move_target_and_screen_area() {
        let viewport = ViewportIntersector::new(Rect::new(2, 1, 20, 10));
        let target = viewport.register(Rect::new(0, 30, 20, 4));
        assert_eq!(viewport.screen_area(target), None);

        viewport.move_target(target, Rect::new(0, 8, 20, 4));
        assert_eq!(viewport.screen_area(target), Some(Rect::new(2, 9, 20, 2)));

        viewport.scroll_to(8);
        assert_eq!(viewport.screen_area(target), Some(Rect::new(2, 1, 20, 4)));
    }
}
