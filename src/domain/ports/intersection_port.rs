//! Port definition for visibility detection.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Handle of an observable target region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Options passed through verbatim to the intersection capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverOptions {
    /// Cells added around the viewport before testing intersection.
    /// Negative values shrink it.
    pub root_margin: i32,
    /// Minimum visible fraction of the target, in `0.0..=1.0`.
    pub threshold: f64,
}

/// One intersection report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// Reported target.
    pub target: TargetId,
    /// Whether the target intersects the (margin-adjusted) viewport.
    pub is_intersecting: bool,
    /// Visible fraction of the target.
    pub ratio: f64,
}

/// Capability that reports whether targets intersect the viewport.
pub trait IntersectionPort: Send + Sync {
    /// Starts observing `target`. The current state is reported first,
    /// then every change until `unobserve` is called.
    fn observe(
        &self,
        target: TargetId,
        options: &ObserverOptions,
    ) -> mpsc::UnboundedReceiver<IntersectionEntry>;

    /// Stops every observation of `target`.
    fn unobserve(&self, target: TargetId);
}
