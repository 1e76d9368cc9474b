//! Presentation layer: the lazy image element and its terminal widget.

/// Lazy image element.
pub mod lazy_image;
/// Reusable widgets.
pub mod widgets;

pub use lazy_image::{ImageAttributes, ImageProps, ImageView, LazyImage};
pub use widgets::LazyImageWidget;
