//! Lazy image element.

mod component;
mod props;
mod state;

pub use component::LazyImage;
pub use props::{DEFAULT_DEBOUNCE_MS, ErrorCallback, ImageProps, LoadCallback};
pub use state::{ImageAttributes, ImageView, LoadState, attributes};
