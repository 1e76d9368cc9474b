//! Domain entity definitions.

mod displayed_source;
mod image;
mod load_request;

pub use displayed_source::{DEFAULT_PLACEHOLDER, DisplayedSource};
pub use image::{FailedLoad, FetchedImage, ImageId, ImageStatus, LoadedImage};
pub use load_request::{CrossOrigin, DelayGrowth, LoadRequest, RetryPolicy};
