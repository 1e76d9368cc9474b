mod image_fetcher_port;
mod image_source_port;
mod intersection_port;
mod load_marker_port;

pub use image_fetcher_port::{FailureCallback, ImageFetcherPort, SuccessCallback};
pub use image_source_port::ImageSourcePort;
pub use intersection_port::{IntersectionEntry, IntersectionPort, ObserverOptions, TargetId};
pub use load_marker_port::LoadMarkerPort;
