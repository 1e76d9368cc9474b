//! Image sources.

mod data_url;
mod http_source;

pub use data_url::{decode_data_url, is_data_url};
pub use http_source::HttpImageSource;
