//! lazyimg - lazy, retrying, cache-aware image loading for terminal interfaces.
//!
//! An image element ([`presentation::LazyImage`]) shows a placeholder until
//! its target scrolls into view, fetches it with a bounded retry budget, and
//! remembers successful URLs so later mounts skip the visibility gate.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the fetcher, visibility trigger and cache gate.
pub mod application;
/// Domain layer containing entities, errors, ports and pure services.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the lazy image element and its widget.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "lazyimg";
