//! Displayed-source state machine and rendering rules.

use std::sync::Arc;

use serde::Serialize;

use super::props::ImageProps;
use crate::domain::entities::{CrossOrigin, DisplayedSource, FailedLoad, ImageStatus, LoadedImage};

/// Attributes of the rendered element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAttributes {
    /// Rendered URL.
    pub src: String,
    /// Cross-origin mode, only while the target is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<CrossOrigin>,
    /// Source set, only while the target is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_set: Option<String>,
    /// Sizes, only while the target is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    /// Alternative text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Computes element attributes for what is displayed.
///
/// Target-specific attributes are suppressed for placeholder and error
/// visuals.
#[must_use]
pub fn attributes(source: &DisplayedSource, props: &ImageProps) -> ImageAttributes {
    let is_src = source.shows(&props.src);
    ImageAttributes {
        src: source.url().to_string(),
        cross_origin: props.cross_origin.filter(|_| is_src),
        src_set: props.src_set.clone().filter(|_| is_src),
        sizes: props.sizes.clone().filter(|_| is_src),
        alt: props.alt.clone(),
    }
}

/// Snapshot published to the host after every transition.
#[derive(Debug, Clone)]
pub struct ImageView {
    /// What is displayed.
    pub source: DisplayedSource,
    /// Pipeline status.
    pub status: ImageStatus,
    /// Element attributes.
    pub attributes: ImageAttributes,
    /// Decoded target image, once loaded with decode enabled.
    pub image: Option<Arc<image::DynamicImage>>,
}

/// Mutable state owned by one mounted image.
#[derive(Debug, Clone)]
pub struct LoadState {
    source: DisplayedSource,
    status: ImageStatus,
    image: Option<Arc<image::DynamicImage>>,
}

impl LoadState {
    /// Initial state for `props`.
    #[must_use]
    pub fn new(props: &ImageProps) -> Self {
        Self {
            source: DisplayedSource::initial(props.placeholder.as_deref()),
            status: ImageStatus::NotStarted,
            image: None,
        }
    }

    /// Returns what is displayed.
    #[must_use]
    pub const fn source(&self) -> &DisplayedSource {
        &self.source
    }

    /// Returns the pipeline status.
    #[must_use]
    pub const fn status(&self) -> &ImageStatus {
        &self.status
    }

    /// Goes back to the placeholder for a new sequence.
    pub fn reset(&mut self, props: &ImageProps) {
        *self = Self::new(props);
    }

    /// Marks the sequence as waiting for visibility.
    pub fn defer(&mut self) {
        self.status = ImageStatus::Deferred;
    }

    /// Marks the sequence as in flight.
    pub fn begin(&mut self) {
        self.status = ImageStatus::Loading;
    }

    /// Shows the target.
    pub fn succeed(&mut self, props: &ImageProps, loaded: &LoadedImage) {
        self.source = DisplayedSource::Target(props.src.clone());
        self.status = ImageStatus::Ready;
        self.image = loaded.image.clone();
    }

    /// Shows the error visual, else the placeholder, else keeps the source.
    pub fn fail(&mut self, props: &ImageProps, failed: &FailedLoad) {
        if let Some(error) = &props.error {
            self.source = DisplayedSource::Error(error.clone());
        } else if let Some(placeholder) = &props.placeholder {
            self.source = DisplayedSource::Placeholder(placeholder.clone());
        }
        self.status = ImageStatus::Failed(failed.error.to_string());
        self.image = None;
    }

    /// Builds the snapshot for the host.
    #[must_use]
    pub fn view(&self, props: &ImageProps) -> ImageView {
        ImageView {
            source: self.source.clone(),
            status: self.status.clone(),
            attributes: attributes(&self.source, props),
            image: self.image.clone(),
        }
    }
}
