//! What an image element currently shows.

/// Embedded 1x1 transparent GIF shown when no placeholder is configured.
pub const DEFAULT_PLACEHOLDER: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAP///wAAACH5BAEAAAAALAAAAAABAAEAAAICRAEAOw==";

/// The single source of truth for what is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayedSource {
    /// Built-in transparent pixel.
    #[default]
    DefaultPlaceholder,
    /// Caller supplied placeholder visual.
    Placeholder(String),
    /// The real target image.
    Target(String),
    /// Caller supplied error visual.
    Error(String),
}

impl DisplayedSource {
    /// Initial source for the given placeholder setting.
    #[must_use]
    pub fn initial(placeholder: Option<&str>) -> Self {
        placeholder.map_or(Self::DefaultPlaceholder, |p| Self::Placeholder(p.to_string()))
    }

    /// Returns the URL to render.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::DefaultPlaceholder => DEFAULT_PLACEHOLDER,
            Self::Placeholder(url) | Self::Target(url) | Self::Error(url) => url,
        }
    }

    /// Returns true when the rendered URL is `src`.
    #[must_use]
    pub fn shows(&self, src: &str) -> bool {
        self.url() == src
    }

    /// Returns true for either placeholder variant.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::DefaultPlaceholder | Self::Placeholder(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_source() {
        assert_eq!(DisplayedSource::initial(None), DisplayedSource::DefaultPlaceholder);
        assert_eq!(
            DisplayedSource::initial(Some("ph.png")),
            DisplayedSource::Placeholder("ph.png".to_string())
        );
        assert!(DisplayedSource::initial(None).url().starts_with("data:image/gif;base64,"));
    }

    #[test]
    fn test_shows_compares_rendered_url() {
        let target = DisplayedSource::Target("cat.png".to_string());
        assert!(target.shows("cat.png"));
        assert!(!target.shows("dog.png"));
        assert!(!DisplayedSource::Error("err.png".to_string()).shows("cat.png"));
    }
}
