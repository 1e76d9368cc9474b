//! Network image source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::{debug, trace};

use super::data_url::{decode_data_url, is_data_url};
use crate::domain::entities::{CrossOrigin, FetchedImage};
use crate::domain::errors::LoadError;
use crate::domain::ports::ImageSourcePort;
use crate::infrastructure::config::LoaderConfig;

/// Fetches images over HTTP(S) and resolves `data:` URLs locally.
#[derive(Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    credentials: Option<HeaderValue>,
}

impl std::fmt::Debug for HttpImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageSource")
            .field("has_credentials", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpImageSource {
    /// Creates a source from loader settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created or the credentials
    /// are not a valid header value.
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| LoadError::fetch(format!("Failed to create HTTP client: {e}")))?;

        let credentials = config
            .credentials
            .as_deref()
            .map(|value| {
                let mut header = HeaderValue::from_str(value)
                    .map_err(|e| LoadError::fetch(format!("Invalid credentials header: {e}")))?;
                header.set_sensitive(true);
                Ok::<_, LoadError>(header)
            })
            .transpose()?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Builds the request for `url`. Credentials are attached only in
    /// `use-credentials` mode.
    fn request(&self, url: &str, cross_origin: Option<CrossOrigin>) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match (cross_origin, &self.credentials) {
            (Some(CrossOrigin::UseCredentials), Some(credentials)) => {
                request.header(AUTHORIZATION, credentials.clone())
            }
            _ => request,
        }
    }
}

#[async_trait]
impl ImageSourcePort for HttpImageSource {
    async fn fetch(
        &self,
        url: &str,
        cross_origin: Option<CrossOrigin>,
    ) -> Result<FetchedImage, LoadError> {
        if is_data_url(url) {
            trace!("Resolving inline data URL");
            return decode_data_url(url);
        }

        debug!(url = %url, cross_origin = ?cross_origin, "Downloading image");
        let response = self
            .request(url, cross_origin)
            .send()
            .await
            .map_err(|e| LoadError::fetch(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::http_status(
                status.as_u16(),
                status.canonical_reason(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::fetch(format!("Failed to read body: {e}")))?;

        trace!(url = %url, size = bytes.len(), "Image downloaded");
        Ok(FetchedImage::new(bytes, content_type))
    }
}
