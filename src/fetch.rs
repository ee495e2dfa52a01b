//! Remote logo fetching.
//!
//! The logo is best-effort: [`LogoFetcher::fetch`] logs any failure and
//! returns `None` so the render carries on without it. Every request is
//! bounded by the client timeout, so an unresponsive host cannot stall a
//! render indefinitely.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tracing::{debug, instrument, warn};

use crate::surface::LogoAsset;

const CONNECT_TIMEOUT_CAP: Duration = Duration::from_secs(5);

/// Default cap on a downloaded logo body.
pub const DEFAULT_MAX_LOGO_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LogoError {
    #[error("invalid logo URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported logo URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("logo request timed out after {0:?}")]
    Timeout(Duration),

    #[error("logo request failed: {0}")]
    Network(String),

    #[error("logo host answered {0}")]
    Status(StatusCode),

    #[error("logo exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to decode logo: {0}")]
    Decode(#[from] image::ImageError),
}

/// Fetches logos over HTTP(S).
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct LogoFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl LogoFetcher {
    /// Creates a fetcher whose requests give up after `timeout`.
    ///
    /// Connecting is additionally capped at five seconds. Bodies are capped
    /// at [`DEFAULT_MAX_LOGO_BYTES`] unless changed with
    /// [`with_max_bytes`](Self::with_max_bytes).
    pub fn new(timeout: Duration) -> Result<Self, LogoError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(CONNECT_TIMEOUT_CAP))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LogoError::Network(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            max_bytes: DEFAULT_MAX_LOGO_BYTES,
        })
    }

    /// Caps the logo body size.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Fetches and decodes a logo, swallowing every failure.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Option<LogoAsset> {
        match self.try_fetch(url).await {
            Ok(asset) => {
                let size = asset.original_size();
                debug!(width = size.width, height = size.height, "logo fetched");
                Some(asset)
            }
            Err(err) => {
                warn!(error = %err, "logo unavailable; continuing without it");
                None
            }
        }
    }

    /// Fetches and decodes a logo, reporting why it failed.
    pub async fn try_fetch(&self, url: &str) -> Result<LogoAsset, LogoError> {
        let url = Url::parse(url).map_err(|e| LogoError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(LogoError::UnsupportedScheme(other.to_string())),
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LogoError::Status(status));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(self.too_large());
        }

        // Chunked bodies carry no length up front; enforce the cap as they stream.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_reqwest_error(e))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(LogoAsset::decode(&body)?)
    }

    fn too_large(&self) -> LogoError {
        LogoError::TooLarge {
            limit: self.max_bytes,
        }
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> LogoError {
        if e.is_timeout() {
            LogoError::Timeout(self.timeout)
        } else {
            LogoError::Network(e.without_url().to_string())
        }
    }
}
