//! Errors raised while talking to the Elasticsearch admin API.

use reqwest::StatusCode;
use url::Url;

/// Convenience alias for results carrying an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes of a single fetch-and-decode round trip.
///
/// Collectors never surface these to the scrape. They are logged and, for
/// [`Error::Decode`], counted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, DNS, timeout or body read failure.
    #[error("failed to get from {url}: {source}")]
    Transport {
        /// The requested URL.
        url: Url,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("HTTP request to {url} failed with code {status}")]
    Status {
        /// The requested URL.
        url: Url,
        /// Status code of the response.
        status: StatusCode,
    },

    /// The response body is not the expected JSON document.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The receiving side of a cluster label channel has shut down.
    #[error("cluster label synchronizer has shut down")]
    SynchronizerClosed,
}

impl Error {
    /// Whether this error stems from malformed JSON rather than transport.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}
