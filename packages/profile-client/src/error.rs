//! Error types for profile fetching.

use thiserror::Error;

/// Internal fetch failure classification.
///
/// These never cross the crate boundary as `Err` values - `ProfileClient::fetch`
/// folds them into the returned profile's `FetchStatus`. They exist so the
/// load path can classify failures precisely before that conversion.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded its deadline
    #[error("request timed out")]
    Timeout,

    /// The target refused the request (bot defense, rate limiting)
    #[error("request blocked with HTTP {status}")]
    Blocked { status: u16 },

    /// Connection or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Anything else (client construction, unexpected response shape)
    #[error("fetch failed: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() || err.is_request() {
            FetchError::Network(err.to_string())
        } else {
            FetchError::Unknown(err.to_string())
        }
    }
}
