//! HTTP client abstraction for testability

use std::time::Duration;

use tracing::trace;

use crate::error::Result;
use crate::fetch::FetcherOptions;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("swemaps/", env!("CARGO_PKG_VERSION"));

/// Trait for synchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    ///
    /// Non-success status codes are errors.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default timeouts of [`FetcherOptions`].
    pub fn new() -> Result<Self> {
        let options = FetcherOptions::default();
        Self::with_timeouts(options.connect_timeout, options.timeout)
    }

    /// Creates a new ReqwestClient with custom timeouts.
    ///
    /// `timeout` bounds the whole request including the body; `None` lets large downloads run
    /// for as long as the connection keeps delivering data.
    pub fn with_timeouts(connect_timeout: Duration, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        trace!(url, "GET");
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}
