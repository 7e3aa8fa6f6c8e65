use std::path::PathBuf;
use std::time::Duration;

/// Where the remote maps are hosted.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/stefur/swemaps-data/main/files/";

/// Default limit for establishing a connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache sub-directory used for development builds.
const DEV_VERSION_DIR: &str = "main";

/// Options for a [`Fetcher`][super::Fetcher]
#[derive(Clone, Debug)]
pub struct FetcherOptions {
    /// URL that registry file names are appended to.
    pub(crate) base_url: String,

    /// Root of the download cache. Defaults to `<OS cache dir>/swemaps-data`.
    pub(crate) cache_dir: PathBuf,

    /// Cache sub-directory, so that each release keeps its own copy of the data.
    pub(crate) version: String,

    /// Limit for establishing a connection.
    pub(crate) connect_timeout: Duration,

    /// Limit for a whole download, body included. No limit by default.
    pub(crate) timeout: Option<Duration>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swemaps-data");

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir,
            version: version_dir(env!("CARGO_PKG_VERSION")),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
        }
    }
}

impl FetcherOptions {
    /// Download from a different host. A trailing `/` is added when missing.
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url, ..self }
    }

    /// Use a different cache root.
    pub fn with_cache_dir(self, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..self
        }
    }

    /// Use a different versioned cache sub-directory.
    pub fn with_version(self, version: &str) -> Self {
        Self {
            version: version_dir(version),
            ..self
        }
    }

    /// Give up when no connection is established within `connect_timeout`.
    pub fn with_connect_timeout(self, connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            ..self
        }
    }

    /// Bound the total time of each download.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Development versions (a `dev` pre-release or any build metadata) share one cache directory.
fn version_dir(version: &str) -> String {
    let is_dev = version.contains('+')
        || version
            .split_once('-')
            .map(|(_, pre)| pre.contains("dev"))
            .unwrap_or(false);
    if is_dev {
        DEV_VERSION_DIR.to_string()
    } else {
        version.to_string()
    }
}
