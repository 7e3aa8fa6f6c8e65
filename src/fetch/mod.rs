//! Download and cache the maps that are too large to bundle.
//!
//! Files are looked up in a [`Registry`] of pinned SHA-256 checksums and stored under
//! `<cache dir>/<version>/`. A cached file whose checksum still matches is returned without any
//! network access; a missing or modified file is downloaded again.

mod http;
mod options;
mod registry;

pub use http::{HttpClient, ReqwestClient};
pub use options::{FetcherOptions, DEFAULT_BASE_URL};
pub use registry::{Checksum, Registry};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SwemapsError};
use crate::maps::RemoteMap;

/// What has to happen to make a cached file usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchAction {
    /// Not in the cache
    Download,
    /// In the cache, but its checksum no longer matches
    Update,
    /// In the cache and intact
    Fetch,
}

impl FetchAction {
    fn for_path(path: &Path, expected: &Checksum) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::Download);
        }
        if &Checksum::of_file(path)? == expected {
            Ok(Self::Fetch)
        } else {
            Ok(Self::Update)
        }
    }
}

/// Fetches remote maps into a local, versioned cache.
#[derive(Debug)]
pub struct Fetcher<C = ReqwestClient> {
    client: C,
    options: FetcherOptions,
    registry: Registry,
}

impl Fetcher<ReqwestClient> {
    /// A fetcher with the default options and an HTTP client.
    pub fn new() -> Result<Self> {
        Self::try_new(Default::default())
    }

    /// A fetcher whose HTTP client uses the timeouts of `options`.
    pub fn try_new(options: FetcherOptions) -> Result<Self> {
        let client = ReqwestClient::with_timeouts(options.connect_timeout, options.timeout)?;
        Ok(Self::with_client(client, options))
    }
}

impl<C: HttpClient> Fetcher<C> {
    pub fn with_client(client: C, options: FetcherOptions) -> Self {
        Self {
            client,
            options,
            registry: Registry::default(),
        }
    }

    /// Replace the pinned registry.
    pub fn with_registry(self, registry: Registry) -> Self {
        Self { registry, ..self }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    /// The versioned directory downloads are stored in.
    pub fn abspath(&self) -> PathBuf {
        self.options.cache_dir.join(&self.options.version)
    }

    /// Path of a remote map, downloading it if needed.
    ///
    /// `map_type` is one of `"valdistrikt_2022"`, `"regso"` or `"deso"`; anything else is
    /// [`SwemapsError::MapNotFound`].
    pub fn fetch(&self, map_type: &str) -> Result<PathBuf> {
        let map: RemoteMap = map_type.parse()?;
        self.fetch_file(&map.file_name())
    }

    /// Path of a registered file, downloading it if needed.
    ///
    /// Fails with [`SwemapsError::MapNotFound`] for names not in the registry and with
    /// [`SwemapsError::ChecksumMismatch`] if the downloaded bytes do not match the pinned hash.
    /// A failed download never leaves a file at the returned path.
    pub fn fetch_file(&self, file_name: &str) -> Result<PathBuf> {
        let expected = self
            .registry
            .get(file_name)
            .ok_or_else(|| SwemapsError::map_not_found(file_name, self.registry.file_names()))?;

        let dir = self.abspath();
        let path = dir.join(file_name);
        let action = FetchAction::for_path(&path, expected)?;
        debug!(file_name, ?action, path = %path.display());

        match action {
            FetchAction::Fetch => return Ok(path),
            FetchAction::Download => {
                info!(file_name, dir = %dir.display(), "Downloading data file");
            }
            FetchAction::Update => {
                info!(file_name, dir = %dir.display(), "Updating data file");
            }
        }

        let url = format!("{}{}", self.options.base_url, file_name);
        let bytes = self.client.get(&url)?;

        let actual = Checksum::of_bytes(&bytes);
        if &actual != expected {
            return Err(SwemapsError::ChecksumMismatch {
                file_name: file_name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        // Written next to the target and renamed into place, so readers never see a partial file
        fs::create_dir_all(&dir)?;
        let prefix = format!(".{file_name}");
        let mut part = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".part")
            .tempfile_in(&dir)?;
        part.write_all(&bytes)?;
        part.as_file().sync_all()?;
        part.persist(&path).map_err(|err| err.error)?;
        debug!(file_name, bytes = bytes.len(), "Stored data file");

        Ok(path)
    }
}

/// Fetch one of the remote maps into the default cache and return its local path.
///
/// `map_type` is one of `"valdistrikt_2022"`, `"regso"` or `"deso"`.
///
/// ```no_run
/// let path = swemaps::fetch_map("deso")?;
/// let table = swemaps::io::parquet::read_geoparquet(
///     std::fs::File::open(path)?,
///     Default::default(),
/// )?;
/// # Ok::<(), swemaps::SwemapsError>(())
/// ```
pub fn fetch_map(map_type: &str) -> Result<PathBuf> {
    // Validate before building an HTTP client
    let map: RemoteMap = map_type.parse()?;
    Fetcher::new()?.fetch_file(&map.file_name())
}
