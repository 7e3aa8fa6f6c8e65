//! File names and pinned checksums of the remotely hosted maps.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{Result, SwemapsError};

const REGISTRY: [(&str, &str); 3] = [
    (
        "valdistrikt_2022.parquet",
        "32a37e434b7ddc571f5722f16b8237d5420a32a7f97d59fbd77969489245e59b",
    ),
    (
        "deso.parquet",
        "138fb4e4ad1fadcf7cf688b59c5e019b0e5b802cc40df3e78d4b1fedf29a831f",
    ),
    (
        "regso.parquet",
        "43831fe65e73d1899603cdbef1d59f221661adf6b53ab17e1f92bbf0a287affd",
    ),
];

/// A SHA-256 digest as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum(String);

impl Checksum {
    /// Hash an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Hash a file without loading it into memory.
    pub fn of_file(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Checksum {
    type Err = SwemapsError;

    /// Accepts `<hex>` or `sha256:<hex>`, case-insensitive.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = match s.split_once(':') {
            Some((alg, hex)) if alg.eq_ignore_ascii_case("sha256") => hex,
            Some((alg, _)) => {
                return Err(SwemapsError::General(format!(
                    "Unsupported hash algorithm '{alg}'"
                )))
            }
            None => s,
        };

        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SwemapsError::General(format!(
                "Invalid SHA256 checksum '{s}'"
            )));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from remote file name to its expected checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    entries: BTreeMap<String, Checksum>,
}

impl Registry {
    /// Build a registry from `(file name, checksum)` pairs.
    pub fn try_from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, hash)| Ok((name.into(), hash.as_ref().parse()?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { entries })
    }

    /// The expected checksum of `file_name`.
    pub fn get(&self, file_name: &str) -> Option<&Checksum> {
        self.entries.get(file_name)
    }

    /// Registered file names, sorted.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_str())
    }
}

impl Default for Registry {
    fn default() -> Self {
        let entries = REGISTRY
            .into_iter()
            .map(|(name, hash)| (name.to_string(), Checksum(hash.to_string())))
            .collect();
        Self { entries }
    }
}
