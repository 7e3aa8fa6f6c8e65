//! Defines [`SwemapsError`], representing all errors returned by this crate.

use arrow_schema::ArrowError;
use std::borrow::Cow;
use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SwemapsError {
    /// The requested map type is not one of the known identifiers.
    #[error("Invalid map type: {map_type}. Expected one of {expected}.")]
    MapNotFound {
        /// The identifier that was passed in.
        map_type: String,
        /// Human readable list of the valid identifiers.
        expected: String,
    },

    /// An optional component needed for this operation was not compiled in.
    #[error("The `{0}` feature is required to use this function.")]
    MissingFeature(&'static str),

    /// The `geo` metadata attached to a table could not be parsed.
    #[error("Invalid GeoParquet metadata: {0}")]
    InvalidMetadata(String),

    /// The `geo` metadata declares a GeoParquet version this crate cannot read.
    #[error("Unsupported GeoParquet version: {version}. Supported versions are 1.0 and 1.1.")]
    UnsupportedVersion { version: String },

    /// Incorrect type was passed to an operation.
    #[error("Incorrect type passed to operation: {0}")]
    IncorrectType(Cow<'static, str>),

    /// A downloaded or cached file did not hash to its registered checksum.
    #[error("SHA256 hash of downloaded file ({file_name}) does not match the known hash: expected {expected} but got {actual}.")]
    ChecksumMismatch {
        file_name: String,
        expected: String,
        actual: String,
    },

    /// General error.
    #[error("General error: {0}")]
    General(String),

    /// [ArrowError]
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// [geozero::error::GeozeroError]
    #[cfg(feature = "geozero")]
    #[error(transparent)]
    GeozeroError(#[from] geozero::error::GeozeroError),

    /// [parquet::errors::ParquetError]
    #[error(transparent)]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// [reqwest::Error]
    #[cfg(feature = "fetch")]
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// [std::io::Error]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, SwemapsError>;

impl SwemapsError {
    /// Build a [`SwemapsError::MapNotFound`] listing the accepted identifiers.
    pub(crate) fn map_not_found<'a>(
        map_type: &str,
        valid: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let expected = valid
            .into_iter()
            .map(|name| format!("'{name}'"))
            .collect::<Vec<_>>()
            .join(", ");
        SwemapsError::MapNotFound {
            map_type: map_type.to_string(),
            expected,
        }
    }
}

impl From<SwemapsError> for ArrowError {
    fn from(err: SwemapsError) -> Self {
        match err {
            SwemapsError::Arrow(err) => err,
            _ => ArrowError::ExternalError(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn map_not_found_lists_choices() {
        let err = SwemapsError::map_not_found("kommuner", ["kommun", "lan", "fa"]);
        assert_eq!(
            err.to_string(),
            "Invalid map type: kommuner. Expected one of 'kommun', 'lan', 'fa'."
        );
    }

    #[test]
    fn missing_feature_names_component() {
        let err = SwemapsError::MissingFeature("geozero");
        assert!(err.to_string().contains("`geozero`"));
    }
}
