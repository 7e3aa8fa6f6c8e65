use std::collections::{HashMap, HashSet};

use crate::error::{Result, SwemapsError};

use arrow_schema::Schema;
use parquet::file::metadata::FileMetaData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The key under which GeoParquet stores its JSON metadata document.
pub const GEO_METADATA_KEY: &str = "geo";

/// GeoParquet `major.minor` versions this crate knows how to read.
const SUPPORTED_VERSIONS: [(u64, u64); 2] = [(1, 0), (1, 1)];

/// The encoding of a geometry column as declared in the GeoParquet metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum GeoParquetColumnEncoding {
    #[serde(alias = "wkb")]
    WKB,
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "linestring")]
    LineString,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "multipoint")]
    MultiPoint,
    #[serde(rename = "multilinestring")]
    MultiLineString,
    #[serde(rename = "multipolygon")]
    MultiPolygon,
}

/// Geometry types that may be listed in GeoParquet 1.1 column metadata
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoParquetGeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    #[serde(rename = "Point Z")]
    PointZ,
    #[serde(rename = "LineString Z")]
    LineStringZ,
    #[serde(rename = "Polygon Z")]
    PolygonZ,
    #[serde(rename = "MultiPoint Z")]
    MultiPointZ,
    #[serde(rename = "MultiLineString Z")]
    MultiLineStringZ,
    #[serde(rename = "MultiPolygon Z")]
    MultiPolygonZ,
    #[serde(rename = "GeometryCollection Z")]
    GeometryCollectionZ,
}

#[derive(Deserialize)]
struct Versioned {
    version: String,
}

/// Top-level GeoParquet file metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoParquetMetadata {
    /// The version identifier for the GeoParquet specification.
    pub version: String,

    /// The name of the "primary" geometry column. In cases where a GeoParquet file contains
    /// multiple geometry columns, the primary geometry may be used by default in geospatial
    /// operations.
    pub primary_column: String,

    /// Metadata about geometry columns. Each key is the name of a geometry column in the table.
    pub columns: HashMap<String, GeoParquetColumnMetadata>,
}

/// GeoParquet column metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoParquetColumnMetadata {
    /// Name of the geometry encoding format. As of GeoParquet 1.1, `"WKB"`, `"point"`,
    /// `"linestring"`, `"polygon"`, `"multipoint"`, `"multilinestring"`, and `"multipolygon"` are
    /// supported.
    pub encoding: GeoParquetColumnEncoding,

    /// The geometry types of all geometries, or an empty array if they are not known.
    pub geometry_types: HashSet<GeoParquetGeometryType>,

    /// [PROJJSON](https://proj.org/specifications/projjson.html) object representing the
    /// Coordinate Reference System (CRS) of the geometry. If the field is not provided, the
    /// default CRS is [OGC:CRS84](https://www.opengis.net/def/crs/OGC/1.3/CRS84).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,

    /// Winding order of exterior ring of polygons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,

    /// Name of the coordinate system for the edges. Must be one of `"planar"` or `"spherical"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<String>,

    /// Bounding Box of the geometries in the file, formatted according to RFC 7946, section 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Coordinate epoch in case of a dynamic CRS, expressed as a decimal year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<f64>,

    /// Object containing bounding box column names to help accelerate spatial data retrieval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub covering: Option<HashMap<String, Value>>,
}

impl GeoParquetMetadata {
    /// Parse and validate a `geo` JSON document.
    ///
    /// Fails with [`SwemapsError::InvalidMetadata`] when the document is not valid GeoParquet
    /// metadata and with [`SwemapsError::UnsupportedVersion`] when it declares a version this
    /// crate cannot read.
    pub fn try_from_json(value: &str) -> Result<Self> {
        // Documents of other versions may not match this model, so the version goes first
        let Versioned { version } = serde_json::from_str(value)
            .map_err(|err| SwemapsError::InvalidMetadata(err.to_string()))?;
        check_version(&version)?;

        let meta: Self = serde_json::from_str(value)
            .map_err(|err| SwemapsError::InvalidMetadata(err.to_string()))?;
        meta.validate()?;
        Ok(meta)
    }

    /// Construct a [`GeoParquetMetadata`] from Parquet [`FileMetaData`]
    pub fn from_parquet_meta(metadata: &FileMetaData) -> Result<Self> {
        let kv_metadata = metadata.key_value_metadata();

        if let Some(metadata) = kv_metadata {
            for kv in metadata {
                if kv.key == GEO_METADATA_KEY {
                    if let Some(value) = &kv.value {
                        return Self::try_from_json(value);
                    }
                }
            }
        }

        Err(SwemapsError::InvalidMetadata(
            "expected a 'geo' key in GeoParquet metadata".to_string(),
        ))
    }

    /// Read the `geo` metadata attached to an Arrow schema, if any.
    ///
    /// Arrow schemas read from GeoParquet carry the Parquet key-value metadata along, so this
    /// returns `Ok(None)` only for tables that never had GeoParquet metadata.
    pub fn from_schema(schema: &Schema) -> Result<Option<Self>> {
        schema
            .metadata()
            .get(GEO_METADATA_KEY)
            .map(|value| Self::try_from_json(value))
            .transpose()
    }

    fn validate(&self) -> Result<()> {
        if !self.columns.contains_key(&self.primary_column) {
            return Err(SwemapsError::InvalidMetadata(format!(
                "Expected {} in GeoParquet column metadata",
                &self.primary_column
            )));
        }
        Ok(())
    }
}

/// Accept `1.0.x` and `1.1.x`, including pre-releases such as `1.0.0-beta.1`.
fn check_version(version: &str) -> Result<()> {
    let unsupported = || SwemapsError::UnsupportedVersion {
        version: version.to_string(),
    };

    let release = version.split(['-', '+']).next().unwrap_or_default();
    let mut parts = release.split('.').map(str::parse::<u64>);
    let (Some(Ok(major)), Some(Ok(minor))) = (parts.next(), parts.next()) else {
        return Err(unsupported());
    };
    if !parts.all(|part| part.is_ok()) {
        return Err(unsupported());
    }

    if SUPPORTED_VERSIONS.contains(&(major, minor)) {
        Ok(())
    } else {
        Err(unsupported())
    }
}
