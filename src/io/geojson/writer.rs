use std::io::Write;

use geojson::{Feature, FeatureCollection};

use crate::error::Result;
use crate::io::geojson::geometry::{GeometryDecoder, GeometryEncoding};
use crate::io::geojson::properties::encode_properties;
use crate::table::GeoTable;

/// Options for converting a [`GeoTable`] to GeoJSON
#[derive(Clone, Debug, Default)]
pub struct GeoJsonOptions {
    /// Name of the column holding geometries.
    ///
    /// When `None`, the primary column from the GeoParquet metadata is used, or else the only
    /// column with a GeoArrow extension type.
    geometry_column: Option<String>,
}

impl GeoJsonOptions {
    /// Use the named column as the geometry column.
    pub fn with_geometry_column(self, geometry_column: impl Into<String>) -> Self {
        Self {
            geometry_column: Some(geometry_column.into()),
        }
    }
}

/// Convert a table to a GeoJSON `FeatureCollection`.
///
/// Every row becomes one feature. The geometry column becomes the feature geometry and every
/// other column becomes a property. Other geometry columns are kept as properties, with binary
/// values written as hex strings.
///
/// Note: Does not reproject to WGS84 for you
pub fn table_to_geojson(table: &GeoTable) -> Result<FeatureCollection> {
    table_to_geojson_with_options(table, &Default::default())
}

/// Convert a table to a GeoJSON `FeatureCollection` with the given options.
pub fn table_to_geojson_with_options(
    table: &GeoTable,
    options: &GeoJsonOptions,
) -> Result<FeatureCollection> {
    // Validates the declared GeoParquet version before anything is decoded
    let geo_meta = table.geo_metadata()?;
    let geometry_column_index =
        table.geometry_column_index(options.geometry_column.as_deref())?;

    let schema = table.schema();
    let geometry_field = schema.field(geometry_column_index);
    let column_meta = geo_meta
        .as_ref()
        .and_then(|meta| meta.columns.get(geometry_field.name()));
    let encoding = GeometryEncoding::try_new(geometry_field, column_meta)?;
    encoding.check_available()?;

    let mut features = Vec::with_capacity(table.len());
    for batch in table.batches() {
        let geometries =
            GeometryDecoder::try_new(encoding, batch.column(geometry_column_index).as_ref())?;
        let properties = encode_properties(batch, geometry_column_index)?;

        for (row, properties) in properties.into_iter().enumerate() {
            let geometry = geometries
                .geometry(row)?
                .map(|geom| geojson::Geometry::new(geojson::Value::from(&geom)));
            features.push(Feature {
                bbox: None,
                geometry,
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Write a table to GeoJSON
///
/// Note: Does not reproject to WGS84 for you
pub fn write_geojson<W: Write>(table: &GeoTable, writer: W) -> Result<()> {
    let collection = table_to_geojson(table)?;
    serde_json::to_writer(writer, &collection)?;
    Ok(())
}
