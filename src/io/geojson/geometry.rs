//! Decode a geometry column into [`geo`] geometries.

use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float64Array};
use arrow_schema::{DataType, Field};
use geo::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};

use crate::error::{Result, SwemapsError};
use crate::io::parquet::{GeoParquetColumnEncoding, GeoParquetColumnMetadata};
use crate::table::extension_name;

/// The GeoArrow native geometry layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// How geometries are stored in an Arrow column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum GeometryEncoding {
    /// ISO or extended WKB in a binary column
    WKB,
    /// WKT in a string column
    WKT,
    /// GeoArrow native nested list layout
    Native(NativeType),
}

impl GeometryEncoding {
    /// Infer the encoding of a geometry column.
    ///
    /// A GeoArrow extension name on the field takes precedence over the GeoParquet column
    /// metadata, which takes precedence over the physical data type.
    pub fn try_new(field: &Field, column_meta: Option<&GeoParquetColumnMetadata>) -> Result<Self> {
        use GeometryEncoding::*;

        if let Some(name) = extension_name(field) {
            return match name {
                "geoarrow.wkb" | "ogc.wkb" => Ok(WKB),
                "geoarrow.wkt" => Ok(WKT),
                "geoarrow.point" => Ok(Native(NativeType::Point)),
                "geoarrow.linestring" => Ok(Native(NativeType::LineString)),
                "geoarrow.polygon" => Ok(Native(NativeType::Polygon)),
                "geoarrow.multipoint" => Ok(Native(NativeType::MultiPoint)),
                "geoarrow.multilinestring" => Ok(Native(NativeType::MultiLineString)),
                "geoarrow.multipolygon" => Ok(Native(NativeType::MultiPolygon)),
                other => Err(SwemapsError::IncorrectType(
                    format!("Unsupported geometry extension type {other}").into(),
                )),
            };
        }

        if let Some(column_meta) = column_meta {
            return Ok(match column_meta.encoding {
                GeoParquetColumnEncoding::WKB => WKB,
                GeoParquetColumnEncoding::Point => Native(NativeType::Point),
                GeoParquetColumnEncoding::LineString => Native(NativeType::LineString),
                GeoParquetColumnEncoding::Polygon => Native(NativeType::Polygon),
                GeoParquetColumnEncoding::MultiPoint => Native(NativeType::MultiPoint),
                GeoParquetColumnEncoding::MultiLineString => Native(NativeType::MultiLineString),
                GeoParquetColumnEncoding::MultiPolygon => Native(NativeType::MultiPolygon),
            });
        }

        match field.data_type() {
            DataType::Binary | DataType::LargeBinary => Ok(WKB),
            DataType::Utf8 | DataType::LargeUtf8 => Ok(WKT),
            dt => Err(SwemapsError::IncorrectType(
                format!(
                    "Column {} of type {dt} has no geometry extension type or GeoParquet metadata",
                    field.name()
                )
                .into(),
            )),
        }
    }

    /// Fail early when decoding this encoding needs a component that was not compiled in.
    pub fn check_available(&self) -> Result<()> {
        match self {
            GeometryEncoding::WKB | GeometryEncoding::WKT if !cfg!(feature = "geozero") => {
                Err(SwemapsError::MissingFeature("geozero"))
            }
            _ => Ok(()),
        }
    }
}

/// Decodes individual rows of one geometry array.
pub(crate) struct GeometryDecoder<'a> {
    encoding: GeometryEncoding,
    array: &'a dyn Array,
}

impl<'a> GeometryDecoder<'a> {
    pub(crate) fn try_new(encoding: GeometryEncoding, array: &'a dyn Array) -> Result<Self> {
        encoding.check_available()?;
        let expected_physical_type = match encoding {
            GeometryEncoding::WKB => matches!(
                array.data_type(),
                DataType::Binary | DataType::LargeBinary
            ),
            GeometryEncoding::WKT => {
                matches!(array.data_type(), DataType::Utf8 | DataType::LargeUtf8)
            }
            GeometryEncoding::Native(NativeType::Point) => matches!(
                array.data_type(),
                DataType::Struct(_) | DataType::FixedSizeList(_, _)
            ),
            GeometryEncoding::Native(_) => matches!(
                array.data_type(),
                DataType::List(_) | DataType::LargeList(_)
            ),
        };
        if !expected_physical_type {
            return Err(SwemapsError::IncorrectType(
                format!(
                    "Geometry encoding {encoding:?} cannot be stored in an array of type {}",
                    array.data_type()
                )
                .into(),
            ));
        }
        Ok(Self { encoding, array })
    }

    /// The geometry at row `i`, or `None` for a null geometry.
    pub(crate) fn geometry(&self, i: usize) -> Result<Option<Geometry>> {
        if self.array.is_null(i) {
            return Ok(None);
        }

        let geometry = match self.encoding {
            GeometryEncoding::WKB => wkb_geometry(wkb_value(self.array, i))?,
            GeometryEncoding::WKT => wkt_geometry(wkt_value(self.array, i))?,
            GeometryEncoding::Native(NativeType::Point) => {
                Point(CoordBuffer::try_new(self.array)?.coord(i)?).into()
            }
            GeometryEncoding::Native(NativeType::LineString) => {
                line_string(list_value(self.array, i)?.as_ref())?.into()
            }
            GeometryEncoding::Native(NativeType::Polygon) => {
                polygon(list_value(self.array, i)?.as_ref())?.into()
            }
            GeometryEncoding::Native(NativeType::MultiPoint) => {
                multi_point(list_value(self.array, i)?.as_ref())?.into()
            }
            GeometryEncoding::Native(NativeType::MultiLineString) => {
                multi_line_string(list_value(self.array, i)?.as_ref())?.into()
            }
            GeometryEncoding::Native(NativeType::MultiPolygon) => {
                multi_polygon(list_value(self.array, i)?.as_ref())?.into()
            }
        };
        Ok(Some(geometry))
    }
}

fn wkb_value(array: &dyn Array, i: usize) -> &[u8] {
    match array.data_type() {
        DataType::LargeBinary => array.as_binary::<i64>().value(i),
        _ => array.as_binary::<i32>().value(i),
    }
}

fn wkt_value(array: &dyn Array, i: usize) -> &str {
    match array.data_type() {
        DataType::LargeUtf8 => array.as_string::<i64>().value(i),
        _ => array.as_string::<i32>().value(i),
    }
}

#[cfg(feature = "geozero")]
fn wkb_geometry(buf: &[u8]) -> Result<Geometry> {
    use geozero::ToGeo;
    Ok(geozero::wkb::Wkb(buf.to_vec()).to_geo()?)
}

#[cfg(not(feature = "geozero"))]
fn wkb_geometry(_buf: &[u8]) -> Result<Geometry> {
    Err(SwemapsError::MissingFeature("geozero"))
}

#[cfg(feature = "geozero")]
fn wkt_geometry(wkt: &str) -> Result<Geometry> {
    use geozero::ToGeo;
    Ok(geozero::wkt::Wkt(wkt).to_geo()?)
}

#[cfg(not(feature = "geozero"))]
fn wkt_geometry(_wkt: &str) -> Result<Geometry> {
    Err(SwemapsError::MissingFeature("geozero"))
}

/// A view over a GeoArrow coordinate array, either separated (`Struct<x, y, ..>`) or interleaved
/// (`FixedSizeList<f64>[n]`). Any ordinates beyond x and y are ignored.
enum CoordBuffer<'a> {
    Separated {
        x: &'a Float64Array,
        y: &'a Float64Array,
    },
    Interleaved {
        list: &'a FixedSizeListArray,
        values: &'a Float64Array,
    },
}

impl<'a> CoordBuffer<'a> {
    fn try_new(array: &'a dyn Array) -> Result<Self> {
        match array.data_type() {
            DataType::Struct(fields) if fields.len() >= 2 => {
                let array = array.as_struct();
                Ok(Self::Separated {
                    x: float64_values(array.column(0).as_ref())?,
                    y: float64_values(array.column(1).as_ref())?,
                })
            }
            DataType::FixedSizeList(_, size) if *size >= 2 => {
                let list = array.as_fixed_size_list();
                Ok(Self::Interleaved {
                    list,
                    values: float64_values(list.values().as_ref())?,
                })
            }
            dt => Err(SwemapsError::IncorrectType(
                format!("Expected a GeoArrow coordinate array, got {dt}").into(),
            )),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Separated { x, .. } => x.len(),
            Self::Interleaved { list, .. } => list.len(),
        }
    }

    fn coord(&self, i: usize) -> Result<Coord> {
        match self {
            Self::Separated { x, y } => Ok(Coord {
                x: x.value(i),
                y: y.value(i),
            }),
            Self::Interleaved { list, values } => {
                let start = usize::try_from(list.value_offset(i)).map_err(|_| {
                    SwemapsError::General("negative coordinate offset".to_string())
                })?;
                Ok(Coord {
                    x: values.value(start),
                    y: values.value(start + 1),
                })
            }
        }
    }

    fn coords(&self) -> Result<Vec<Coord>> {
        (0..self.len()).map(|i| self.coord(i)).collect()
    }
}

fn float64_values(array: &dyn Array) -> Result<&Float64Array> {
    array
        .as_primitive_opt::<Float64Type>()
        .ok_or(SwemapsError::IncorrectType(
            format!("Expected Float64 coordinates, got {}", array.data_type()).into(),
        ))
}

/// The `i`th element of a `List` or `LargeList` array.
fn list_value(array: &dyn Array, i: usize) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::List(_) => Ok(array.as_list::<i32>().value(i)),
        DataType::LargeList(_) => Ok(array.as_list::<i64>().value(i)),
        dt => Err(SwemapsError::IncorrectType(
            format!("Expected a list array, got {dt}").into(),
        )),
    }
}

/// Apply `f` to every element of a `List` or `LargeList` array.
fn map_list<T>(array: &dyn Array, f: impl Fn(&dyn Array) -> Result<T>) -> Result<Vec<T>> {
    (0..array.len())
        .map(|i| f(list_value(array, i)?.as_ref()))
        .collect()
}

fn line_string(coords: &dyn Array) -> Result<LineString> {
    Ok(LineString::new(CoordBuffer::try_new(coords)?.coords()?))
}

fn polygon(rings: &dyn Array) -> Result<Polygon> {
    let mut rings = map_list(rings, line_string)?.into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
    Ok(Polygon::new(exterior, rings.collect()))
}

fn multi_point(coords: &dyn Array) -> Result<MultiPoint> {
    let coords = CoordBuffer::try_new(coords)?.coords()?;
    Ok(MultiPoint::new(coords.into_iter().map(Point::from).collect()))
}

fn multi_line_string(lines: &dyn Array) -> Result<MultiLineString> {
    Ok(MultiLineString::new(map_list(lines, line_string)?))
}

fn multi_polygon(polygons: &dyn Array) -> Result<MultiPolygon> {
    Ok(MultiPolygon::new(map_list(polygons, polygon)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{fixtures, wkb};
    use approx::assert_relative_eq;
    use arrow_array::{BinaryArray, LargeBinaryArray};
    use geo::{coord, line_string, point, polygon};
    use std::collections::HashMap;

    fn decode_all(field: &Field, array: &dyn Array) -> Vec<Option<Geometry>> {
        let encoding = GeometryEncoding::try_new(field, None).unwrap();
        let decoder = GeometryDecoder::try_new(encoding, array).unwrap();
        (0..array.len())
            .map(|i| decoder.geometry(i).unwrap())
            .collect()
    }

    #[test]
    fn separated_points() {
        let (field, array) = fixtures::separated_points();
        let geoms = decode_all(&field, array.as_ref());
        assert_eq!(
            geoms,
            vec![
                Some(point!(x: 18.07, y: 59.33).into()),
                Some(point!(x: 11.97, y: 57.71).into()),
                Some(point!(x: 13.0, y: 55.6).into()),
            ]
        );
    }

    #[test]
    fn interleaved_points() {
        let (field, array) = fixtures::interleaved_points();
        let geoms = decode_all(&field, array.as_ref());
        assert_eq!(geoms.len(), 2);
        let Some(Geometry::Point(point)) = &geoms[1] else {
            panic!("expected a point, got {:?}", geoms[1]);
        };
        assert_relative_eq!(point.x(), 17.64);
        assert_relative_eq!(point.y(), 59.86);
    }

    #[test]
    fn z_is_dropped_from_separated_points() {
        let (field, array) = fixtures::separated_xyz_points();
        let geoms = decode_all(&field, array.as_ref());
        assert_eq!(
            geoms,
            vec![
                Some(point!(x: 18.07, y: 59.33).into()),
                Some(point!(x: 13.0, y: 55.6).into()),
            ]
        );
    }

    #[test]
    fn z_is_dropped_from_interleaved_points() {
        let (field, array) = fixtures::interleaved_xyz_points();
        let geoms = decode_all(&field, array.as_ref());
        // The second point starts after all three ordinates of the first
        let Some(Geometry::Point(point)) = &geoms[1] else {
            panic!("expected a point, got {:?}", geoms[1]);
        };
        assert_relative_eq!(point.x(), 17.64);
        assert_relative_eq!(point.y(), 59.86);
    }

    #[test]
    fn large_list_linestrings() {
        let (field, array) = fixtures::large_list_linestrings();
        let geoms = decode_all(&field, array.as_ref());
        assert_eq!(
            geoms,
            vec![
                Some(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into()),
                Some(line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 4.0), (x: 7.0, y: 5.0)].into()),
            ]
        );
    }

    #[test]
    fn native_linestrings() {
        let (field, array) = fixtures::linestrings();
        let geoms = decode_all(&field, array.as_ref());
        let expected: Geometry = line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 0.5),
        ]
        .into();
        assert_eq!(geoms[0], Some(expected));
        assert_eq!(geoms[1], None);
    }

    #[test]
    fn native_polygon_with_hole() {
        let (field, array) = fixtures::polygon_with_hole();
        let geoms = decode_all(&field, array.as_ref());
        let expected: Geometry = polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
                (x: 0.0, y: 0.0),
            ],
            interiors: [
                [
                    (x: 2.0, y: 2.0),
                    (x: 4.0, y: 2.0),
                    (x: 4.0, y: 4.0),
                    (x: 2.0, y: 2.0),
                ],
            ],
        )
        .into();
        assert_eq!(geoms, vec![Some(expected)]);
    }

    #[test]
    fn native_multipolygon() {
        let (field, array) = fixtures::multipolygon();
        let geoms = decode_all(&field, array.as_ref());
        let Some(Geometry::MultiPolygon(mp)) = &geoms[0] else {
            panic!("expected a multipolygon, got {:?}", geoms[0]);
        };
        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[1].exterior().0[0], coord! { x: 20.0, y: 60.0 });
    }

    #[test]
    fn extension_name_wins_over_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert(
            "ARROW:extension:name".to_string(),
            "geoarrow.wkb".to_string(),
        );
        let field = Field::new("geometry", DataType::Binary, true).with_metadata(metadata);
        let column_meta: GeoParquetColumnMetadata = serde_json::from_str(
            r#"{"encoding": "point", "geometry_types": []}"#,
        )
        .unwrap();
        let encoding = GeometryEncoding::try_new(&field, Some(&column_meta)).unwrap();
        assert_eq!(encoding, GeometryEncoding::WKB);
    }

    #[test]
    fn metadata_encoding_without_extension() {
        let field = Field::new("geometry", DataType::Binary, true);
        let column_meta: GeoParquetColumnMetadata = serde_json::from_str(
            r#"{"encoding": "polygon", "geometry_types": ["Polygon"]}"#,
        )
        .unwrap();
        let encoding = GeometryEncoding::try_new(&field, Some(&column_meta)).unwrap();
        assert_eq!(encoding, GeometryEncoding::Native(NativeType::Polygon));
    }

    #[test]
    fn unknown_extension_type() {
        let mut metadata = HashMap::new();
        metadata.insert(
            "ARROW:extension:name".to_string(),
            "geoarrow.box".to_string(),
        );
        let field = Field::new("geometry", DataType::Binary, true).with_metadata(metadata);
        let err = GeometryEncoding::try_new(&field, None).unwrap_err();
        assert!(matches!(err, SwemapsError::IncorrectType(_)));
    }

    #[test]
    fn wrong_physical_type() {
        let array = BinaryArray::from_vec(vec![&b"\x01"[..]]);
        let encoding = GeometryEncoding::Native(NativeType::Polygon);
        assert!(GeometryDecoder::try_new(encoding, &array).is_err());
    }

    #[cfg(feature = "geozero")]
    #[test]
    fn wkb_polygon() {
        let ring = [(17.5, 59.0), (19.0, 59.0), (19.0, 60.0), (17.5, 59.0)];
        let array = BinaryArray::from_iter(vec![Some(wkb::polygon(&ring)), None]);
        let decoder = GeometryDecoder::try_new(GeometryEncoding::WKB, &array).unwrap();
        let expected: Geometry = polygon![
            (x: 17.5, y: 59.0),
            (x: 19.0, y: 59.0),
            (x: 19.0, y: 60.0),
            (x: 17.5, y: 59.0),
        ]
        .into();
        assert_eq!(decoder.geometry(0).unwrap(), Some(expected));
        assert_eq!(decoder.geometry(1).unwrap(), None);
    }

    #[cfg(feature = "geozero")]
    #[test]
    fn wkb_polygon_z_is_flattened() {
        let ring = [
            (17.5, 59.0, 10.0),
            (19.0, 59.0, 20.0),
            (19.0, 60.0, 30.0),
            (17.5, 59.0, 10.0),
        ];
        let array = BinaryArray::from_iter(vec![Some(wkb::polygon_z(&ring))]);
        let decoder = GeometryDecoder::try_new(GeometryEncoding::WKB, &array).unwrap();
        let expected: Geometry = polygon![
            (x: 17.5, y: 59.0),
            (x: 19.0, y: 59.0),
            (x: 19.0, y: 60.0),
            (x: 17.5, y: 59.0),
        ]
        .into();
        assert_eq!(decoder.geometry(0).unwrap(), Some(expected));
    }

    #[cfg(feature = "geozero")]
    #[test]
    fn large_binary_wkb() {
        let field = Field::new("geometry", DataType::LargeBinary, true);
        let array = LargeBinaryArray::from_iter(vec![Some(wkb::point(18.07, 59.33)), None]);
        let geoms = decode_all(&field, &array);
        assert_eq!(geoms, vec![Some(point!(x: 18.07, y: 59.33).into()), None]);
    }

    #[cfg(feature = "geozero")]
    #[test]
    fn wkt_point() {
        let array = arrow_array::StringArray::from(vec!["POINT (18.07 59.33)"]);
        let decoder = GeometryDecoder::try_new(GeometryEncoding::WKT, &array).unwrap();
        assert_eq!(
            decoder.geometry(0).unwrap(),
            Some(point!(x: 18.07, y: 59.33).into())
        );
    }

    #[cfg(feature = "geozero")]
    #[test]
    fn truncated_wkb() {
        let array = BinaryArray::from_vec(vec![&[1u8, 3, 0][..]]);
        let decoder = GeometryDecoder::try_new(GeometryEncoding::WKB, &array).unwrap();
        assert!(decoder.geometry(0).is_err());
    }

    #[cfg(not(feature = "geozero"))]
    #[test]
    fn wkb_requires_geozero() {
        let array = BinaryArray::from_vec(vec![&b"\x01"[..]]);
        let err = GeometryDecoder::try_new(GeometryEncoding::WKB, &array)
            .err()
            .unwrap();
        assert!(matches!(err, SwemapsError::MissingFeature("geozero")));
    }
}
