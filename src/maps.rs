//! The map identifiers known to this crate and the bundled map files.

use std::ffi::OsString;
use std::fmt::Display;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, SwemapsError};
use crate::io::parquet::read_geoparquet;
use crate::table::GeoTable;

/// Maps shipped inside the crate's `data/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundledMap {
    /// Municipalities (290 rows)
    Kommun,
    /// Counties (21 rows)
    Lan,
    /// Local labour market ("FA") regions (60 rows)
    Fa,
}

impl BundledMap {
    pub const ALL: [BundledMap; 3] = [BundledMap::Kommun, BundledMap::Lan, BundledMap::Fa];

    pub fn as_str(&self) -> &'static str {
        match self {
            BundledMap::Kommun => "kommun",
            BundledMap::Lan => "lan",
            BundledMap::Fa => "fa",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.parquet", self.as_str())
    }

    /// Location of the GeoParquet file for this map.
    pub fn path(&self) -> PathBuf {
        data_dir().join(self.file_name())
    }
}

impl FromStr for BundledMap {
    type Err = SwemapsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|map| map.as_str() == s)
            .ok_or_else(|| SwemapsError::map_not_found(s, Self::ALL.iter().map(|m| m.as_str())))
    }
}

impl Display for BundledMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Larger maps that are downloaded on demand, see [`Fetcher`][crate::Fetcher].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteMap {
    /// Electoral districts of the 2022 general election
    Valdistrikt2022,
    /// Regional statistical areas
    Regso,
    /// Demographic statistical areas
    Deso,
}

impl RemoteMap {
    pub const ALL: [RemoteMap; 3] = [
        RemoteMap::Valdistrikt2022,
        RemoteMap::Regso,
        RemoteMap::Deso,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteMap::Valdistrikt2022 => "valdistrikt_2022",
            RemoteMap::Regso => "regso",
            RemoteMap::Deso => "deso",
        }
    }

    /// Name of the file in the remote registry.
    pub fn file_name(&self) -> String {
        format!("{}.parquet", self.as_str())
    }
}

impl FromStr for RemoteMap {
    type Err = SwemapsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|map| map.as_str() == s)
            .ok_or_else(|| SwemapsError::map_not_found(s, Self::ALL.iter().map(|m| m.as_str())))
    }
}

impl Display for RemoteMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Environment variable that relocates the bundled GeoParquet files.
pub const DATA_DIR_ENV: &str = "SWEMAPS_DATA_DIR";

/// Directory holding the bundled GeoParquet files.
///
/// This is `$SWEMAPS_DATA_DIR` when set. Otherwise it is the `data/` directory of the crate
/// source, a path fixed at compile time that no longer exists once a binary is moved to another
/// machine. Deployed binaries should set the variable to a copy of the files.
pub fn data_dir() -> PathBuf {
    data_dir_from(std::env::var_os(DATA_DIR_ENV))
}

fn data_dir_from(dir: Option<OsString>) -> PathBuf {
    match dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
    }
}

/// Get the path for a specific map.
///
/// `map_type` is one of `"kommun"`, `"lan"` or `"fa"`. Any other value returns
/// [`SwemapsError::MapNotFound`].
///
/// ```
/// let path = swemaps::get_path("kommun").unwrap();
/// assert!(path.ends_with("data/kommun.parquet"));
///
/// assert!(swemaps::get_path("kommuner").is_err());
/// ```
pub fn get_path(map_type: &str) -> Result<PathBuf> {
    let map: BundledMap = map_type.parse()?;
    Ok(map.path())
}

/// Read a bundled map into a [`GeoTable`].
///
/// ```no_run
/// use arrow_array::cast::AsArray;
/// use arrow_array::BooleanArray;
///
/// let kommuner = swemaps::read_map("kommun")?;
/// // Municipalities in Dalarna have codes starting with "20"
/// let dalarna = kommuner.filter(|batch| {
///     let kommun_kod = batch.column(0).as_string::<i32>();
///     Ok(kommun_kod
///         .iter()
///         .map(|code| code.map(|code| code.starts_with("20")))
///         .collect::<BooleanArray>())
/// })?;
/// let geojson = swemaps::table_to_geojson(&dalarna)?;
/// assert_eq!(geojson.features.len(), dalarna.len());
/// # Ok::<(), swemaps::SwemapsError>(())
/// ```
pub fn read_map(map_type: &str) -> Result<GeoTable> {
    let path = get_path(map_type)?;
    let file = File::open(path)?;
    read_geoparquet(file, Default::default())
}

#[cfg(test)]
mod test {
    use super::*;

    const INVALID: [&str; 8] = [
        "",
        "Kommun",
        " lan",
        "fa ",
        "3.14",
        "true",
        "(1, 2, 3)",
        "valdistrikt_2022",
    ];

    #[test]
    fn bundled_paths() {
        for (map_type, file_name) in [
            ("kommun", "kommun.parquet"),
            ("lan", "lan.parquet"),
            ("fa", "fa.parquet"),
        ] {
            let path = get_path(map_type).unwrap();
            assert_eq!(path, data_dir().join(file_name));
        }
    }

    #[test]
    fn data_dir_override() {
        let default = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
        assert_eq!(data_dir_from(None), default);
        assert_eq!(data_dir_from(Some(OsString::new())), default);
        assert_eq!(
            data_dir_from(Some(OsString::from("/srv/swemaps"))),
            PathBuf::from("/srv/swemaps")
        );
    }

    #[test]
    fn invalid_bundled_map_types() {
        for map_type in INVALID {
            let err = get_path(map_type).unwrap_err();
            assert!(
                matches!(err, SwemapsError::MapNotFound { .. }),
                "{map_type:?}: {err}"
            );
        }
    }

    #[test]
    fn invalid_remote_map_types() {
        for map_type in ["", "kommun", "DeSO", "valdistrikt_2018", "3.14"] {
            let err = map_type.parse::<RemoteMap>().unwrap_err();
            assert!(matches!(err, SwemapsError::MapNotFound { .. }));
        }
    }

    #[test]
    fn error_lists_valid_choices() {
        let err = get_path("").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid map type: . Expected one of 'kommun', 'lan', 'fa'."
        );
        let err = "lan".parse::<RemoteMap>().unwrap_err();
        assert!(err
            .to_string()
            .ends_with("Expected one of 'valdistrikt_2022', 'regso', 'deso'."));
    }

    #[test]
    fn display_round_trips() {
        for map in BundledMap::ALL {
            assert_eq!(map.to_string().parse::<BundledMap>().unwrap(), map);
        }
        for map in RemoteMap::ALL {
            assert_eq!(map.to_string().parse::<RemoteMap>().unwrap(), map);
        }
    }

    #[test]
    fn read_map_validates_identifier() {
        let err = read_map("nope").unwrap_err();
        assert!(matches!(err, SwemapsError::MapNotFound { .. }));
    }

    #[cfg(feature = "geozero")]
    #[test]
    #[ignore = "requires the bundled GeoParquet files in data/"]
    fn bundled_maps_shape_and_geojson() {
        use std::collections::HashSet;

        for (map_type, shape) in [("lan", (21, 3)), ("kommun", (290, 3)), ("fa", (60, 6))] {
            assert!(get_path(map_type).unwrap().exists());

            let table = read_map(map_type).unwrap();
            assert_eq!(table.shape(), shape, "{map_type}");

            let collection = crate::table_to_geojson(&table).unwrap();
            assert_eq!(collection.features.len(), shape.0);
            let keys: HashSet<&String> = collection
                .features
                .iter()
                .flat_map(|feature| feature.properties.iter().flat_map(|props| props.keys()))
                .collect();
            assert_eq!(keys.len() + 1, shape.1);
        }
    }

    #[cfg(feature = "geozero")]
    #[test]
    #[ignore = "requires the bundled GeoParquet files in data/"]
    fn bundled_lan_01_matches_reference_geojson() {
        use arrow_array::cast::AsArray;
        use arrow_array::BooleanArray;

        let lan = read_map("lan").unwrap();
        let lan_kod = lan.column_index("lan_kod").unwrap();
        let stockholm = lan
            .filter(|batch| {
                Ok(batch
                    .column(lan_kod)
                    .as_string::<i32>()
                    .iter()
                    .map(|code| code.map(|code| code == "01"))
                    .collect::<BooleanArray>())
            })
            .unwrap();
        assert_eq!(stockholm.len(), 1);

        let actual = crate::table_to_geojson(&stockholm).unwrap();
        let reference: geojson::FeatureCollection =
            serde_json::from_str(include_str!("../fixtures/lan_01.geojson")).unwrap();
        assert_eq!(actual.features.len(), reference.features.len());
        assert_eq!(
            actual.features[0].properties,
            reference.features[0].properties
        );
        // The archipelago makes the real county a multipolygon
        let geometry = actual.features[0].geometry.as_ref().unwrap();
        assert!(matches!(
            geometry.value,
            geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_)
        ));
    }
}
