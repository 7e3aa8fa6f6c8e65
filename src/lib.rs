//! Swedish administrative and statistical maps as [GeoParquet](https://geoparquet.org), with
//! helpers to load them into Arrow and convert them to GeoJSON.
//!
//! Municipalities (`kommun`), counties (`lan`) and local labour market regions (`fa`) ship with
//! the crate, see [`get_path`] and [`read_map`]. Larger maps (`valdistrikt_2022`, `regso` and
//! `deso`) are downloaded on first use and cached, see [`fetch_map`].
//!
//! ```no_run
//! let table = swemaps::read_map("lan")?;
//! let geojson = swemaps::table_to_geojson(&table)?;
//! assert_eq!(geojson.features.len(), 21);
//!
//! swemaps::write_geojson(&table, std::io::stdout())?;
//! # Ok::<(), swemaps::SwemapsError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub use error::{Result, SwemapsError};
#[cfg(feature = "fetch")]
pub use fetch::{fetch_map, Fetcher, FetcherOptions};
pub use io::geojson::{table_to_geojson, write_geojson, GeoJsonOptions};
pub use maps::{get_path, read_map, BundledMap, RemoteMap};
pub use table::GeoTable;

pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod io;
pub mod maps;
pub mod table;
