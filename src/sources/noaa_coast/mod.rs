//! NOAA Office for Coastal Management raster imagery index.

pub mod metadata;
pub mod spider;

pub use metadata::{parse_project_metadata, ProjectMetadata};
pub use spider::{parse_imagery_table, parse_url_list, tile_index_path, url_list_url};
