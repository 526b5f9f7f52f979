#![allow(dead_code)]

use async_trait::async_trait;
use clap::Parser;
use disaster_data::domain::model::Geometry;
use disaster_data::domain::ports::{RasterInfo, RasterInspector};
use disaster_data::{CliConfig, Result, ScrapeContext, Settings};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub fn square(x: f64, y: f64, size: f64) -> Geometry {
    Geometry::Polygon {
        coordinates: vec![vec![
            vec![x, y],
            vec![x + size, y],
            vec![x + size, y + size],
            vec![x, y + size],
            vec![x, y],
        ]],
    }
}

/// Stands in for the GDAL command line tools.
#[derive(Default)]
pub struct FakeGdal {
    pub tiles: Vec<Geometry>,
    pub inspected: Mutex<Vec<String>>,
}

impl FakeGdal {
    pub fn with_tiles(tiles: Vec<Geometry>) -> Self {
        Self {
            tiles,
            inspected: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RasterInspector for FakeGdal {
    async fn info(&self, path: &str) -> Result<RasterInfo> {
        self.inspected.lock().unwrap().push(path.to_string());
        let info = serde_json::json!({
            "files": [path],
            "coordinateSystem": {"wkt": "GEOGCS[\"WGS 84\",AUTHORITY[\"EPSG\",\"4326\"]]"},
            "geoTransform": [-95.6, 0.00001, 0.0, 29.8, 0.0, -0.00001],
            "wgs84Extent": {
                "type": "Polygon",
                "coordinates": [[[-95.6, 29.8], [-95.6, 29.7], [-95.5, 29.7], [-95.5, 29.8], [-95.6, 29.8]]]
            }
        });
        Ok(serde_json::from_value(info)?)
    }

    async fn pixel_size_in(&self, _path: &str, _epsg: u32) -> Result<f64> {
        Ok(0.5)
    }

    async fn thumbnail(&self, _src: &str, dst: &Path, _percent: u32) -> Result<()> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dst, b"jpeg")?;
        Ok(())
    }

    async fn vector_geometries(&self, _path: &str) -> Result<Vec<Geometry>> {
        Ok(self.tiles.clone())
    }
}

pub fn cli(args: &[&str]) -> CliConfig {
    let mut argv = vec!["disaster-data"];
    argv.extend_from_slice(args);
    CliConfig::try_parse_from(argv).unwrap().with_concurrency(2)
}

pub fn context(settings: Settings, gdal: FakeGdal) -> ScrapeContext {
    ScrapeContext::new(settings, Arc::new(gdal)).unwrap()
}
