use crate::config::settings::GdalSettings;
use crate::core::geometry::{bbox_of, epsg_from_wkt};
use crate::domain::model::{Asset, Geometry, Item};
use crate::domain::ports::{RasterInfo, RasterInspector};
use crate::utils::error::{DisasterDataError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

impl RasterInfo {
    pub fn bbox(&self) -> Option<crate::domain::model::Bbox> {
        self.wgs84_extent.as_ref().and_then(|g| bbox_of(g.positions()))
    }

    pub fn epsg(&self) -> Option<u32> {
        self.coordinate_system
            .as_ref()
            .and_then(|cs| epsg_from_wkt(&cs.wkt))
    }

    /// Mean of the pixel width and height, in native units.
    pub fn mean_pixel_size(&self) -> Option<f64> {
        match self.geo_transform.as_deref() {
            Some([_, width, _, _, _, height]) => Some((width + height.abs()) / 2.0),
            _ => None,
        }
    }

    pub fn pixel_width(&self) -> Option<f64> {
        self.geo_transform.as_ref().and_then(|gt| gt.get(1).copied())
    }
}

/// Drops a leading `/vsi…/` handler from a GDAL path.
pub fn strip_vsi(path: &str) -> String {
    if path.starts_with("/vsi") {
        path.splitn(3, '/').nth(2).unwrap_or_default().to_string()
    } else {
        path.to_string()
    }
}

/// Incomplete STAC item derived from raster metadata alone.
pub fn partial_item(id: &str, info: &RasterInfo) -> Item {
    let mut item = Item::new(id);
    item.bbox = info.bbox();
    item.geometry = info.wgs84_extent.clone();
    item.properties.epsg = info.epsg();
    item.properties.gsd = info.mean_pixel_size();
    if let Some(file) = info.files.first() {
        item.assets
            .insert("data".to_string(), Asset::new(strip_vsi(file)));
    }
    item
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<serde_json::Value>,
}

/// Parses GeoJSON exported by `ogr2ogr`, keeping only (multi)polygons.
pub fn polygons_from_geojson(body: &[u8]) -> Result<Vec<Geometry>> {
    let collection: FeatureCollection = serde_json::from_slice(body)?;
    Ok(collection
        .features
        .into_iter()
        .filter_map(|f| f.geometry)
        .filter_map(|g| serde_json::from_value::<Geometry>(g).ok())
        .collect())
}

/// Runs the GDAL command line utilities.
#[derive(Debug, Clone)]
pub struct GdalCli {
    settings: GdalSettings,
}

impl GdalCli {
    pub fn new(settings: GdalSettings) -> Self {
        Self { settings }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        tracing::debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| DisasterDataError::GdalError {
                command: program.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DisasterDataError::GdalError {
                command: format!("{} {}", program, args.join(" ")),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl RasterInspector for GdalCli {
    async fn info(&self, path: &str) -> Result<RasterInfo> {
        let stdout = self.run(&self.settings.gdalinfo, &["-json", path]).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn pixel_size_in(&self, path: &str, epsg: u32) -> Result<f64> {
        let workdir = tempfile::tempdir()?;
        let vrt = workdir.path().join("warped.vrt");
        let vrt = vrt.to_string_lossy();
        let srs = format!("EPSG:{}", epsg);

        self.run(
            &self.settings.gdalwarp,
            &["-overwrite", "-of", "VRT", "-t_srs", &srs, path, &vrt],
        )
        .await?;

        let warped = self.info(&vrt).await?;
        warped
            .pixel_width()
            .ok_or_else(|| DisasterDataError::GdalError {
                command: self.settings.gdalwarp.clone(),
                message: format!("warped dataset for {} has no geotransform", path),
            })
    }

    async fn thumbnail(&self, src: &str, dst: &Path, percent: u32) -> Result<()> {
        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = format!("{}%", percent);
        let dst = dst.to_string_lossy();
        self.run(
            &self.settings.gdal_translate,
            &["-of", "JPEG", "-outsize", &size, &size, src, &dst],
        )
        .await?;
        Ok(())
    }

    async fn vector_geometries(&self, path: &str) -> Result<Vec<Geometry>> {
        let stdout = self
            .run(
                &self.settings.ogr2ogr,
                &["-f", "GeoJSON", "-t_srs", "EPSG:4326", "/vsistdout/", path],
            )
            .await?;
        polygons_from_geojson(&stdout)
    }
}
