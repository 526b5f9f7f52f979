use crate::domain::model::Geometry;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
    /// Human readable location of `path`, used in logs and command output.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    /// Restricts scraping to these event/collection ids when non-empty.
    fn ids(&self) -> &[String];
    fn include_items(&self) -> bool;
    fn concurrent_requests(&self) -> usize;

    fn wants(&self, id: &str) -> bool {
        self.ids().is_empty() || self.ids().iter().any(|wanted| wanted == id)
    }
}

/// Subset of `gdalinfo -json` output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterInfo {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub coordinate_system: Option<CoordinateSystem>,
    #[serde(default)]
    pub geo_transform: Option<Vec<f64>>,
    #[serde(default)]
    pub wgs84_extent: Option<Geometry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoordinateSystem {
    #[serde(default)]
    pub wkt: String,
}

/// GDAL/OGR introspection used to enrich scraped records.
#[async_trait]
pub trait RasterInspector: Send + Sync {
    async fn info(&self, path: &str) -> Result<RasterInfo>;

    /// Pixel width of `path` once warped into `epsg`.
    async fn pixel_size_in(&self, path: &str, epsg: u32) -> Result<f64>;

    /// Renders a downscaled JPEG of `src` into `dst`.
    async fn thumbnail(&self, src: &str, dst: &Path, percent: u32) -> Result<()>;

    /// Feature geometries of the first layer of a vector dataset.
    async fn vector_geometries(&self, path: &str) -> Result<Vec<Geometry>>;
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, body: String) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Scraped: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Vec<Self::Scraped>>;
    async fn transform(&self, scraped: Vec<Self::Scraped>) -> Result<Self::Output>;
    async fn load(&self, output: Self::Output) -> Result<String>;
}
