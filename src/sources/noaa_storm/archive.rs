//! Downloaded NOAA Storm imagery and the STAC items built from it.

use crate::config::settings::StorageSettings;
use crate::core::geometry::{acquisition_date, bbox_center, utm_epsg};
use crate::core::gdal::partial_item;
use crate::core::http::HttpClient;
use crate::domain::model::{Asset, Item, StormRecord};
use crate::domain::ports::RasterInspector;
use crate::sources::file_stem;
use crate::sources::noaa_storm::bands::{dss, DATA_BAND_ORDER};
use crate::utils::error::{DisasterDataError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// EPSG code of the JPEG tile world files (NAD83).
pub const JPEG_TILE_EPSG: u32 = 4269;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Zip,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Oblique imagery described by `.vrt` files.
    Oblique,
    /// GeoTIFF mosaics.
    Rgb,
    /// JPEG tiles georeferenced by `.jgw`/`.wld` world files.
    JpegTiles,
}

impl ArchiveKind {
    pub fn data_media_type(&self) -> &'static str {
        match self {
            ArchiveKind::Oblique => "application/xml",
            ArchiveKind::Rgb => "image/x.geotiff",
            ArchiveKind::JpegTiles => "image/jpeg",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Oblique => ".vrt",
            ArchiveKind::Rgb => ".tif",
            ArchiveKind::JpegTiles => ".jpg",
        }
    }
}

fn basename(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// A downloaded record, listed but not yet read by GDAL.
#[derive(Debug, Clone)]
pub struct Archive {
    pub record: StormRecord,
    pub local: PathBuf,
    pub format: ArchiveFormat,
    pub entries: Vec<String>,
    /// Public href per entry basename.
    remote: HashMap<String, String>,
}

/// One built item and the thumbnail rendered for it.
#[derive(Debug, Clone)]
pub struct ArchiveItem {
    pub item: Item,
    pub thumbnail: PathBuf,
    pub thumbnail_key: String,
}

impl Archive {
    /// Downloads a record below `workdir`. Modern records are one archive;
    /// legacy ones become a directory holding the image and its world file.
    pub async fn download(http: &HttpClient, record: StormRecord, workdir: &Path) -> Result<Self> {
        match &record {
            StormRecord::Modern { download_link, .. } => {
                let local = http.download(download_link, workdir).await?;
                Self::open(record.clone(), local).await
            }
            StormRecord::Old {
                download_link,
                world_file,
                ..
            } => {
                let dir = workdir.join(file_stem(download_link));
                http.download(download_link, &dir).await?;
                http.download(world_file, &dir).await?;
                Self::open(record.clone(), dir).await
            }
        }
    }

    /// Lists an already downloaded archive or directory.
    pub async fn open(record: StormRecord, local: PathBuf) -> Result<Self> {
        let format = if local.is_dir() {
            ArchiveFormat::Directory
        } else {
            match local.extension().and_then(|e| e.to_str()) {
                Some("tar") => ArchiveFormat::Tar,
                Some("zip") => ArchiveFormat::Zip,
                _ => {
                    return Err(DisasterDataError::ProcessingError {
                        message: format!("unsupported archive: {}", local.display()),
                    })
                }
            }
        };

        let path = local.clone();
        let entries = tokio::task::spawn_blocking(move || list_entries(&path, format))
            .await
            .map_err(|e| DisasterDataError::ProcessingError {
                message: format!("archive listing task failed: {}", e),
            })??;

        let remote = match &record {
            StormRecord::Old {
                download_link,
                world_file,
                ..
            } => [download_link, world_file]
                .into_iter()
                .map(|url| (basename(url).to_string(), url.clone()))
                .collect(),
            StormRecord::Modern { download_link, .. } => entries
                .iter()
                .map(|entry| {
                    let name = basename(entry);
                    (
                        name.to_string(),
                        format!("{}/{}", download_link.trim_end_matches('/'), name),
                    )
                })
                .collect(),
        };

        tracing::debug!("Listed {} entries in {}", entries.len(), local.display());
        Ok(Self {
            record,
            local,
            format,
            entries,
            remote,
        })
    }

    /// Decided by what the archive holds: `.vrt`, then `.tif`, then `.jpg`.
    pub fn kind(&self) -> Option<ArchiveKind> {
        [ArchiveKind::Oblique, ArchiveKind::Rgb, ArchiveKind::JpegTiles]
            .into_iter()
            .find(|kind| self.with_extension(kind.extension()).next().is_some())
    }

    fn with_extension<'a>(&'a self, ext: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.to_lowercase().ends_with(ext))
    }

    /// Path GDAL opens for an entry.
    pub fn gdal_path(&self, entry: &str) -> String {
        let local = std::path::absolute(&self.local).unwrap_or_else(|_| self.local.clone());
        let local = local.to_string_lossy();
        match self.format {
            ArchiveFormat::Tar => format!("/vsitar/{}/{}", local, entry),
            ArchiveFormat::Zip => format!("/vsizip/{}/{}", local, entry),
            ArchiveFormat::Directory => format!("{}/{}", local, entry),
        }
    }

    pub fn remote_href(&self, entry: &str) -> String {
        let name = basename(entry);
        self.remote
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{}/{}", self.record.download_link(), name))
    }

    /// World file sharing the stem of a JPEG tile.
    pub fn world_file_for(&self, entry: &str) -> Option<&String> {
        let stem = file_stem(entry);
        self.with_extension(".jgw")
            .chain(self.with_extension(".wld"))
            .find(|candidate| file_stem(candidate) == stem)
    }

    /// Builds one item per raster, rendering a thumbnail for each into
    /// `{thumbdir}/{date}/{id}.jpg`. Rasters GDAL cannot read are skipped.
    pub async fn build_items<R: RasterInspector + ?Sized>(
        &self,
        inspector: &R,
        storage: &StorageSettings,
        thumbdir: &Path,
        thumbnail_percent: u32,
    ) -> Result<Vec<ArchiveItem>> {
        let Some(kind) = self.kind() else {
            tracing::warn!("No imagery found in {}", self.local.display());
            return Ok(Vec::new());
        };

        let rasters: Vec<&String> = self.with_extension(kind.extension()).collect();
        let mut built = Vec::with_capacity(rasters.len());
        for entry in rasters {
            match self
                .build_item(inspector, storage, thumbdir, thumbnail_percent, kind, entry)
                .await
            {
                Ok(item) => built.push(item),
                Err(e) => tracing::warn!("⚠️ Skipping {}: {}", entry, e),
            }
        }

        tracing::info!(
            "Built {} items from {} ({:?})",
            built.len(),
            self.record.download_link(),
            kind
        );
        Ok(built)
    }

    async fn build_item<R: RasterInspector + ?Sized>(
        &self,
        inspector: &R,
        storage: &StorageSettings,
        thumbdir: &Path,
        thumbnail_percent: u32,
        kind: ArchiveKind,
        entry: &str,
    ) -> Result<ArchiveItem> {
        let event = self.record.event_name();
        let id = file_stem(entry);
        let date = acquisition_date(basename(entry))?;
        let path = self.gdal_path(entry);

        let info = inspector.info(&path).await?;
        let mut item = partial_item(id, &info);
        item.set_collection(event);

        let bbox = item.bbox.ok_or_else(|| DisasterDataError::GdalError {
            command: "gdalinfo".to_string(),
            message: format!("{} has no WGS84 extent", path),
        })?;
        let (lon, lat) = bbox_center(&bbox);

        item.properties.datetime = Some(date.clone());
        item.properties.platform = Some("aerial".to_string());
        item.properties.instrument = Some("TrimbleDSS".to_string());
        item.properties.bands = Some(dss());
        item.properties.gsd = Some(inspector.pixel_size_in(&path, utm_epsg(lon, lat)).await?);
        item.properties.epsg = match kind {
            ArchiveKind::JpegTiles => Some(JPEG_TILE_EPSG),
            _ => info.epsg(),
        };

        item.assets.insert(
            "data".to_string(),
            Asset::new(self.remote_href(entry))
                .with_title("Raster data")
                .with_type(kind.data_media_type())
                .with_bands(DATA_BAND_ORDER.to_vec()),
        );
        if let Some(metadata) = self.record.metadata_url().filter(|url| !url.is_empty()) {
            item.assets.insert(
                "metadata".to_string(),
                Asset::new(metadata)
                    .with_title("FGDC metadata")
                    .with_type("text/plain"),
            );
        }
        item.assets.insert(
            "thumbnail".to_string(),
            Asset::new(storage.thumbnail_href(event, &date, id))
                .with_title("Thumbnail")
                .with_type("image/jpeg"),
        );
        if kind == ArchiveKind::JpegTiles {
            match self.world_file_for(entry) {
                Some(world_file) => {
                    item.assets.insert(
                        "worldfile".to_string(),
                        Asset::new(self.remote_href(world_file))
                            .with_title("Worldfile")
                            .with_type("text/plain"),
                    );
                }
                None => tracing::warn!("No world file for {}", entry),
            }
        }

        let thumbnail = thumbdir.join(&date).join(format!("{}.jpg", id));
        inspector.thumbnail(&path, &thumbnail, thumbnail_percent).await?;

        Ok(ArchiveItem {
            thumbnail_key: storage.thumbnail_key(event, &date, id),
            item,
            thumbnail,
        })
    }
}

fn list_entries(path: &Path, format: ArchiveFormat) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    match format {
        ArchiveFormat::Tar => {
            let mut archive = tar::Archive::new(File::open(path)?);
            for entry in archive.entries()? {
                let entry = entry?;
                if entry.header().entry_type().is_file() {
                    entries.push(entry.path()?.to_string_lossy().to_string());
                }
            }
        }
        ArchiveFormat::Zip => {
            let archive = zip::ZipArchive::new(File::open(path)?)?;
            entries.extend(
                archive
                    .file_names()
                    .filter(|name| !name.ends_with('/'))
                    .map(str::to_string),
            );
        }
        ArchiveFormat::Directory => {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    entries.push(entry.file_name().to_string_lossy().to_string());
                }
            }
        }
    }
    entries.sort();
    Ok(entries)
}
