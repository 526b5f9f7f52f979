use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const STAC_VERSION: &str = "0.7.0";

/// Bounding box as `[min x, min y, max x, max y]`.
pub type Bbox = [f64; 4];

/// GeoJSON position; tile indexes occasionally carry a Z value.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    pub fn positions(&self) -> Vec<&Position> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.iter().flatten().collect(),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
            title: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Band indices into the item's `eo:bands`.
    #[serde(rename = "eo:bands", default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<usize>>,
}

impl Asset {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_bands(mut self, bands: Vec<usize>) -> Self {
        self.bands = Some(bands);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub common_name: String,
    pub center_wavelength: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_width_half_max: Option<f64>,
}

impl Band {
    pub fn new(name: &str, common_name: &str, center_wavelength: f64) -> Self {
        Self {
            name: name.to_string(),
            common_name: common_name.to_string(),
            center_wavelength,
            full_width_half_max: None,
        }
    }

    pub fn with_fwhm(mut self, full_width_half_max: f64) -> Self {
        self.full_width_half_max = Some(full_width_half_max);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<Bbox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<[Option<String>; 2]>,
}

impl Extent {
    pub fn start(&self) -> Option<&str> {
        self.temporal.as_ref().and_then(|t| t[0].as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub stac_version: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Catalog {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            title: None,
            description: description.into(),
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub stac_version: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub extent: Extent,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, Asset>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            stac_version: STAC_VERSION.to_string(),
            id: id.into(),
            title: None,
            description: String::new(),
            license: None,
            providers: Vec::new(),
            extent: Extent::default(),
            assets: BTreeMap::new(),
            links: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(rename = "eo:platform", default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(rename = "eo:instrument", default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(rename = "eo:bands", default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<Band>>,
    #[serde(rename = "eo:gsd", default, skip_serializing_if = "Option::is_none")]
    pub gsd: Option<f64>,
    #[serde(rename = "eo:epsg", default, skip_serializing_if = "Option::is_none")]
    pub epsg: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Bbox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: ItemProperties,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            feature_type: "Feature".to_string(),
            id: id.into(),
            collection: None,
            bbox: None,
            geometry: None,
            properties: ItemProperties::default(),
            assets: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    /// Sets the collection both at item level and inside the properties.
    pub fn set_collection(&mut self, collection: &str) {
        self.collection = Some(collection.to_string());
        self.properties.collection = Some(collection.to_string());
    }
}

/// Top-level catalogs, one per scraped website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    NoaaCoast,
    NoaaStorm,
    DgOpenData,
}

impl DataSource {
    pub const ROOT_ID: &'static str = "cognition-disaster-data";
    pub const ROOT_DESCRIPTION: &'static str = "Geospatial disaster data.";

    pub fn all() -> [DataSource; 3] {
        [DataSource::NoaaCoast, DataSource::NoaaStorm, DataSource::DgOpenData]
    }

    pub fn id(&self) -> &'static str {
        match self {
            DataSource::NoaaCoast => "NOAACoast",
            DataSource::NoaaStorm => "NOAAStorm",
            DataSource::DgOpenData => "DGOpenData",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DataSource::NoaaCoast => "Disaster data scraped from NOAA Coast FTP server (https://coast.noaa.gov/htdata/raster2/index.html#imagery)",
            DataSource::NoaaStorm => "Aerial imagery of storm events scraped from NOAA NGS Emergency Response Imagery (https://storms.ngs.noaa.gov/)",
            DataSource::DgOpenData => "Satellite imagery scraped from the DigitalGlobe Open Data Program (https://www.digitalglobe.com/ecosystem/open-data)",
        }
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.id(), self.description())
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "noaacoast" | "noaa" => Ok(DataSource::NoaaCoast),
            "noaastorm" => Ok(DataSource::NoaaStorm),
            "dgopendata" | "dg" => Ok(DataSource::DgOpenData),
            other => Err(format!("unknown data source: {}", other)),
        }
    }
}

/// `.tif` URLs listed for one NOAA Coast collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItems {
    pub collection: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoastIndex {
    #[serde(alias = "features")]
    pub collections: Vec<Collection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CollectionItems>>,
}

/// One downloadable unit found on the NOAA Storm site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StormRecord {
    /// Tar archive of GeoTIFFs with a tile index shapefile.
    Modern {
        event_name: String,
        download_link: String,
        tile_index: String,
        #[serde(default)]
        metadata_url: Option<String>,
    },
    /// Single JPEG with a world file.
    Old {
        event_name: String,
        download_link: String,
        world_file: String,
        #[serde(default)]
        metadata_url: Option<String>,
    },
}

impl StormRecord {
    pub fn event_name(&self) -> &str {
        match self {
            StormRecord::Modern { event_name, .. } | StormRecord::Old { event_name, .. } => {
                event_name
            }
        }
    }

    pub fn download_link(&self) -> &str {
        match self {
            StormRecord::Modern { download_link, .. } | StormRecord::Old { download_link, .. } => {
                download_link
            }
        }
    }

    pub fn metadata_url(&self) -> Option<&str> {
        match self {
            StormRecord::Modern { metadata_url, .. } | StormRecord::Old { metadata_url, .. } => {
                metadata_url.as_deref()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DgEvent {
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub date_available: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DgCatalogScrape {
    pub collections: Vec<Collection>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

/// OpenAerialMap scene definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OamScene {
    pub title: String,
    pub contact: Contact,
    pub provider: String,
    pub platform: String,
    pub license: String,
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OamUpload {
    pub scenes: Vec<OamScene>,
}
