use crate::domain::model::Contact;
use crate::utils::error::{DisasterDataError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 7.0; Windows NT 5.1)";

/// Runtime settings, loaded from an optional TOML file.
///
/// Every section has defaults pointing at the production sites, so an empty
/// file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    pub sources: SourceSettings,
    pub digital_globe: DigitalGlobeSettings,
    pub oam: OamSettings,
    pub storage: StorageSettings,
    pub queue: QueueSettings,
    pub gdal: GdalSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub concurrent_requests: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 120,
            concurrent_requests: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub noaa_coast: String,
    pub noaa_storm: String,
    pub dg_open_data: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            noaa_coast: "https://coast.noaa.gov/htdata/raster2/index.html".to_string(),
            noaa_storm: "https://storms.ngs.noaa.gov/".to_string(),
            dg_open_data: "https://www.digitalglobe.com/ecosystem/open-data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalGlobeSettings {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for DigitalGlobeSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.discover.digitalglobe.com/v1/services/ImageServer/query"
                .to_string(),
            api_key: std::env::var("DG_API_KEY").ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OamSettings {
    pub upload_url: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub key_prefix: String,
}

impl Default for OamSettings {
    fn default() -> Self {
        Self {
            upload_url: "https://api.openaerialmap.org/uploads".to_string(),
            contact_name: None,
            contact_email: None,
            key_prefix: "oam".to_string(),
        }
    }
}

impl OamSettings {
    pub fn contact(&self) -> Result<Contact> {
        Ok(Contact {
            name: validation::validate_required_field("oam.contact_name", &self.contact_name)?
                .clone(),
            email: validation::validate_required_field("oam.contact_email", &self.contact_email)?
                .clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    pub thumbnail_prefix: String,
    pub catalog_prefix: String,
    /// Public HTTP root of the published catalog.
    pub public_root: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: "cognition-disaster-data".to_string(),
            region: "us-east-1".to_string(),
            thumbnail_prefix: "thumbnails".to_string(),
            catalog_prefix: String::new(),
            public_root: "https://cognition-disaster-data.s3.amazonaws.com".to_string(),
        }
    }
}

impl StorageSettings {
    pub fn thumbnail_key(&self, event: &str, date: &str, id: &str) -> String {
        format!("{}/{}/{}/{}.jpg", self.thumbnail_prefix, event, date, id)
    }

    /// Public URL of a thumbnail once written through the bucket storage,
    /// which files every key below `catalog_prefix`.
    pub fn thumbnail_href(&self, event: &str, date: &str, id: &str) -> String {
        format!(
            "https://{}.s3.amazonaws.com/{}",
            self.bucket,
            prefixed_key(&self.catalog_prefix, &self.thumbnail_key(event, date, id))
        )
    }
}

/// Bucket key of a storage path below `prefix`.
pub fn prefixed_key(prefix: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub thumbnail_queue: String,
    /// JSON-lines file used instead of SQS when built without the `aws` feature.
    pub local_file: String,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            thumbnail_queue: "newThumbnailQueue".to_string(),
            local_file: "thumbnail-queue.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GdalSettings {
    pub gdalinfo: String,
    pub gdalwarp: String,
    pub gdal_translate: String,
    pub ogr2ogr: String,
    pub thumbnail_percent: u32,
}

impl Default for GdalSettings {
    fn default() -> Self {
        Self {
            gdalinfo: "gdalinfo".to_string(),
            gdalwarp: "gdalwarp".to_string(),
            gdal_translate: "gdal_translate".to_string(),
            ogr2ogr: "ogr2ogr".to_string(),
            thumbnail_percent: 15,
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DisasterDataError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DisasterDataError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// DigitalGlobe key, ignoring unresolved `${VAR}` placeholders.
    pub fn dg_api_key(&self) -> Option<&str> {
        self.digital_globe
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("http.user_agent", &self.http.user_agent)?;
        validation::validate_positive_number(
            "http.concurrent_requests",
            self.http.concurrent_requests,
            1,
        )?;
        validation::validate_range("http.concurrent_requests", self.http.concurrent_requests, 1, 256)?;

        validation::validate_url("sources.noaa_coast", &self.sources.noaa_coast)?;
        validation::validate_url("sources.noaa_storm", &self.sources.noaa_storm)?;
        validation::validate_url("sources.dg_open_data", &self.sources.dg_open_data)?;
        validation::validate_url("digital_globe.api_url", &self.digital_globe.api_url)?;
        validation::validate_url("oam.upload_url", &self.oam.upload_url)?;
        validation::validate_url("storage.public_root", &self.storage.public_root)?;

        validation::validate_s3_bucket_name("storage.bucket", &self.storage.bucket)?;
        validation::validate_non_empty_string("queue.thumbnail_queue", &self.queue.thumbnail_queue)?;
        validation::validate_range("gdal.thumbnail_percent", self.gdal.thumbnail_percent, 1, 100)?;

        tracing::debug!("✅ Settings validation passed");
        Ok(())
    }
}
