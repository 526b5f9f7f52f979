use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisasterDataError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to scrape {url}: {message}")]
    ScrapeError { url: String, message: String },

    #[error("GDAL command '{command}' failed: {message}")]
    GdalError { command: String, message: String },

    #[error("Image API error: {message}")]
    ApiError { message: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Queue error: {message}")]
    QueueError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Parsing,
    Geoprocessing,
    Storage,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DisasterDataError {
    pub fn scrape(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScrapeError {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::CatalogError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::ApiError { .. } | Self::ScrapeError { .. } => {
                ErrorCategory::Network
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::SerializationError(_) | Self::XmlError(_) | Self::CsvError(_) => {
                ErrorCategory::Parsing
            }
            Self::GdalError { .. } => ErrorCategory::Geoprocessing,
            Self::IoError(_)
            | Self::ZipError(_)
            | Self::StorageError { .. }
            | Self::QueueError { .. }
            | Self::CatalogError { .. } => ErrorCategory::Storage,
            Self::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Parsing | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Geoprocessing => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpError(_) | Self::ScrapeError { .. } => {
                "Check network connectivity; the source site may have changed its layout or be temporarily down"
            }
            Self::ApiError { .. } => "Verify DG_API_KEY and the image API endpoint",
            Self::GdalError { .. } => {
                "Make sure the GDAL command line tools (gdalinfo, gdalwarp, gdal_translate, ogr2ogr) are installed and on PATH"
            }
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigError { .. } => "Review the settings file and command line arguments",
            Self::CatalogError { .. } => {
                "Initialise the catalog first (`disaster-data catalog init`)"
            }
            Self::StorageError { .. } | Self::IoError(_) => {
                "Check the output location exists and is writable"
            }
            Self::QueueError { .. } => "Check the queue name and credentials",
            Self::SerializationError(_) | Self::XmlError(_) | Self::CsvError(_) => {
                "The input document is malformed; inspect it manually"
            }
            Self::ZipError(_) => "The archive is corrupt; remove it and download again",
            Self::ProcessingError { .. } => "Re-run with --verbose to see which record failed",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Parsing => format!("Could not parse input: {}", self),
            ErrorCategory::Geoprocessing => format!("GDAL problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Processing => format!("Processing problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DisasterDataError>;
