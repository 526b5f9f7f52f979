use crate::config::settings::Settings;
use crate::core::gdal::GdalCli;
use crate::core::http::HttpClient;
use crate::domain::ports::RasterInspector;
use crate::sources::dg_open_data::DigitalGlobeApi;
use crate::utils::error::Result;
use std::sync::Arc;

/// Everything a scrape needs besides storage and run options.
#[derive(Clone)]
pub struct ScrapeContext {
    pub http: HttpClient,
    pub settings: Arc<Settings>,
    pub inspector: Arc<dyn RasterInspector>,
}

impl ScrapeContext {
    pub fn new(settings: Settings, inspector: Arc<dyn RasterInspector>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(&settings.http)?,
            settings: Arc::new(settings),
            inspector,
        })
    }

    /// Context backed by the GDAL command line tools.
    pub fn with_gdal(settings: Settings) -> Result<Self> {
        let gdal = GdalCli::new(settings.gdal.clone());
        Self::new(settings, Arc::new(gdal))
    }

    /// Image API client, when a key is configured.
    pub fn dg_api(&self) -> Option<DigitalGlobeApi> {
        self.settings.dg_api_key().map(|key| {
            DigitalGlobeApi::new(
                self.http.inner().clone(),
                self.settings.digital_globe.api_url.clone(),
                key,
            )
        })
    }
}
