use crate::app::context::ScrapeContext;
use crate::app::pipelines::dg_open_data_pipeline::scrape_events;
use crate::domain::model::{OamScene, OamUpload};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::sources::dg_open_data::oam::{complete_scene, split_title, upload_definition, upload_key};
use crate::sources::dg_open_data::{parse_oam_scenes, DigitalGlobeApi};
use crate::utils::error::{DisasterDataError, Result};
use futures::stream::{self, StreamExt};

/// One upload definition and where it is stored.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub key: String,
    pub definition: OamUpload,
}

/// Builds OpenAerialMap upload definitions for DigitalGlobe imagery.
pub struct OamPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) context: ScrapeContext,
    api: DigitalGlobeApi,
}

impl<S: Storage, C: ConfigProvider> OamPipeline<S, C> {
    /// Requires an image API key; acquisition times come from it.
    pub fn new(storage: S, config: C, context: ScrapeContext) -> Result<Self> {
        let api = context.dg_api().ok_or_else(|| DisasterDataError::MissingConfigError {
            field: "digital_globe.api_key".to_string(),
        })?;
        Ok(Self {
            storage,
            config,
            context,
            api,
        })
    }

    async fn complete(&self, scene: OamScene) -> Result<Option<PendingUpload>> {
        let (event, image_id) = split_title(&scene.title).ok_or_else(|| DisasterDataError::ProcessingError {
            message: format!("scene title has no image id: {}", scene.title),
        })?;
        let key = upload_key(&self.context.settings.oam.key_prefix, event, image_id);

        let Some(attributes) = self.api.image_attributes(image_id).await? else {
            return Ok(None);
        };
        Ok(Some(PendingUpload {
            key,
            definition: upload_definition(complete_scene(scene, &attributes)?),
        }))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for OamPipeline<S, C> {
    type Scraped = OamScene;
    type Output = Vec<PendingUpload>;

    async fn extract(&self) -> Result<Vec<OamScene>> {
        let contact = self.context.settings.oam.contact()?;
        let events = scrape_events(&self.context, &self.config).await?;

        let pages: Vec<Result<Vec<OamScene>>> = stream::iter(events)
            .map(|event| {
                let contact = contact.clone();
                async move {
                    let html = self.context.http.get_text(&event.link).await?;
                    parse_oam_scenes(&html, &event.link, &event.name, &contact)
                }
            })
            .buffer_unordered(self.config.concurrent_requests().max(1))
            .collect()
            .await;

        let mut scenes = Vec::new();
        for page in pages {
            match page {
                Ok(found) => scenes.extend(found),
                Err(e) => tracing::warn!("⚠️ Skipping event page: {}", e),
            }
        }
        Ok(scenes)
    }

    async fn transform(&self, scenes: Vec<OamScene>) -> Result<Vec<PendingUpload>> {
        let results: Vec<Result<Option<PendingUpload>>> = stream::iter(scenes)
            .map(|scene| self.complete(scene))
            .buffer_unordered(self.config.concurrent_requests().max(1))
            .collect()
            .await;

        let mut uploads = Vec::new();
        for result in results {
            match result {
                Ok(Some(upload)) => uploads.push(upload),
                Ok(None) => {}
                Err(e) => tracing::warn!("⚠️ Skipping scene: {}", e),
            }
        }
        uploads.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(uploads)
    }

    async fn load(&self, uploads: Vec<PendingUpload>) -> Result<String> {
        for upload in &uploads {
            tracing::info!("Uploading OAM upload definition to {}", self.storage.location(&upload.key));
            let data = serde_json::to_vec(&upload.definition)?;
            self.storage.write_file(&upload.key, &data).await?;
        }
        Ok(format!(
            "{} upload definitions below {}",
            uploads.len(),
            self.storage.location(&self.context.settings.oam.key_prefix)
        ))
    }
}
