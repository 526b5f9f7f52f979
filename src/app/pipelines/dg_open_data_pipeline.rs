use crate::app::context::ScrapeContext;
use crate::core::catalog::DisasterDataCatalog;
use crate::core::gdal::partial_item;
use crate::domain::model::{DataSource, DgCatalogScrape, DgEvent, Item};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::sources::dg_open_data::api::ImageAttributes;
use crate::sources::dg_open_data::bands;
use crate::sources::dg_open_data::{
    collection_for_event, parent_segment, parse_event_list, parse_imagery_items, DigitalGlobeApi,
};
use crate::utils::error::{DisasterDataError, Result};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Landing page events, shared by the DigitalGlobe pipelines.
pub(crate) async fn scrape_events<C: ConfigProvider>(context: &ScrapeContext, config: &C) -> Result<Vec<DgEvent>> {
    let url = &context.settings.sources.dg_open_data;
    let html = context.http.get_text(url).await?;
    let events = parse_event_list(&html, url, config.ids())?;
    tracing::info!("Found {} DigitalGlobe events", events.len());
    Ok(events)
}

/// Scrapes DigitalGlobe events into `DGOpenData` collections and items.
pub struct DgOpenDataPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) catalog: DisasterDataCatalog<S>,
    pub(crate) config: C,
    pub(crate) context: ScrapeContext,
    api: Option<DigitalGlobeApi>,
    attributes: Mutex<HashMap<String, Arc<OnceCell<Option<ImageAttributes>>>>>,
}

impl<S: Storage, C: ConfigProvider> DgOpenDataPipeline<S, C> {
    pub fn new(storage: S, config: C, context: ScrapeContext) -> Self {
        let api = context.dg_api();
        if api.is_none() {
            tracing::warn!("No DigitalGlobe API key configured; items get no platform or bands");
        }
        Self {
            catalog: DisasterDataCatalog::new(storage),
            config,
            context,
            api,
            attributes: Mutex::new(HashMap::new()),
        }
    }

    async fn event_items(&self, event: &DgEvent) -> Result<Vec<Item>> {
        let html = self.context.http.get_text(&event.link).await?;
        parse_imagery_items(&html, &event.link, &event.name)
    }

    /// One query per catalog image, however many tiles it has.
    async fn image_attributes(&self, api: &DigitalGlobeApi, image_id: &str) -> Result<Option<ImageAttributes>> {
        let cell = self
            .attributes
            .lock()
            .await
            .entry(image_id.to_string())
            .or_default()
            .clone();
        cell.get_or_try_init(|| api.image_attributes(image_id))
            .await
            .cloned()
    }

    async fn enrich(&self, mut item: Item) -> Item {
        let Some(href) = item.assets.get("data").map(|asset| asset.href.clone()) else {
            return item;
        };

        match self
            .context
            .inspector
            .info(&format!("/vsicurl/{}", href))
            .await
        {
            Ok(info) => {
                let partial = partial_item(&item.id, &info);
                item.bbox = partial.bbox;
                item.geometry = partial.geometry;
                item.properties.epsg = partial.properties.epsg;
                item.properties.gsd = partial.properties.gsd;
            }
            Err(e) => tracing::warn!("⚠️ gdalinfo failed for {}: {}", href, e),
        }

        if let (Some(api), Some(image_id)) = (&self.api, parent_segment(&href)) {
            match self.image_attributes(api, image_id).await {
                Ok(Some(attributes)) => {
                    item.properties.bands = bands::for_vehicle(&attributes.vehicle_name);
                    item.properties.platform = Some(attributes.vehicle_name);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("⚠️ Image lookup failed for {}: {}", image_id, e),
            }
        }
        item
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DgOpenDataPipeline<S, C> {
    type Scraped = DgEvent;
    type Output = DgCatalogScrape;

    async fn extract(&self) -> Result<Vec<DgEvent>> {
        scrape_events(&self.context, &self.config).await
    }

    async fn transform(&self, events: Vec<DgEvent>) -> Result<DgCatalogScrape> {
        let collections = events.iter().map(collection_for_event).collect();
        if !self.config.include_items() {
            return Ok(DgCatalogScrape {
                collections,
                items: Vec::new(),
            });
        }

        let concurrency = self.config.concurrent_requests().max(1);
        let pages: Vec<Result<Vec<Item>>> = stream::iter(events.iter().cloned())
            .map(|event| async move { self.event_items(&event).await })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut scraped = Vec::new();
        for page in pages {
            match page {
                Ok(items) => scraped.extend(items),
                Err(e) => tracing::warn!("⚠️ Skipping event page: {}", e),
            }
        }
        tracing::info!("Enriching {} items", scraped.len());

        let mut items: Vec<Item> = stream::iter(scraped)
            .map(|item| self.enrich(item))
            .buffer_unordered(concurrency)
            .collect()
            .await;
        items.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(DgCatalogScrape { collections, items })
    }

    async fn load(&self, output: DgCatalogScrape) -> Result<String> {
        let mut by_collection: BTreeMap<String, Vec<Item>> = BTreeMap::new();
        for item in output.items {
            let collection = item.collection.clone().ok_or_else(|| DisasterDataError::catalog(
                format!("item {} has no collection", item.id),
            ))?;
            by_collection.entry(collection).or_default().push(item);
        }

        for collection in &output.collections {
            let path = self
                .catalog
                .add_event_collection(DataSource::DgOpenData, collection)
                .await?;
            if let Some(items) = by_collection.get(&collection.id) {
                self.catalog.add_items(&path, items).await?;
                self.catalog.backfill_extent(&path, items).await?;
            }
            tracing::info!("✅ Cataloged {}", collection.id);
        }

        let source = DisasterDataCatalog::<S>::source_path(DataSource::DgOpenData);
        Ok(self.catalog.storage().location(&source))
    }
}
