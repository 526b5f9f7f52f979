use crate::app::context::ScrapeContext;
use crate::core::geometry::dissolve;
use crate::domain::model::{CoastIndex, Collection, CollectionItems};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::sources::noaa_coast::{
    parse_imagery_table, parse_project_metadata, parse_url_list, tile_index_path, url_list_url,
};
use crate::utils::error::Result;
use futures::stream::{self, StreamExt};
use serde_json::Value;

/// Indexes NOAA Coast imagery projects as STAC collections.
pub struct NoaaCoastPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) context: ScrapeContext,
    pub(crate) outfile: String,
}

impl<S: Storage, C: ConfigProvider> NoaaCoastPipeline<S, C> {
    pub fn new(storage: S, config: C, context: ScrapeContext, outfile: impl Into<String>) -> Self {
        Self {
            storage,
            config,
            context,
            outfile: outfile.into(),
        }
    }

    async fn add_footprint(&self, collection: &mut Collection) -> Result<()> {
        let Some(tile_index) = collection.assets.get("tile_index") else {
            return Ok(());
        };
        let path = tile_index_path(&tile_index.href);
        let polygons = self.context.inspector.vector_geometries(&path).await?;
        match dissolve(&polygons) {
            Some(footprint) => {
                tracing::debug!("{}: {} tile footprint", collection.id, footprint.kind());
                collection.extent.spatial = Some(footprint.bbox);
            }
            None => tracing::warn!("Tile index of {} has no polygons", collection.id),
        }
        Ok(())
    }

    async fn add_metadata(&self, collection: &mut Collection) -> Result<()> {
        let Some(xml) = collection.assets.get("metadata_xml") else {
            return Ok(());
        };
        let body = self.context.http.get_text(&xml.href).await?;
        let metadata = parse_project_metadata(&body)?;

        collection.title = metadata.title;
        collection.description = metadata.description.unwrap_or_default();
        collection
            .extra
            .insert("processing".to_string(), Value::from(metadata.processing));
        collection.extent.temporal = Some([metadata.start_date, metadata.end_date]);
        Ok(())
    }

    async fn enrich(&self, mut collection: Collection) -> Collection {
        if let Err(e) = self.add_footprint(&mut collection).await {
            tracing::warn!("⚠️ No footprint for {}: {}", collection.id, e);
        }
        if let Err(e) = self.add_metadata(&mut collection).await {
            tracing::warn!("⚠️ No metadata for {}: {}", collection.id, e);
        }
        collection
    }

    async fn collection_items(&self, collection: &Collection) -> Result<Option<CollectionItems>> {
        let Some(http_root) = collection.assets.get("assets_http") else {
            return Ok(None);
        };
        let body = self
            .context
            .http
            .get_text(&url_list_url(&http_root.href, &collection.id))
            .await?;
        Ok(Some(CollectionItems {
            collection: collection.id.clone(),
            urls: parse_url_list(&body),
        }))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for NoaaCoastPipeline<S, C> {
    type Scraped = Collection;
    type Output = CoastIndex;

    async fn extract(&self) -> Result<Vec<Collection>> {
        let url = &self.context.settings.sources.noaa_coast;
        tracing::debug!("Fetching imagery index: {}", url);
        let html = self.context.http.get_text(url).await?;
        parse_imagery_table(&html, url, self.config.ids())
    }

    async fn transform(&self, scraped: Vec<Collection>) -> Result<CoastIndex> {
        let concurrency = self.config.concurrent_requests().max(1);

        // keep the table order
        let collections: Vec<Collection> = stream::iter(scraped)
            .map(|collection| self.enrich(collection))
            .buffered(concurrency)
            .collect()
            .await;

        let items = if self.config.include_items() {
            let mut items = Vec::new();
            for collection in &collections {
                match self.collection_items(collection).await {
                    Ok(Some(found)) => items.push(found),
                    Ok(None) => tracing::warn!("Collection {} has no https listing", collection.id),
                    Err(e) => tracing::warn!("⚠️ No url list for {}: {}", collection.id, e),
                }
            }
            Some(items)
        } else {
            None
        };

        Ok(CoastIndex { collections, items })
    }

    async fn load(&self, output: CoastIndex) -> Result<String> {
        let data = serde_json::to_vec_pretty(&output)?;
        self.storage.write_file(&self.outfile, &data).await?;
        tracing::info!(
            "Indexed {} NOAA Coast collections",
            output.collections.len()
        );
        Ok(self.storage.location(&self.outfile))
    }
}
