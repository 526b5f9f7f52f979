use crate::app::context::ScrapeContext;
use crate::core::catalog::DisasterDataCatalog;
use crate::domain::model::{Collection, DataSource, Item, StormRecord};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::sources::noaa_storm::{
    event_name_from_url, parse_event_links, parse_event_page, parse_fgdc_html, parse_image_index,
    parse_image_page, parse_map_areas, Archive, EventPage,
};
use crate::utils::error::Result;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Scraped records, plus the catalog entries built from them with `--items`.
#[derive(Debug, Clone, Default)]
pub struct StormScrape {
    pub records: Vec<StormRecord>,
    pub events: Vec<EventItems>,
}

#[derive(Debug, Clone)]
pub struct EventItems {
    pub collection: Collection,
    pub items: Vec<Item>,
}

pub struct NoaaStormPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) catalog: DisasterDataCatalog<S>,
    pub(crate) config: C,
    pub(crate) context: ScrapeContext,
    pub(crate) outfile: String,
    pub(crate) workdir: PathBuf,
}

impl<S: Storage, C: ConfigProvider> NoaaStormPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        context: ScrapeContext,
        outfile: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog: DisasterDataCatalog::new(storage),
            config,
            context,
            outfile: outfile.into(),
            workdir: workdir.into(),
        }
    }

    async fn scrape_event(&self, url: String) -> Result<Vec<StormRecord>> {
        let html = self.context.http.get_text(&url).await?;
        match parse_event_page(&html, &url)? {
            EventPage::Modern(records) => Ok(records),
            EventPage::Legacy { index_url } => self.scrape_legacy(&index_url).await,
        }
    }

    async fn scrape_legacy(&self, index_url: &str) -> Result<Vec<StormRecord>> {
        let http = &self.context.http;
        let index = http.get_text(index_url).await?;

        let mut records = Vec::new();
        for map_url in parse_map_areas(&index, index_url)? {
            let image_pages = match http.get_text(&map_url).await {
                Ok(html) => parse_image_index(&html, &map_url)?,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping image index {}: {}", map_url, e);
                    continue;
                }
            };
            for page_url in image_pages {
                match http.get_text(&page_url).await {
                    Ok(html) => records.extend(parse_image_page(&html, &page_url)?),
                    Err(e) => tracing::warn!("⚠️ Skipping image page {}: {}", page_url, e),
                }
            }
        }
        Ok(records)
    }

    /// Downloads a record into a scratch directory below the workdir, builds
    /// its items and uploads their thumbnails. The scratch directory,
    /// archive included, is removed when this returns.
    async fn build_record_items(&self, record: StormRecord) -> Result<Vec<Item>> {
        let settings = &self.context.settings;
        let event = record.event_name().to_string();

        tokio::fs::create_dir_all(&self.workdir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", event))
            .tempdir_in(&self.workdir)?;

        let archive = Archive::download(&self.context.http, record, scratch.path()).await?;
        let built = archive
            .build_items(
                self.context.inspector.as_ref(),
                &settings.storage,
                &scratch.path().join("thumbnails"),
                settings.gdal.thumbnail_percent,
            )
            .await?;

        let storage = self.catalog.storage();
        let mut items = Vec::with_capacity(built.len());
        for built in built {
            let jpeg = tokio::fs::read(&built.thumbnail).await?;
            storage.write_file(&built.thumbnail_key, &jpeg).await?;
            items.push(built.item);
        }

        scratch.close()?;
        Ok(items)
    }

    async fn event_collection(&self, event: &str, metadata_url: Option<&str>) -> Collection {
        let mut collection = Collection::new(event);
        collection.title = Some(event.to_string());
        collection.description = format!("Aerial imagery of {} collected by NOAA NGS", event);

        let Some(url) = metadata_url else {
            return collection;
        };
        let fgdc = match self.context.http.get_text(url).await {
            Ok(html) => parse_fgdc_html(&html),
            Err(e) => Err(e),
        };
        match fgdc {
            Ok(fgdc) => {
                if let Some(title) = fgdc.get("Title").and_then(|v| v.as_str()) {
                    collection.title = Some(title.to_string());
                }
                if let Some(description) = fgdc.get("Abstract").and_then(|v| v.as_str()) {
                    collection.description = description.to_string();
                }
            }
            Err(e) => tracing::warn!("⚠️ No FGDC metadata for {}: {}", event, e),
        }
        collection
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for NoaaStormPipeline<S, C> {
    type Scraped = StormRecord;
    type Output = StormScrape;

    async fn extract(&self) -> Result<Vec<StormRecord>> {
        let url = &self.context.settings.sources.noaa_storm;
        let html = self.context.http.get_text(url).await?;
        let events: Vec<String> = parse_event_links(&html, url)?
            .into_iter()
            .filter(|link| self.config.wants(&event_name_from_url(link)))
            .collect();
        tracing::info!("Found {} storm events", events.len());

        let results: Vec<Result<Vec<StormRecord>>> = stream::iter(events)
            .map(|link| self.scrape_event(link))
            .buffer_unordered(self.config.concurrent_requests().max(1))
            .collect()
            .await;

        let mut records = Vec::new();
        for result in results {
            match result {
                Ok(found) => records.extend(found),
                Err(e) => tracing::warn!("⚠️ Skipping event: {}", e),
            }
        }
        Ok(records)
    }

    async fn transform(&self, records: Vec<StormRecord>) -> Result<StormScrape> {
        if !self.config.include_items() {
            return Ok(StormScrape {
                records,
                events: Vec::new(),
            });
        }

        // legacy single-image records have no dated archive to build items from
        let archives: Vec<StormRecord> = records
            .iter()
            .filter(|record| matches!(record, StormRecord::Modern { .. }))
            .cloned()
            .collect();
        tracing::info!(
            "Building items from {} archives ({} legacy records kept as scraped)",
            archives.len(),
            records.len() - archives.len()
        );

        let results: Vec<(String, Option<String>, Result<Vec<Item>>)> = stream::iter(archives)
            .map(|record| async move {
                let event = record.event_name().to_string();
                let metadata = record.metadata_url().map(str::to_string);
                let link = record.download_link().to_string();
                let items = self.build_record_items(record).await;
                if let Err(e) = &items {
                    tracing::warn!("⚠️ Skipping archive {}: {}", link, e);
                }
                (event, metadata, items)
            })
            .buffer_unordered(self.config.concurrent_requests().max(1))
            .collect()
            .await;

        let mut by_event: BTreeMap<String, (Option<String>, Vec<Item>)> = BTreeMap::new();
        for (event, metadata, items) in results {
            let entry = by_event.entry(event).or_default();
            if entry.0.is_none() {
                entry.0 = metadata;
            }
            if let Ok(items) = items {
                entry.1.extend(items);
            }
        }

        let mut events = Vec::with_capacity(by_event.len());
        for (event, (metadata, mut items)) in by_event {
            if items.is_empty() {
                tracing::warn!("No items built for {}, leaving it out of the catalog", event);
                continue;
            }
            items.sort_by(|a, b| a.id.cmp(&b.id));
            events.push(EventItems {
                collection: self.event_collection(&event, metadata.as_deref()).await,
                items,
            });
        }

        Ok(StormScrape { records, events })
    }

    async fn load(&self, output: StormScrape) -> Result<String> {
        let storage = self.catalog.storage();
        let data = serde_json::to_vec_pretty(&output.records)?;
        storage.write_file(&self.outfile, &data).await?;

        for event in &output.events {
            let path = self
                .catalog
                .add_event_collection(DataSource::NoaaStorm, &event.collection)
                .await?;
            self.catalog.add_items(&path, &event.items).await?;
            self.catalog.backfill_extent(&path, &event.items).await?;
            tracing::info!("✅ Cataloged {} items for {}", event.items.len(), event.collection.id);
        }

        Ok(storage.location(&self.outfile))
    }
}
