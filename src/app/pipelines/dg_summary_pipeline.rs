use crate::app::context::ScrapeContext;
use crate::app::pipelines::dg_open_data_pipeline::scrape_events;
use crate::domain::model::DgEvent;
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::sources::dg_open_data::parse_imagery_items;
use crate::utils::error::{DisasterDataError, Result};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Json,
    Csv,
}

impl SummaryFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SummaryFormat::Json => "json",
            SummaryFormat::Csv => "csv",
        }
    }
}

impl FromStr for SummaryFormat {
    type Err = DisasterDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SummaryFormat::Json),
            "csv" => Ok(SummaryFormat::Csv),
            other => Err(DisasterDataError::InvalidConfigValueError {
                field: "format".to_string(),
                value: other.to_string(),
                reason: "expected json or csv".to_string(),
            }),
        }
    }
}

/// Number of items per DigitalGlobe event.
pub struct DgSummaryPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) context: ScrapeContext,
    format: SummaryFormat,
}

impl<S: Storage, C: ConfigProvider> DgSummaryPipeline<S, C> {
    pub fn new(storage: S, config: C, context: ScrapeContext, format: SummaryFormat) -> Self {
        Self {
            storage,
            config,
            context,
            format,
        }
    }

    fn render(&self, summary: &BTreeMap<String, usize>) -> Result<Vec<u8>> {
        match self.format {
            SummaryFormat::Json => Ok(serde_json::to_vec_pretty(summary)?),
            SummaryFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.write_record(["event", "items"])?;
                for (event, count) in summary {
                    let count = count.to_string();
                    writer.write_record([event.as_str(), count.as_str()])?;
                }
                writer
                    .into_inner()
                    .map_err(|e| DisasterDataError::ProcessingError {
                        message: format!("CSV writer error: {}", e),
                    })
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DgSummaryPipeline<S, C> {
    type Scraped = DgEvent;
    type Output = BTreeMap<String, usize>;

    async fn extract(&self) -> Result<Vec<DgEvent>> {
        scrape_events(&self.context, &self.config).await
    }

    async fn transform(&self, events: Vec<DgEvent>) -> Result<BTreeMap<String, usize>> {
        let counts: Vec<(String, Result<usize>)> = stream::iter(events)
            .map(|event| async move {
                let count = match self.context.http.get_text(&event.link).await {
                    Ok(html) => parse_imagery_items(&html, &event.link, &event.name).map(|items| items.len()),
                    Err(e) => Err(e),
                };
                (event.name, count)
            })
            .buffer_unordered(self.config.concurrent_requests().max(1))
            .collect()
            .await;

        let mut summary = BTreeMap::new();
        for (event, count) in counts {
            match count {
                Ok(count) => {
                    summary.insert(event, count);
                }
                Err(e) => tracing::warn!("⚠️ Could not count {}: {}", event, e),
            }
        }
        Ok(summary)
    }

    async fn load(&self, summary: BTreeMap<String, usize>) -> Result<String> {
        let path = format!("dg-summary.{}", self.format.extension());
        self.storage.write_file(&path, &self.render(&summary)?).await?;
        tracing::info!(
            "{} events, {} items",
            summary.len(),
            summary.values().sum::<usize>()
        );
        Ok(self.storage.location(&path))
    }
}
