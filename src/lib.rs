pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod sources;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

#[cfg(feature = "aws")]
pub use config::aws::{S3Storage, SqsQueue};

pub use app::pipelines::{
    DgOpenDataPipeline, DgSummaryPipeline, NoaaCoastPipeline, NoaaStormPipeline, OamPipeline,
};
pub use app::ScrapeContext;
pub use config::settings::Settings;
pub use core::{catalog::DisasterDataCatalog, etl::EtlEngine, queue::FileQueue};
pub use utils::error::{DisasterDataError, Result};
