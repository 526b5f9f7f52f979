pub mod dg_open_data_pipeline;
pub mod dg_summary_pipeline;
pub mod noaa_coast_pipeline;
pub mod noaa_storm_pipeline;
pub mod oam_pipeline;

pub use dg_open_data_pipeline::DgOpenDataPipeline;
pub use dg_summary_pipeline::{DgSummaryPipeline, SummaryFormat};
pub use noaa_coast_pipeline::NoaaCoastPipeline;
pub use noaa_storm_pipeline::{NoaaStormPipeline, StormScrape};
pub use oam_pipeline::OamPipeline;
