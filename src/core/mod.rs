pub mod catalog;
pub mod etl;
pub mod gdal;
pub mod geometry;
pub mod http;
pub mod queue;

pub use crate::domain::ports::{ConfigProvider, MessageQueue, Pipeline, RasterInspector, Storage};
pub use crate::utils::error::Result;
