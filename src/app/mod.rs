pub mod context;
pub mod pipelines;

pub use context::ScrapeContext;
