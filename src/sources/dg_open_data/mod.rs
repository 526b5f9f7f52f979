//! DigitalGlobe Open Data Program.

pub mod api;
pub mod bands;
pub mod oam;
pub mod spider;
pub mod thumbnails;

pub use api::{DigitalGlobeApi, ImageAttributes};
pub use oam::OamUploader;
pub use spider::{
    collection_for_event, parse_event_list, parse_imagery_items, parse_oam_scenes, parent_segment,
};
