//! NOAA NGS Emergency Response Imagery.

pub mod archive;
pub mod bands;
pub mod fgdc;
pub mod spider;

pub use archive::{Archive, ArchiveItem, ArchiveKind};
pub use fgdc::parse_fgdc_html;
pub use spider::{
    event_name_from_url, parse_event_links, parse_event_page, parse_image_index,
    parse_image_page, parse_map_areas, EventPage,
};
