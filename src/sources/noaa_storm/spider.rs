use crate::domain::model::StormRecord;
use crate::sources::{parse_base, resolve, selector, text_of};
use crate::utils::error::{DisasterDataError, Result};
use scraper::Html;

/// What an event page links to.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPage {
    /// Responsive viewer: one record per `_RGB.tar` download.
    Modern(Vec<StormRecord>),
    /// Older viewer: records sit behind an image map index.
    Legacy { index_url: String },
}

pub fn parse_event_links(html: &str, page_url: &str) -> Result<Vec<String>> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector("div.layout_col1 > h2 > a")?)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| resolve(&base, href))
        .collect())
}

fn segment_from_end(url: &str, n: usize) -> &str {
    url.rsplit('/').nth(n).unwrap_or_default()
}

fn after_last_underscore(name: &str) -> &str {
    name.rsplit('_').next().unwrap_or(name)
}

/// Event name from an event page URL (its parent directory).
pub fn event_name_from_url(url: &str) -> String {
    let name = segment_from_end(url, 1);
    if url.contains("geodesy.noaa.gov") {
        after_last_underscore(name).to_string()
    } else {
        name.to_string()
    }
}

fn archive_prefix(download_link: &str) -> &str {
    let name = download_link.rsplit('/').next().unwrap_or(download_link);
    name.split('_').next().unwrap_or(name)
}

/// Shapefile index inside a remote tar of tiles.
pub fn tile_index_path(download_link: &str) -> String {
    format!(
        "/vsitar//vsicurl/{}/{}_tile_index.shp",
        download_link,
        archive_prefix(download_link)
    )
}

pub fn parse_event_page(html: &str, page_url: &str) -> Result<EventPage> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);
    let event_name = event_name_from_url(page_url);

    let is_modern = document
        .select(&selector("head meta[name=viewport]")?)
        .next()
        .is_some();

    if is_modern {
        let metadata_url = document
            .select(&selector("div#metadata ul li a")?)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| resolve(&base, href))
            .next();

        let records = document
            .select(&selector("ul.dropdown-menu li a")?)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.ends_with("_RGB.tar"))
            .map(|href| {
                let download_link = resolve(&base, href);
                StormRecord::Modern {
                    event_name: event_name.clone(),
                    tile_index: tile_index_path(&download_link),
                    download_link,
                    metadata_url: metadata_url.clone(),
                }
            })
            .collect();
        return Ok(EventPage::Modern(records));
    }

    let index = document
        .select(&selector("td.normaltext a")?)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.to_lowercase().contains(&event_name) && !href.contains("https"))
        .ok_or_else(|| DisasterDataError::scrape(page_url, "no map index link on legacy event page"))?;

    Ok(EventPage::Legacy {
        index_url: resolve(&base, index),
    })
}

/// Links of the `map > div > area` image map of a legacy index page.
pub fn parse_map_areas(html: &str, page_url: &str) -> Result<Vec<String>> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector("map > div > area")?)
        .filter_map(|area| area.value().attr("href"))
        .map(|href| resolve(&base, href))
        .collect())
}

/// Image pages of a legacy image index; bare JPEG links have no world file.
pub fn parse_image_index(html: &str, page_url: &str) -> Result<Vec<String>> {
    Ok(parse_map_areas(html, page_url)?
        .into_iter()
        .filter(|url| url.ends_with(".htm"))
        .collect())
}

/// Legacy image page; `None` unless it links a full size image and a world file.
pub fn parse_image_page(html: &str, page_url: &str) -> Result<Option<StormRecord>> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);

    let mut download_link = None;
    let mut world_file = None;
    let mut metadata_url = None;

    for a in document.select(&selector("a[href]")?) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        match text_of(a).as_str() {
            "Full Size Image" => download_link = Some(resolve(&base, href)),
            "World File" => world_file = Some(resolve(&base, href)),
            // these links carry one stray leading character
            "Metadata File" => metadata_url = Some(resolve(&base, href.get(1..).unwrap_or_default())),
            _ => {}
        }
    }

    let (Some(download_link), Some(world_file)) = (download_link, world_file) else {
        tracing::debug!("Skipping {}: no world file", page_url);
        return Ok(None);
    };

    Ok(Some(StormRecord::Old {
        event_name: after_last_underscore(segment_from_end(page_url, 2)).to_string(),
        download_link,
        world_file,
        metadata_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_links() {
        let html = r#"<div class="layout_col1 wide">
            <h2><a href="/storms/florence/index.html">Florence</a></h2>
            <h2><a href="https://geodesy.noaa.gov/storm_archive/storms/2005_katrina/index.html">Katrina</a></h2>
            <p><a href="/about.html">About</a></p>
        </div>"#;
        let links = parse_event_links(html, "https://storms.ngs.noaa.gov/").unwrap();
        assert_eq!(
            links,
            vec![
                "https://storms.ngs.noaa.gov/storms/florence/index.html",
                "https://geodesy.noaa.gov/storm_archive/storms/2005_katrina/index.html"
            ]
        );
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_name_from_url("https://storms.ngs.noaa.gov/storms/florence/index.html"), "florence");
        assert_eq!(
            event_name_from_url("https://geodesy.noaa.gov/storm_archive/storms/2005_katrina/index.html"),
            "katrina"
        );
        // only geodesy.noaa.gov names are trimmed
        assert_eq!(event_name_from_url("https://storms.ngs.noaa.gov/storms/2018_florence/index.html"), "2018_florence");
    }

    #[test]
    fn test_modern_event_page() {
        let html = r#"<html><head><meta name="viewport" content="width=device-width"></head><body>
<ul class="dropdown-menu">
  <li><a href="https://ngs.noaa.gov/storms/florence/download/20180916a_RGB.tar">Sep 16 a</a></li>
  <li><a href="https://ngs.noaa.gov/storms/florence/download/20180916a_Oblique.tar">Oblique</a></li>
  <li><a href="download/20180917b_RGB.tar">Sep 17 b</a></li>
</ul>
<div id="metadata"><ul><li><a href="metadata/florence.html">FGDC</a></li></ul></div>
</body></html>"#;
        let page = parse_event_page(html, "https://storms.ngs.noaa.gov/storms/florence/index.html").unwrap();
        let EventPage::Modern(records) = page else {
            panic!("expected a modern page");
        };

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            StormRecord::Modern {
                event_name: "florence".to_string(),
                download_link: "https://ngs.noaa.gov/storms/florence/download/20180916a_RGB.tar".to_string(),
                tile_index: "/vsitar//vsicurl/https://ngs.noaa.gov/storms/florence/download/20180916a_RGB.tar/20180916a_tile_index.shp".to_string(),
                metadata_url: Some("https://storms.ngs.noaa.gov/storms/florence/metadata/florence.html".to_string()),
            }
        );
        assert_eq!(
            records[1].download_link(),
            "https://storms.ngs.noaa.gov/storms/florence/download/20180917b_RGB.tar"
        );
    }

    #[test]
    fn test_legacy_event_page() {
        let html = r#"<html><head><title>Ike</title></head><body><table><tr>
<td class="normaltext"><a href="https://www.noaa.gov/ike">NOAA</a></td>
<td class="normaltext"><a href="IKE0000.htm">Ike Imagery</a></td>
</tr></table></body></html>"#;
        let page = parse_event_page(html, "https://geodesy.noaa.gov/storm_archive/storms/2008_ike/index.html").unwrap();
        assert_eq!(
            page,
            EventPage::Legacy {
                index_url: "https://geodesy.noaa.gov/storm_archive/storms/2008_ike/IKE0000.htm".to_string()
            }
        );

        let without_index = r#"<html><head></head><body></body></html>"#;
        assert!(parse_event_page(without_index, "https://geodesy.noaa.gov/storms/2008_ike/index.html").is_err());
    }

    #[test]
    fn test_image_index_keeps_pages() {
        let html = r#"<map name="m"><div>
            <area href="images/ike0001.htm">
            <area href="images/ike0002.jpg">
        </div></map>"#;
        let pages = parse_image_index(html, "https://geodesy.noaa.gov/storms/2008_ike/IKE0001.htm").unwrap();
        assert_eq!(pages, vec!["https://geodesy.noaa.gov/storms/2008_ike/images/ike0001.htm"]);
    }

    #[test]
    fn test_image_page() {
        let url = "https://geodesy.noaa.gov/storm_archive/storms/2008_ike/images/ike0001.htm";
        let html = r#"<table><tr>
<td><a href="08091401.jpg">Full Size Image</a><a href="08091401.jgw">World File</a><a href="/metadata/ike.htm">Metadata File</a></td>
<td></td><td></td></tr></table>"#;
        let record = parse_image_page(html, url).unwrap().unwrap();
        assert_eq!(
            record,
            StormRecord::Old {
                event_name: "ike".to_string(),
                download_link: "https://geodesy.noaa.gov/storm_archive/storms/2008_ike/images/08091401.jpg".to_string(),
                world_file: "https://geodesy.noaa.gov/storm_archive/storms/2008_ike/images/08091401.jgw".to_string(),
                metadata_url: Some("https://geodesy.noaa.gov/storm_archive/storms/2008_ike/images/metadata/ike.htm".to_string()),
            }
        );

        let no_world_file = r#"<a href="08091402.jpg">Full Size Image</a>"#;
        assert_eq!(parse_image_page(no_world_file, url).unwrap(), None);
    }
}
