use crate::domain::model::{Asset, Collection, Contact, DgEvent, Item, OamScene, Provider};
use crate::sources::{file_stem, parse_base, resolve, selector, text_of};
use crate::utils::error::Result;
use scraper::{ElementRef, Html};

pub const LICENSE: &str = "CC BY-NC 4.0";
pub const OAM_PROVIDER: &str = "Digital Globe Open Data Program";
pub const OAM_PLATFORM: &str = "Satellite";

const IMAGERY_TABLES: [&str; 2] = ["#table--pre-event", "#table--post-event"];

fn last_segment(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

/// Parent directory name of a linked file.
pub fn parent_segment(url: &str) -> Option<&str> {
    url.rsplit('/').nth(1).filter(|s| !s.is_empty())
}

pub fn event_name_from_url(url: &str) -> String {
    last_segment(url).to_string()
}

/// Events listed on the open data landing page, optionally restricted to `ids`.
pub fn parse_event_list(html: &str, page_url: &str, ids: &[String]) -> Result<Vec<DgEvent>> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);
    let link_selector = selector("div a[href]")?;
    let date_selector = selector("p")?;

    let mut events = Vec::new();
    for event in document.select(&selector(".event-list__event")?) {
        let Some(href) = event
            .select(&link_selector)
            .filter_map(|a| a.value().attr("href"))
            .next()
        else {
            continue;
        };
        let link = resolve(&base, href);
        let name = event_name_from_url(&link);
        if !ids.is_empty() && !ids.contains(&name) {
            continue;
        }

        events.push(DgEvent {
            name,
            link,
            date_available: event
                .select(&date_selector)
                .map(text_of)
                .find(|text| !text.is_empty()),
        });
    }
    Ok(events)
}

pub fn collection_for_event(event: &DgEvent) -> Collection {
    let mut collection = Collection::new(event.name.clone());
    collection.title = Some(event.name.clone());
    collection.description = format!("Satellite imagery for {}", event.name);
    collection.license = Some(LICENSE.to_string());
    collection.providers = vec![Provider {
        name: "Digital Globe".to_string(),
        roles: vec!["producer".to_string(), "processor".to_string(), "host".to_string()],
        url: Some("http://www.digitalglobe.com/ecosystem/open-data".to_string()),
    }];
    collection.assets.insert(
        "assets_http".to_string(),
        Asset::new(event.link.clone()).with_type("html"),
    );
    collection
}

struct ImageryRow {
    date: Option<String>,
    parent_id: Option<String>,
    tifs: Vec<String>,
}

fn imagery_rows(document: &Html, page_url: &str) -> Result<Vec<ImageryRow>> {
    let base = parse_base(page_url)?;
    let row_selector = selector("tbody tr")?;
    let date_selector = selector("td > p")?;
    let parent_selector = selector("td > ul > p")?;
    let link_selector = selector("td a[href]")?;

    let first_text = |row: ElementRef, sel: &scraper::Selector| {
        row.select(sel).map(text_of).find(|text| !text.is_empty())
    };

    let mut rows = Vec::new();
    for table_id in IMAGERY_TABLES {
        for table in document.select(&selector(table_id)?) {
            for row in table.select(&row_selector) {
                rows.push(ImageryRow {
                    date: first_text(row, &date_selector),
                    parent_id: first_text(row, &parent_selector),
                    tifs: row
                        .select(&link_selector)
                        .filter_map(|a| a.value().attr("href"))
                        .filter(|href| href.ends_with(".tif"))
                        .map(|href| resolve(&base, href))
                        .collect(),
                });
            }
        }
    }
    Ok(rows)
}

/// One item per linked GeoTIFF in the pre- and post-event tables.
pub fn parse_imagery_items(html: &str, page_url: &str, event_name: &str) -> Result<Vec<Item>> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();
    for row in imagery_rows(&document, page_url)? {
        for tif in row.tifs {
            let mut item = Item::new(file_stem(&tif));
            item.properties.datetime = row.date.clone();
            item.set_collection(event_name);
            item.assets.insert("data".to_string(), Asset::new(tif));
            items.push(item);
        }
    }
    Ok(items)
}

/// One scene per catalog image: the GeoTIFFs of a row that sit in the
/// directory named after the row's image id.
pub fn parse_oam_scenes(html: &str, page_url: &str, event_name: &str, contact: &Contact) -> Result<Vec<OamScene>> {
    let document = Html::parse_document(html);
    let mut scenes = Vec::new();
    for row in imagery_rows(&document, page_url)? {
        let Some(parent_id) = row.parent_id else {
            continue;
        };
        let urls: Vec<String> = row
            .tifs
            .into_iter()
            .filter(|tif| parent_segment(tif) == Some(parent_id.as_str()))
            .collect();
        if urls.is_empty() {
            tracing::debug!("No imagery for {} in {}", parent_id, event_name);
            continue;
        }

        scenes.push(OamScene {
            title: format!("{}_{}", event_name, parent_id),
            contact: contact.clone(),
            provider: OAM_PROVIDER.to_string(),
            platform: OAM_PLATFORM.to_string(),
            license: LICENSE.to_string(),
            urls,
            acquisition_start: None,
            acquisition_end: None,
            sensor: None,
        });
    }
    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"<html><body>
<div class="event-list">
  <div class="event-list__event">
    <div><a href="/ecosystem/open-data/hurricane-harvey">Hurricane Harvey</a></div>
    <p>Data available: Aug 31, 2017</p>
  </div>
  <div class="event-list__event">
    <div><a href="https://www.digitalglobe.com/ecosystem/open-data/california-wildfires/">Wildfires</a></div>
  </div>
</div></body></html>"#;

    const EVENT: &str = r#"<html><body>
<table id="table--pre-event"><tbody>
  <tr>
    <td><p>2017-08-14</p></td>
    <td><ul><p>1040010031B6F900</p></ul></td>
    <td><a href="https://opendata.digitalglobe.com/harvey/pre-event/2017-08-14/1040010031B6F900/3020133.tif">3020133.tif</a>
        <a href="https://opendata.digitalglobe.com/harvey/pre-event/2017-08-14/1040010031B6F900/3020133.tif.ovr">ovr</a></td>
  </tr>
</tbody></table>
<table id="table--post-event"><tbody>
  <tr>
    <td><p>2017-08-31</p></td>
    <td><ul><p>105001000B95E100</p></ul></td>
    <td><a href="https://opendata.digitalglobe.com/harvey/post-event/2017-08-31/105001000B95E100/3020133.tif">a</a>
        <a href="https://opendata.digitalglobe.com/harvey/post-event/2017-08-31/105001000B95E100/3020134.tif">b</a>
        <a href="https://opendata.digitalglobe.com/harvey/post-event/2017-08-31/OTHER/3020135.tif">c</a></td>
  </tr>
</tbody></table>
</body></html>"#;

    const EVENT_URL: &str = "https://www.digitalglobe.com/ecosystem/open-data/hurricane-harvey";

    #[test]
    fn test_event_list() {
        let events = parse_event_list(LANDING, "https://www.digitalglobe.com/ecosystem/open-data", &[]).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "hurricane-harvey");
        assert_eq!(events[0].link, EVENT_URL);
        assert_eq!(events[0].date_available.as_deref(), Some("Data available: Aug 31, 2017"));
        assert_eq!(events[1].name, "california-wildfires");
        assert_eq!(events[1].date_available, None);

        let filtered = parse_event_list(
            LANDING,
            "https://www.digitalglobe.com/ecosystem/open-data",
            &["california-wildfires".to_string()],
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_collection_for_event() {
        let event = DgEvent {
            name: "hurricane-harvey".to_string(),
            link: EVENT_URL.to_string(),
            date_available: None,
        };
        let collection = collection_for_event(&event);
        assert_eq!(collection.description, "Satellite imagery for hurricane-harvey");
        assert_eq!(collection.license.as_deref(), Some(LICENSE));
        assert_eq!(collection.providers[0].roles.len(), 3);
        assert_eq!(collection.assets["assets_http"].href, EVENT_URL);
        assert_eq!(collection.extent.spatial, None);
    }

    #[test]
    fn test_imagery_items() {
        let items = parse_imagery_items(EVENT, EVENT_URL, "hurricane-harvey").unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].id, "3020133");
        assert_eq!(items[0].properties.datetime.as_deref(), Some("2017-08-14"));
        assert_eq!(items[0].collection.as_deref(), Some("hurricane-harvey"));
        assert_eq!(items[0].properties.collection.as_deref(), Some("hurricane-harvey"));
        assert_eq!(items[3].properties.datetime.as_deref(), Some("2017-08-31"));
    }

    #[test]
    fn test_dateless_row_keeps_image_id_out_of_datetime() {
        let html = r#"<table id="table--post-event"><tbody><tr>
  <td><p></p></td>
  <td><ul><p>105001000B95E100</p></ul></td>
  <td><a href="https://opendata.digitalglobe.com/harvey/post-event/2017-08-31/105001000B95E100/3020133.tif">a</a></td>
</tr></tbody></table>"#;
        let items = parse_imagery_items(html, EVENT_URL, "hurricane-harvey").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].properties.datetime, None);

        let contact = Contact {
            name: "Disaster Data".to_string(),
            email: "data@example.com".to_string(),
        };
        let scenes = parse_oam_scenes(html, EVENT_URL, "hurricane-harvey", &contact).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].title, "hurricane-harvey_105001000B95E100");
    }

    #[test]
    fn test_oam_scenes_group_by_parent_directory() {
        let contact = Contact {
            name: "Disaster Data".to_string(),
            email: "data@example.com".to_string(),
        };
        let scenes = parse_oam_scenes(EVENT, EVENT_URL, "hurricane-harvey", &contact).unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].title, "hurricane-harvey_1040010031B6F900");
        assert_eq!(scenes[0].urls.len(), 1);
        assert_eq!(scenes[1].title, "hurricane-harvey_105001000B95E100");
        assert_eq!(scenes[1].urls.len(), 2);
        assert_eq!(scenes[1].platform, OAM_PLATFORM);
        assert_eq!(scenes[1].provider, OAM_PROVIDER);
    }
}
