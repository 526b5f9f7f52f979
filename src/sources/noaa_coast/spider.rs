use crate::domain::model::{Asset, Collection};
use crate::sources::{parse_base, resolve, selector, text_of};
use crate::utils::error::{DisasterDataError, Result};
use scraper::{ElementRef, Html};

/// Builds one collection per row of the imagery table (the second
/// `.sortable` table of the index page). Only `ids` are kept when non-empty.
pub fn parse_imagery_table(html: &str, page_url: &str, ids: &[String]) -> Result<Vec<Collection>> {
    let base = parse_base(page_url)?;
    let document = Html::parse_document(html);

    let table = document
        .select(&selector("table.sortable")?)
        .nth(1)
        .ok_or_else(|| DisasterDataError::scrape(page_url, "imagery table not found"))?;

    let heads: Vec<String> = table
        .select(&selector("thead tr th")?)
        .map(text_of)
        .collect();

    let row_selector = selector("tbody tr")?;
    let cell_selector = selector("td")?;
    let link_selector = selector("a[href]")?;

    let mut collections = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        let Some(id) = cells
            .last()
            .and_then(|cell| cell.text().map(str::trim).find(|t| !t.is_empty()))
        else {
            continue;
        };
        if !ids.is_empty() && !ids.iter().any(|wanted| wanted == id) {
            continue;
        }

        let mut collection = Collection::new(id);
        for (head, cell) in heads.iter().zip(cells.iter()) {
            let links: Vec<String> = cell
                .select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| resolve(&base, href))
                .collect();

            let mut add = |name: &str, index: usize, media_type: &str| match links.get(index) {
                Some(href) => {
                    collection
                        .assets
                        .insert(name.to_string(), Asset::new(href.clone()).with_type(media_type));
                }
                None => tracing::warn!("Collection {} has no {} link", id, name),
            };

            match head.as_str() {
                "Dataset Name" => {
                    add("metadata_xml", 0, "xml");
                    add("metadata_html", 1, "html");
                }
                "https" => add("assets_http", 0, "html"),
                "ftp" => add("assets_ftp", 0, "ftp"),
                "DAV" => add("asset_viewer", 0, "html"),
                "Tile Index" => add("tile_index", 0, "shp"),
                _ => {}
            }
        }
        collections.push(collection);
    }

    tracing::debug!("Parsed {} imagery projects from {}", collections.len(), page_url);
    Ok(collections)
}

/// GDAL path of the shapefile inside a zipped tile index.
pub fn tile_index_path(tile_index_href: &str) -> String {
    format!("/vsizip//vsicurl/{}/0tileindex.shp", tile_index_href)
}

pub fn url_list_url(assets_http: &str, id: &str) -> String {
    format!("{}/urllist{}.txt", assets_http.trim_end_matches('/'), id)
}

/// GeoTIFF lines of a project's url list, readable through `/vsicurl/`.
pub fn parse_url_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| line.ends_with(".tif"))
        .map(|line| format!("/vsicurl/{}", line))
        .collect()
}
