//! One scraper per website. HTML is parsed synchronously into owned records;
//! the pipelines do the fetching.

pub mod dg_open_data;
pub mod noaa_coast;
pub mod noaa_storm;

use crate::utils::error::{DisasterDataError, Result};
use scraper::{ElementRef, Selector};
use url::Url;

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DisasterDataError::ProcessingError {
        message: format!("invalid selector '{}': {}", css, e),
    })
}

pub(crate) fn parse_base(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| DisasterDataError::scrape(url, e.to_string()))
}

/// Resolves `href` against the page it was found on.
pub(crate) fn resolve(base: &Url, href: &str) -> String {
    base.join(href.trim())
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.trim().to_string())
}

/// Concatenated, trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// File name without directory or extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("https://host/a/b/3020133.tif"), "3020133");
        assert_eq!(file_stem("/tmp/x/20170827_RGB/20170827_A1.jpg"), "20170827_A1");
        assert_eq!(file_stem("README"), "README");
    }

    #[test]
    fn test_resolve() {
        let base = Url::parse("https://storms.ngs.noaa.gov/storms/florence/index.html").unwrap();
        assert_eq!(
            resolve(&base, "download/20180916a_RGB.tar"),
            "https://storms.ngs.noaa.gov/storms/florence/download/20180916a_RGB.tar"
        );
        assert_eq!(resolve(&base, "https://ngs.noaa.gov/x.tar"), "https://ngs.noaa.gov/x.tar");
    }
}
