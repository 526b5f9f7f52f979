use crate::sources::selector;
use crate::utils::error::Result;
use scraper::{ElementRef, Html};
use serde_json::Value;
use std::collections::BTreeMap;

fn clean(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}

/// Reads an FGDC metadata page rendered as HTML definition lists.
///
/// Each `dl dt em` heading (without its trailing colon and spaces) maps to
/// the direct text of its `dt`: `null`, a single string, or a list when the
/// heading carries several values or repeats.
pub fn parse_fgdc_html(html: &str) -> Result<BTreeMap<String, Value>> {
    let document = Html::parse_document(html);
    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for em in document.select(&selector("dl dt em")?) {
        let heading: String = em
            .text()
            .collect::<String>()
            .trim()
            .trim_end_matches(':')
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        if heading.is_empty() {
            continue;
        }

        let texts = em
            .parent()
            .and_then(ElementRef::wrap)
            .map(|dt| {
                dt.children()
                    .filter_map(|node| node.value().as_text())
                    .map(|text| clean(text))
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        values.entry(heading).or_default().extend(texts);
    }

    Ok(values
        .into_iter()
        .map(|(heading, mut texts)| {
            let value = match texts.len() {
                0 => Value::Null,
                1 => Value::String(texts.remove(0)),
                _ => Value::from(texts),
            };
            (heading, value)
        })
        .collect())
}
