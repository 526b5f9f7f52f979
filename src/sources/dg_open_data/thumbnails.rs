use crate::core::http::HttpClient;
use crate::domain::ports::MessageQueue;
use crate::utils::error::Result;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Published collection catalog of a DigitalGlobe event.
pub fn collection_url(public_root: &str, collection: &str) -> String {
    format!(
        "{}/DGOpenData/{}/catalog.json",
        public_root.trim_end_matches('/'),
        collection
    )
}

fn link_hrefs<'a>(node: &'a Value, rel: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    node.get("links")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(move |link| link.get("rel").and_then(Value::as_str) == Some(rel))
        .filter_map(|link| link.get("href").and_then(Value::as_str))
}

fn matches_sensor(item: &Value, sensor: Option<&str>) -> bool {
    match sensor {
        None => true,
        Some(sensor) => item
            .get("properties")
            .and_then(|p| p.get("eo:platform"))
            .and_then(Value::as_str)
            == Some(sensor),
    }
}

/// Every item below `start`, following `child` and `item` links.
/// Items without a matching `eo:platform` are dropped when `sensor` is set.
/// Only an unreachable `start` is an error; other documents are skipped.
pub async fn find_items(http: &HttpClient, start: &str, sensor: Option<&str>) -> Result<Vec<Value>> {
    let root = crate::sources::parse_base(start)?;
    let mut pending = VecDeque::from([root.clone()]);
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    while let Some(url) = pending.pop_front() {
        if !seen.insert(url.to_string()) {
            continue;
        }
        let node: Value = match http.get_json(url.as_str()).await {
            Ok(node) => node,
            Err(e) if url == root => return Err(e),
            Err(e) => {
                tracing::warn!("⚠️ Skipping catalog {}: {}", url, e);
                continue;
            }
        };

        for href in link_hrefs(&node, "child") {
            if let Ok(child) = url.join(href) {
                pending.push_back(child);
            }
        }
        let item_urls: Vec<Url> = link_hrefs(&node, "item")
            .filter_map(|href| url.join(href).ok())
            .collect();
        for item_url in item_urls {
            match http.get_json::<Value>(item_url.as_str()).await {
                Ok(item) if matches_sensor(&item, sensor) => items.push(item),
                Ok(_) => {}
                Err(e) => tracing::warn!("⚠️ Skipping item {}: {}", item_url, e),
            }
        }
    }
    Ok(items)
}

/// Sends each item of a published collection to the thumbnail queue.
pub async fn rebuild_thumbnails<Q: MessageQueue + ?Sized>(
    http: &HttpClient,
    queue: &Q,
    public_root: &str,
    collection: &str,
    sensor: Option<&str>,
) -> Result<usize> {
    let items = find_items(http, &collection_url(public_root, collection), sensor).await?;
    for item in &items {
        queue.send(serde_json::to_string(item)?).await?;
    }
    tracing::info!("Queued {} items of {} for thumbnails", items.len(), collection);
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::HttpSettings;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQueue {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageQueue for RecordingQueue {
        async fn send(&self, body: String) -> Result<()> {
            self.sent.lock().unwrap().push(body);
            Ok(())
        }
    }

    #[test]
    fn test_collection_url() {
        assert_eq!(
            collection_url("https://cognition-disaster-data.s3.amazonaws.com/", "harvey"),
            "https://cognition-disaster-data.s3.amazonaws.com/DGOpenData/harvey/catalog.json"
        );
    }

    #[tokio::test]
    async fn test_rebuild_filters_by_sensor() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/DGOpenData/harvey/catalog.json");
            then.status(200).json_body(json!({
                "id": "harvey",
                "links": [
                    {"rel": "parent", "href": "../catalog.json"},
                    {"rel": "child", "href": "./post/catalog.json"},
                    {"rel": "item", "href": "./a.json"}
                ]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/DGOpenData/harvey/post/catalog.json");
            then.status(200).json_body(json!({
                "id": "post",
                "links": [{"rel": "item", "href": "b.json"}]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/DGOpenData/harvey/a.json");
            then.status(200).json_body(json!({"id": "a", "properties": {"eo:platform": "WV02"}}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/DGOpenData/harvey/post/b.json");
            then.status(200).json_body(json!({"id": "b", "properties": {}}));
        });

        let http = HttpClient::new(&HttpSettings::default()).unwrap();
        let queue = RecordingQueue::default();

        let sent = rebuild_thumbnails(&http, &queue, &server.base_url(), "harvey", Some("WV02"))
            .await
            .unwrap();
        assert_eq!(sent, 1);
        assert!(queue.sent.lock().unwrap()[0].contains("\"a\""));

        let sent = rebuild_thumbnails(&http, &queue, &server.base_url(), "harvey", None)
            .await
            .unwrap();
        assert_eq!(sent, 2);
    }

    #[tokio::test]
    async fn test_unreachable_item_is_skipped() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/DGOpenData/harvey/catalog.json");
            then.status(200).json_body(json!({
                "id": "harvey",
                "links": [
                    {"rel": "child", "href": "./gone/catalog.json"},
                    {"rel": "item", "href": "./missing.json"},
                    {"rel": "item", "href": "./a.json"}
                ]
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/DGOpenData/harvey/a.json");
            then.status(200).json_body(json!({"id": "a", "properties": {}}));
        });

        let http = HttpClient::new(&HttpSettings::default()).unwrap();
        let queue = RecordingQueue::default();

        let sent = rebuild_thumbnails(&http, &queue, &server.base_url(), "harvey", None)
            .await
            .unwrap();
        assert_eq!(sent, 1);
        assert_eq!(queue.sent.lock().unwrap().len(), 1);

        let missing = rebuild_thumbnails(&http, &queue, &server.base_url(), "irma", None).await;
        assert!(missing.is_err());
    }
}
