use crate::utils::error::{DisasterDataError, Result};
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;

/// Acquisition metadata of one catalog image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttributes {
    pub collect_time_start: i64,
    pub collect_time_end: i64,
    pub vehicle_name: String,
}

impl ImageAttributes {
    pub fn acquisition_start(&self) -> Result<String> {
        format_epoch_millis(self.collect_time_start)
    }

    pub fn acquisition_end(&self) -> Result<String> {
        format_epoch_millis(self.collect_time_end)
    }
}

/// `%Y-%m-%dT%H:%M:%S.ffffffZ` in UTC, truncated to whole seconds.
pub fn format_epoch_millis(millis: i64) -> Result<String> {
    let datetime = DateTime::from_timestamp(millis.div_euclid(1000), 0).ok_or_else(|| {
        DisasterDataError::ApiError {
            message: format!("timestamp out of range: {}", millis),
        }
    })?;
    Ok(datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
}

fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// `features[0].attributes` of an image service query response.
pub fn parse_query_response(body: &Value) -> Option<ImageAttributes> {
    let attributes = body.get("features")?.get(0)?.get("attributes")?;
    Some(ImageAttributes {
        collect_time_start: epoch_millis(attributes.get("collect_time_start")?)?,
        collect_time_end: epoch_millis(attributes.get("collect_time_end")?)?,
        vehicle_name: attributes.get("vehicle_name")?.as_str()?.to_string(),
    })
}

/// DigitalGlobe image-query service.
#[derive(Debug, Clone)]
pub struct DigitalGlobeApi {
    client: Client,
    url: String,
    api_key: String,
}

impl DigitalGlobeApi {
    pub fn new(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Looks up one image id. A response without features is logged and
    /// yields `None`.
    pub async fn image_attributes(&self, image_id: &str) -> Result<Option<ImageAttributes>> {
        let where_clause = format!("image_identifier IN ('{}')", image_id);
        let form = [
            ("outFields", "*"),
            ("outSR", "4326"),
            ("where", where_clause.as_str()),
            ("returnGeometry", "false"),
            ("f", "json"),
        ];

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("⚠️ Received malformed response from DG api for {}: {}", image_id, e);
                return Ok(None);
            }
        };

        let attributes = parse_query_response(&body);
        if attributes.is_none() {
            tracing::warn!("⚠️ Received malformed response from DG api for {}", image_id);
        }
        Ok(attributes)
    }
}
