//! OpenAerialMap upload definitions for DigitalGlobe imagery.

use crate::domain::model::{OamScene, OamUpload};
use crate::sources::dg_open_data::api::ImageAttributes;
use crate::utils::error::{DisasterDataError, Result};
use reqwest::Client;

/// `{event}_{image id}` back into its parts; events may contain underscores.
pub fn split_title(title: &str) -> Option<(&str, &str)> {
    title
        .rsplit_once('_')
        .filter(|(event, image_id)| !event.is_empty() && !image_id.is_empty())
}

pub fn complete_scene(mut scene: OamScene, attributes: &ImageAttributes) -> Result<OamScene> {
    scene.acquisition_start = Some(attributes.acquisition_start()?);
    scene.acquisition_end = Some(attributes.acquisition_end()?);
    scene.sensor = Some(attributes.vehicle_name.clone());
    Ok(scene)
}

/// Storage key of a scene's upload definition.
pub fn upload_key(prefix: &str, event: &str, image_id: &str) -> String {
    format!("{}/{}/{}.json", prefix.trim_end_matches('/'), event, image_id)
}

pub fn upload_definition(scene: OamScene) -> OamUpload {
    OamUpload {
        scenes: vec![scene],
    }
}

#[derive(Debug, Clone)]
pub struct OamUploader {
    client: Client,
    url: String,
}

impl OamUploader {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Submits an upload definition with the `oam-session` cookie; returns
    /// the response body.
    pub async fn upload(&self, cookie: &str, payload: &[u8]) -> Result<String> {
        let definition: OamUpload = serde_json::from_slice(payload)?;
        if definition.scenes.is_empty() {
            return Err(DisasterDataError::ApiError {
                message: "upload definition has no scenes".to_string(),
            });
        }

        tracing::info!("Submitting {} scene(s) to {}", definition.scenes.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::COOKIE, format!("oam-session={}", cookie))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DisasterDataError::ApiError {
                message: format!("OpenAerialMap upload failed with {}: {}", status, body),
            });
        }
        Ok(body)
    }
}
