use crate::{
    error::{Result, WasteSortError},
    intake::ImageInput,
    models::{DetectorRequest, DetectorResponse, RawDetection},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use std::time::Duration;

/// Local object detector: image in, labelled boxes out.
///
/// Implementations report every hit they have; thresholding and label
/// filtering happen in the fallback strategy.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    fn name(&self) -> &str;

    async fn detect(&self, image: &ImageInput) -> Result<Vec<RawDetection>>;
}

/// Detector model served by a sidecar process on the same host.
#[derive(Clone)]
pub struct HttpDetector {
    client: Client,
    base_url: String,
}

impl HttpDetector {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WasteSortError::ConfigError(format!("detector client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the client and checks the sidecar has its model loaded.
    pub async fn connect(base_url: &str) -> Result<Self> {
        let detector = Self::new(base_url)?;
        if !detector.health().await {
            return Err(WasteSortError::Unavailable(format!(
                "detector at {} is not ready",
                detector.base_url
            )));
        }
        Ok(detector)
    }

    pub async fn health(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                log::warn!("Detector health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    fn name(&self) -> &str {
        "http-detector"
    }

    async fn detect(&self, image: &ImageInput) -> Result<Vec<RawDetection>> {
        let request = DetectorRequest {
            image: BASE64.encode(&image.bytes),
            mime_type: image.mime_type.clone(),
        };

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| WasteSortError::DetectorError(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error = response.text().await.unwrap_or_default();
            return Err(WasteSortError::DetectorError(format!(
                "detector returned {}: {}",
                status, error
            )));
        }

        let result: DetectorResponse = response
            .json()
            .await
            .map_err(|e| WasteSortError::DetectorError(e.to_string()))?;
        log::debug!("Detector returned {} raw hits", result.detections.len());
        Ok(result.detections)
    }
}
