use serde::{Deserialize, Serialize};

/// One raw hit from the local object detector, in corner form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, confidence: f32, corners: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = corners;
        Self {
            label: label.into(),
            confidence,
            x1,
            y1,
            x2,
            y2,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetectorRequest {
    /// Base64 encoded image bytes.
    pub image: String,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct DetectorResponse {
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}
