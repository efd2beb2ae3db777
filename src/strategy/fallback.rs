use super::{detector::ObjectDetector, DetectionStrategy};
use crate::{
    classify::{classify, enrichment_for, is_contaminating},
    error::Result,
    intake::ImageInput,
    models::{BoundingBox, DetectedItem, DetectionResponse, RawDetection},
};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

pub const MIN_CONFIDENCE: f32 = 0.25;
pub const MAX_ITEMS: usize = 3;

/// People are never waste.
pub const IGNORED_LABELS: &[&str] = &["person", "face", "hand", "man", "woman"];

pub struct FallbackStrategy {
    detector: Arc<dyn ObjectDetector>,
    min_confidence: f32,
    max_items: usize,
}

impl FallbackStrategy {
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self {
            detector,
            min_confidence: MIN_CONFIDENCE,
            max_items: MAX_ITEMS,
        }
    }

    pub fn map_detections(&self, raw: Vec<RawDetection>) -> Vec<DetectedItem> {
        map_detections(raw, self.min_confidence, self.max_items)
    }
}

/// "cell phone" -> "Cell phone"
pub fn display_label(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_ignored(label: &str) -> bool {
    let label = label.trim();
    IGNORED_LABELS.iter().any(|l| l.eq_ignore_ascii_case(label))
}

/// Filters, classifies and enriches raw hits. Ids follow detection order;
/// the result is then sorted by confidence and cut to `max_items`.
pub fn map_detections(
    raw: Vec<RawDetection>,
    min_confidence: f32,
    max_items: usize,
) -> Vec<DetectedItem> {
    let mut items: Vec<DetectedItem> = Vec::new();

    for hit in raw {
        if hit.confidence.is_nan() || hit.confidence < min_confidence || is_ignored(&hit.label) {
            continue;
        }

        items.push(DetectedItem {
            id: items.len() as u32 + 1,
            item_type: display_label(&hit.label),
            bin: classify(&hit.label),
            contaminated: is_contaminating(&hit.label),
            confidence: hit.confidence.min(1.0),
            bounding_box: BoundingBox::from_corners(hit.x1, hit.y1, hit.x2, hit.y2),
            metadata: enrichment_for(&hit.label).to_metadata(),
        });
    }

    items.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    items.truncate(max_items);
    items
}

#[async_trait]
impl DetectionStrategy for FallbackStrategy {
    fn name(&self) -> &'static str {
        "local-detector"
    }

    async fn detect(&self, image: &ImageInput) -> Result<DetectionResponse> {
        log::info!("🚀 Running local detector {}", self.detector.name());
        let raw = self.detector.detect(image).await?;
        let items = self.map_detections(raw);
        if items.is_empty() {
            log::info!("Local detector found nothing usable");
        }
        Ok(DetectionResponse::new(items))
    }
}
