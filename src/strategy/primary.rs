use super::DetectionStrategy;
use crate::{
    classify::{classify, enrichment_for},
    error::{Result, WasteSortError},
    gemini::{CredentialPool, PromptPayload},
    intake::ImageInput,
    models::{BinCategory, BoundingBox, ChatTurn, DetectedItem, DetectionResponse, ItemMetadata},
    parser::extract_as,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const DEFAULT_CONFIDENCE: f32 = 0.9;
pub const CHAT_FALLBACK_CHARS: usize = 200;
const DEFAULT_CHAT_REPLY: &str = "I'm here to help!";

pub const DETECTION_PROMPT: &str = r#"
Look at this image and identify every visible waste item.

Act as a sustainability expert. Put each item in exactly one bin:
Recycle, Organic, Hazardous or Landfill.

Reply with a JSON object of exactly this shape:
{
    "items": [
        {
            "itemType": "Name, e.g. Plastic Water Bottle",
            "bin": "Recycle" | "Organic" | "Hazardous" | "Landfill",
            "contaminated": true | false,
            "confidence": 0.95,
            "metadata": {
                "transformation": "One sentence on what this becomes after processing.",
                "impact": "One specific impact statistic.",
                "fun_fact": "A short, interesting fact about the material."
            }
        }
    ]
}

Rules:
- List every item you can see.
- If there is no waste in the image, return an empty items list.
- Repeated items may be listed separately or as one item with a count in the name.
- Be decisive: if it looks like plastic, treat it as a plastic item for recycling.
- Always return the full JSON structure.
"#;

pub fn chat_prompt(query: &str) -> String {
    format!(
        r#"
You are "Eco-Scrutinize AI", a friendly and expert sustainability assistant.
The user is asking: "{query}"

Give a concise, helpful answer of at most 3 sentences.
If they are asking about a specific item, suggest the correct bin.

Reply with JSON in this format:
{{
    "response": "Your helpful advice here.",
    "binSuggestion": "Recycle" | "Organic" | "Hazardous" | "Landfill"
}}
"#
    )
}

#[derive(Debug, Deserialize)]
struct PrimaryPayload {
    #[serde(default)]
    items: Vec<PrimaryItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimaryItem {
    item_type: String,
    #[serde(default)]
    bin: Option<String>,
    #[serde(default)]
    contaminated: Option<bool>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatPayload {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    bin_suggestion: Option<String>,
}

/// Keeps text values; numbers and booleans are stringified, anything else dropped.
fn metadata_from_json(raw: Option<Map<String, Value>>) -> ItemMetadata {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect()
}

fn to_detected_item(index: usize, item: PrimaryItem) -> DetectedItem {
    let bin = item
        .bin
        .as_deref()
        .map(BinCategory::from_label)
        .unwrap_or_else(|| classify(&item.item_type));
    let confidence = item
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let mut metadata = metadata_from_json(item.metadata);
    enrichment_for(&item.item_type).backfill(&mut metadata);

    DetectedItem {
        id: index as u32 + 1,
        item_type: item.item_type,
        bin,
        contaminated: item.contaminated.unwrap_or(false),
        confidence,
        bounding_box: BoundingBox::zero(),
        metadata,
    }
}

/// Maps raw model text to items. Unparsable text is an empty finding.
pub fn parse_detection(text: &str) -> DetectionResponse {
    match extract_as::<PrimaryPayload>(text) {
        Ok(payload) => DetectionResponse::new(
            payload
                .items
                .into_iter()
                .enumerate()
                .map(|(i, item)| to_detected_item(i, item))
                .collect(),
        ),
        Err(e) => {
            log::warn!("⚠️  Detection output was not usable JSON: {}", e);
            DetectionResponse::empty()
        }
    }
}

/// Maps raw model text to a chat turn, degrading to the raw text itself.
pub fn parse_chat(text: &str) -> ChatTurn {
    match extract_as::<ChatPayload>(text) {
        Ok(payload) => ChatTurn::new(
            payload
                .response
                .unwrap_or_else(|| DEFAULT_CHAT_REPLY.to_string()),
            payload
                .bin_suggestion
                .as_deref()
                .map(BinCategory::from_label)
                .unwrap_or(BinCategory::Landfill),
        ),
        Err(e) => {
            log::warn!("⚠️  Chat output was not JSON, returning raw text: {}", e);
            ChatTurn::degraded(text.trim().chars().take(CHAT_FALLBACK_CHARS).collect::<String>())
        }
    }
}

/// Generative-vision classifier behind the credential pool.
pub struct PrimaryStrategy {
    pool: Arc<CredentialPool>,
}

impl PrimaryStrategy {
    pub fn new(pool: Arc<CredentialPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub fn is_configured(&self) -> bool {
        !self.pool.is_empty()
    }

    pub async fn chat(&self, query: &str) -> Result<ChatTurn> {
        let text = self
            .pool
            .call_with_rotation(&PromptPayload::text(chat_prompt(query)))
            .await?;
        log::debug!("Raw chat output: {}", text);
        Ok(parse_chat(&text))
    }
}

#[async_trait]
impl DetectionStrategy for PrimaryStrategy {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn detect(&self, image: &ImageInput) -> Result<DetectionResponse> {
        if !self.is_configured() {
            return Err(WasteSortError::Unavailable("no credentials configured".into()));
        }

        log::info!("🧠 Requesting generative analysis");
        let payload = PromptPayload::with_image(DETECTION_PROMPT, image.clone());
        let text = self.pool.call_with_rotation(&payload).await?;
        log::debug!("Raw detection output: {}", text);

        let response = parse_detection(&text);
        if response.is_empty() {
            log::info!("Generative analysis returned no items");
        }
        Ok(response)
    }
}
