use super::item::BinCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub response: String,
    pub bin_suggestion: BinCategory,
}

impl ChatTurn {
    pub fn new(response: impl Into<String>, bin_suggestion: BinCategory) -> Self {
        Self {
            response: response.into(),
            bin_suggestion,
        }
    }

    /// A reply that carries no disposal advice.
    pub fn degraded(response: impl Into<String>) -> Self {
        Self::new(response, BinCategory::Landfill)
    }
}
