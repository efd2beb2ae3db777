//! Pulls a JSON object out of free-form model output.
//!
//! Generative models wrap the object they were asked for in prose or
//! markdown fences often enough that a plain `serde_json::from_str` is not
//! an option. The first `{` up to the last `}` is tried first, then the
//! whole text.

use crate::error::{Result, WasteSortError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

static JSON_OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

pub fn extract_json(text: &str) -> Result<Value> {
    let candidate = JSON_OBJECT_SPAN
        .find(text)
        .map(|m| m.as_str())
        .unwrap_or(text);

    serde_json::from_str(candidate.trim())
        .map_err(|e| WasteSortError::ParseError(format!("no JSON object in model output: {}", e)))
}

/// `extract_json` followed by a typed conversion.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T> {
    let value = extract_json(text)?;
    serde_json::from_value(value)
        .map_err(|e| WasteSortError::ParseError(format!("unexpected JSON shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_inside_prose() {
        let value = extract_json(r#"Sure! {"items": []} Thanks."#).unwrap();
        assert_eq!(value, json!({"items": []}));
    }

    #[test]
    fn test_markdown_fence_across_lines() {
        let text = "```json\n{\n  \"response\": \"Rinse it\",\n  \"binSuggestion\": \"Recycle\"\n}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["binSuggestion"], "Recycle");
    }

    #[test]
    fn test_span_is_greedy() {
        let value = extract_json(r#"{"a": {"b": 1}} trailing"#).unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn test_plain_json_without_braces() {
        assert_eq!(extract_json("[1, 2]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_not_json_fails() {
        assert!(matches!(
            extract_json("not json at all"),
            Err(WasteSortError::ParseError(_))
        ));
    }

    #[test]
    fn test_two_objects_in_prose_fail() {
        // greedy span swallows the prose between them
        assert!(extract_json(r#"{"a": 1} and {"b": 2}"#).is_err());
    }
}
