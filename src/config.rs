use std::env;

/// Placeholder shipped in sample `.env` files; never a usable key.
pub const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_keys: Vec<String>,
    pub model_override: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub gemini: GeminiConfig,
    pub detector: DetectorConfig,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

/// Splits a comma-separated credential list, dropping blanks and the placeholder.
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty() && *key != PLACEHOLDER_KEY)
        .map(String::from)
        .collect()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_keys: Vec::new(),
            model_override: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_keys = env::var("GEMINI_API_KEY")
            .map(|raw| parse_api_keys(&raw))
            .unwrap_or_default();
        let model_override = env::var("GEMINI_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let base_url = env::var("GEMINI_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        GeminiConfig {
            api_keys,
            model_override,
            base_url,
        }
    }

    pub fn with_credentials<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.api_keys = parse_api_keys(&joined.join(","));
        self
    }

    pub fn with_model_override(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig { url: None }
    }
}

impl DetectorConfig {
    pub fn from_env() -> Self {
        let url = env::var("DETECTOR_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        DetectorConfig { url }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: None,
            gemini: GeminiConfig::default(),
            detector: DetectorConfig::default(),
            log_level: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let log_level = env::var("LOG_LEVEL").ok();
        let log_file = env::var("LOG_FILE").ok().filter(|f| !f.is_empty());

        Config {
            host,
            port,
            gemini: GeminiConfig::from_env(),
            detector: DetectorConfig::from_env(),
            log_level,
            log_file,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_detector(mut self, config: DetectorConfig) -> Self {
        self.detector = config;
        self
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(8000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_keys_drops_blanks_and_placeholder() {
        let keys = parse_api_keys(" key-a, ,YOUR_API_KEY_HERE,key-b ,");
        assert_eq!(keys, vec!["key-a".to_string(), "key-b".to_string()]);
    }

    #[test]
    fn test_placeholder_only_means_unconfigured() {
        let config = GeminiConfig::new().with_credentials([PLACEHOLDER_KEY]);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.port_or_default(), 8000);
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
        assert!(config.detector.url.is_none());
    }
}
