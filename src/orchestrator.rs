//! Request-level sequencing of the detection strategies and the chat path.
//!
//! Nothing here fails outward: every internal error becomes an empty
//! detection or a friendly chat reply.

use crate::{
    config::Config,
    error::WasteSortError,
    gemini::{pool_from_config, FailureKind},
    intake::{decode_image, ImageInput},
    logger::Timer,
    models::{ChatTurn, DetectionResponse},
    strategy::{DetectionStrategy, FallbackStrategy, HttpDetector, PrimaryStrategy},
};
use std::sync::Arc;

pub const OFFLINE_MESSAGE: &str =
    "I'm currently in offline mode. Please check my API configuration.";
pub const RATE_LIMITED_MESSAGE: &str =
    "I'm a bit overwhelmed with requests right now. Please wait about 60 seconds and try again!";
pub const NOT_FOUND_MESSAGE: &str = "I'm having trouble finding my knowledge base. (Error 404)";
const ERROR_DETAIL_CHARS: usize = 50;

/// Friendly chat reply for a failed primary call.
pub fn chat_error_message(err: &WasteSortError) -> String {
    match FailureKind::of(err) {
        FailureKind::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
        FailureKind::NotFound => NOT_FOUND_MESSAGE.to_string(),
        _ => {
            let cause = match err {
                WasteSortError::PoolExhausted { last, .. } => last.as_ref(),
                other => other,
            };
            let detail: String = cause.to_string().chars().take(ERROR_DETAIL_CHARS).collect();
            format!("I'm having trouble connecting to my brain. (Detail: {})", detail)
        }
    }
}

pub struct Orchestrator {
    primary: Option<PrimaryStrategy>,
    fallback: Option<FallbackStrategy>,
}

impl Orchestrator {
    pub fn new(primary: Option<PrimaryStrategy>, fallback: Option<FallbackStrategy>) -> Self {
        let primary = primary.filter(PrimaryStrategy::is_configured);
        Self { primary, fallback }
    }

    /// Wires both strategies from configuration. Either may end up missing;
    /// that is logged, not fatal.
    pub async fn from_config(config: &Config) -> Self {
        let primary = if config.gemini.is_configured() {
            let pool = Arc::new(pool_from_config(&config.gemini));
            log::info!("🔑 Credential pool holds {} key(s)", pool.len());
            if !pool.warm_up().await {
                log::warn!("⚠️  No credential could be activated at startup; will retry per request");
            }
            Some(PrimaryStrategy::new(pool))
        } else {
            log::warn!("⚠️  No Gemini credentials configured; generative analysis disabled");
            None
        };

        let fallback = match &config.detector.url {
            Some(url) => match HttpDetector::connect(url).await {
                Ok(detector) => {
                    log::info!("✅ Local detector ready at {}", url);
                    Some(FallbackStrategy::new(Arc::new(detector)))
                }
                Err(e) => {
                    log::warn!("⚠️  Local detector unavailable: {}", e);
                    None
                }
            },
            None => {
                log::warn!("⚠️  DETECTOR_URL not set; local detection disabled");
                None
            }
        };

        Self::new(primary, fallback)
    }

    pub fn primary_available(&self) -> bool {
        self.primary.is_some()
    }

    pub fn fallback_available(&self) -> bool {
        self.fallback.is_some()
    }

    fn strategies(&self) -> Vec<&dyn DetectionStrategy> {
        let mut strategies: Vec<&dyn DetectionStrategy> = Vec::with_capacity(2);
        if let Some(primary) = &self.primary {
            strategies.push(primary);
        }
        if let Some(fallback) = &self.fallback {
            strategies.push(fallback);
        }
        strategies
    }

    /// Decodes the upload first; unreadable bytes give an empty response.
    pub async fn detect_bytes(&self, bytes: &[u8]) -> DetectionResponse {
        match decode_image(bytes) {
            Ok(image) => self.detect(&image).await,
            Err(e) => {
                log::error!("❌ Image read failed: {}", e);
                DetectionResponse::empty()
            }
        }
    }

    /// First strategy that yields at least one item wins.
    pub async fn detect(&self, image: &ImageInput) -> DetectionResponse {
        let _timer = Timer::new("detect");

        for strategy in self.strategies() {
            match strategy.detect(image).await {
                Ok(response) if !response.is_empty() => {
                    log::info!(
                        "✅ {} found {} item(s)",
                        strategy.name(),
                        response.len()
                    );
                    return response;
                }
                Ok(_) => log::info!("{} found nothing, moving on", strategy.name()),
                Err(e) => log::warn!("⚠️  {} failed: {}", strategy.name(), e),
            }
        }

        DetectionResponse::empty()
    }

    pub async fn chat(&self, query: &str) -> ChatTurn {
        let primary = match &self.primary {
            Some(primary) => primary,
            None => return ChatTurn::degraded(OFFLINE_MESSAGE),
        };

        let _timer = Timer::new("chat");
        match primary.chat(query).await {
            Ok(turn) => turn,
            Err(e) => {
                log::error!("❌ Chat assistant error: {}", e);
                ChatTurn::degraded(chat_error_message(&e))
            }
        }
    }
}
