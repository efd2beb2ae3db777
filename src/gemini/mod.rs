pub mod client;
pub mod pool;

use crate::{config::GeminiConfig, error::Result, intake::ImageInput};
use async_trait::async_trait;
use std::sync::Arc;

pub use client::{GeminiModel, GeminiResolver, StaticResolver};
pub use pool::{Credential, CredentialPool, FailureKind};

/// Ranked model-name markers: newest flash first, then pro, then any flash.
pub const MODEL_PREFERENCES: &[&str] = &["2.5-flash", "2.0-flash", "1.5-flash", "pro", "flash"];

/// Used unverified when the service refuses to list its models.
pub const FALLBACK_MODELS: &[&str] = &["models/gemini-1.5-flash", "models/gemini-pro"];

#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub prompt: String,
    pub image: Option<ImageInput>,
}

impl PromptPayload {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImageInput) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// A callable model bound to one credential.
#[async_trait]
pub trait ModelHandle: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, payload: &PromptPayload) -> Result<String>;
}

/// Turns a credential into a bound model handle.
#[async_trait]
pub trait ModelResolver: Send + Sync {
    async fn resolve(
        &self,
        credential: &Credential,
        preferences: &[&str],
    ) -> Result<Arc<dyn ModelHandle>>;
}

/// Static override when a model is configured, live probing otherwise.
pub fn resolver_for(config: &GeminiConfig) -> Arc<dyn ModelResolver> {
    match &config.model_override {
        Some(model) => Arc::new(StaticResolver::new(&config.base_url, model)),
        None => Arc::new(GeminiResolver::new(&config.base_url)),
    }
}

pub fn pool_from_config(config: &GeminiConfig) -> CredentialPool {
    let credentials = config.api_keys.iter().cloned().map(Credential::new).collect();
    CredentialPool::new(credentials, resolver_for(config))
}
