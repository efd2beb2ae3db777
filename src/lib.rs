//! Waste classification with a generative-vision primary strategy, a
//! rotating credential pool, and a local object-detector fallback.

pub mod classify;
pub mod config;
pub mod error;
pub mod gemini;
pub mod intake;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod parser;
#[cfg(feature = "server")]
pub mod server;
pub mod strategy;

pub use config::{Config, DetectorConfig, GeminiConfig};
pub use error::{Result, WasteSortError};
pub use gemini::{Credential, CredentialPool, ModelHandle, ModelResolver, PromptPayload};
pub use models::{BinCategory, BoundingBox, ChatTurn, DetectedItem, DetectionResponse};
pub use orchestrator::Orchestrator;
pub use strategy::{DetectionStrategy, FallbackStrategy, ObjectDetector, PrimaryStrategy};
