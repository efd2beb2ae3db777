//! Ordered pool of API keys with rotate-on-failure calls.
//!
//! The shared state is the active index plus one resolved handle per
//! credential. Each call reads the index, sweeps the pool from there on its
//! own, and publishes whichever credential worked. A concurrent caller that
//! already moved the index is left alone, so callers converge on a working
//! key without holding a lock across network calls. Discovery runs once per
//! credential; later sweeps reuse the cached handle.

use super::{ModelHandle, ModelResolver, PromptPayload, MODEL_PREFERENCES};
use crate::error::{Result, WasteSortError};
use std::fmt;
use std::sync::{Arc, RwLock};

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

// Only a short prefix ever reaches logs.
impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(5).collect();
        write!(f, "{}...", prefix)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self)
    }
}

/// Coarse reading of why a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    RateLimited,
    NotFound,
    Other,
}

impl FailureKind {
    pub fn of(err: &WasteSortError) -> Self {
        match err {
            WasteSortError::PoolExhausted { last, .. } => Self::of(last),
            WasteSortError::ServiceError { status, message } => match status {
                401 | 403 => FailureKind::Unauthorized,
                429 => FailureKind::RateLimited,
                404 => FailureKind::NotFound,
                _ => Self::from_message(message),
            },
            other => Self::from_message(&other.to_string()),
        }
    }

    /// Auth and quota failures apply to the key, not to a single model.
    pub fn is_key_wide(self) -> bool {
        matches!(self, FailureKind::Unauthorized | FailureKind::RateLimited)
    }

    pub fn from_message(message: &str) -> Self {
        const RATE_MARKERS: &[&str] = &["429", "ResourceExhausted", "RESOURCE_EXHAUSTED", "quota"];
        const NOT_FOUND_MARKERS: &[&str] = &["404", "NOT_FOUND"];
        const AUTH_MARKERS: &[&str] = &[
            "401",
            "403",
            "PERMISSION_DENIED",
            "UNAUTHENTICATED",
            "API_KEY_INVALID",
        ];

        if RATE_MARKERS.iter().any(|m| message.contains(m)) {
            FailureKind::RateLimited
        } else if NOT_FOUND_MARKERS.iter().any(|m| message.contains(m)) {
            FailureKind::NotFound
        } else if AUTH_MARKERS.iter().any(|m| message.contains(m)) {
            FailureKind::Unauthorized
        } else {
            FailureKind::Other
        }
    }
}

struct ActiveSlot {
    index: usize,
    /// Resolved handle per credential, so rotation never repeats discovery.
    handles: Vec<Option<Arc<dyn ModelHandle>>>,
}

pub struct CredentialPool {
    credentials: Vec<Credential>,
    resolver: Arc<dyn ModelResolver>,
    active: RwLock<ActiveSlot>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>, resolver: Arc<dyn ModelResolver>) -> Self {
        let handles = vec![None; credentials.len()];
        Self {
            credentials,
            resolver,
            active: RwLock::new(ActiveSlot { index: 0, handles }),
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active.read().unwrap_or_else(|e| e.into_inner()).index
    }

    fn cached(&self, index: usize) -> Option<Arc<dyn ModelHandle>> {
        let slot = self.active.read().unwrap_or_else(|e| e.into_inner());
        slot.handles.get(index).cloned().flatten()
    }

    fn remember(&self, index: usize, handle: Option<Arc<dyn ModelHandle>>) {
        let mut slot = self.active.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = slot.handles.get_mut(index) {
            *entry = handle;
        }
    }

    /// Moves the active index to the credential that just worked, unless
    /// another caller has already moved on from `seen`.
    fn publish(&self, seen: usize, index: usize, model_name: &str) {
        let mut slot = self.active.write().unwrap_or_else(|e| e.into_inner());
        if slot.index != seen || index == seen {
            return;
        }
        log::info!(
            "🔄 Rotated to credential #{} of {} ({})",
            index + 1,
            self.len(),
            model_name
        );
        slot.index = index;
    }

    async fn try_activate(&self, index: usize) -> Result<Arc<dyn ModelHandle>> {
        let credential = self.credentials.get(index).ok_or_else(|| {
            WasteSortError::ConfigError(format!("no credential at index {}", index))
        })?;
        let handle = self.resolver.resolve(credential, MODEL_PREFERENCES).await?;
        self.remember(index, Some(handle.clone()));
        Ok(handle)
    }

    /// Binds a model handle for the credential at `index`, or `None` when
    /// that credential cannot be configured.
    pub async fn activate(&self, index: usize) -> Option<Arc<dyn ModelHandle>> {
        match self.try_activate(index).await {
            Ok(handle) => {
                log::info!(
                    "🚀 Credential #{} active using {}",
                    index + 1,
                    handle.model_name()
                );
                Some(handle)
            }
            Err(e) => {
                log::error!("❌ Credential #{} could not be activated: {}", index + 1, e);
                None
            }
        }
    }

    /// Eagerly binds the current credential so the first request does not
    /// pay for model discovery. Returns whether a handle is now bound.
    pub async fn warm_up(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        let index = self.active_index();
        self.cached(index).is_some() || self.activate(index).await.is_some()
    }

    /// Calls the active model, moving through the pool on any failure.
    /// Every credential is tried at most once per call.
    pub async fn call_with_rotation(&self, payload: &PromptPayload) -> Result<String> {
        if self.is_empty() {
            return Err(WasteSortError::Unavailable(
                "no credentials configured".into(),
            ));
        }

        let total = self.len();
        let start = self.active_index();
        let mut last_error = None;

        for attempt in 0..total {
            let index = (start + attempt) % total;

            let handle = match self.cached(index) {
                Some(handle) => handle,
                None => match self.try_activate(index).await {
                    Ok(handle) => handle,
                    Err(e) => {
                        log::warn!(
                            "⚠️  Credential #{} unusable ({:?}): {}",
                            index + 1,
                            FailureKind::of(&e),
                            e
                        );
                        last_error = Some(e);
                        continue;
                    }
                },
            };

            match handle.generate(payload).await {
                Ok(text) => {
                    self.publish(start, index, handle.model_name());
                    return Ok(text);
                }
                Err(e) => {
                    let kind = FailureKind::of(&e);
                    log::warn!("⚠️  Credential #{} failed ({:?}): {}", index + 1, kind, e);
                    // The bound model is gone; rediscover next time.
                    if kind == FailureKind::NotFound {
                        self.remember(index, None);
                    }
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .unwrap_or_else(|| WasteSortError::Unavailable("no attempt was made".into()));
        Err(WasteSortError::PoolExhausted {
            attempts: total,
            last: Box::new(last),
        })
    }
}
