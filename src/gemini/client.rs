use super::{
    pool::Credential, FailureKind, ModelHandle, ModelResolver, PromptPayload, FALLBACK_MODELS,
};
use crate::{
    error::{Result, WasteSortError},
    models::{
        GeminiInlineData, GeminiModelInfo, GeminiPart, GeminiRequestContent,
        GenerateContentRequest, GenerateContentResponse, ListModelsResponse,
    },
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

const PROBE_PROMPT: &str = "hi";
const PROBE_DELAY: Duration = Duration::from_millis(500);
/// Verification calls spent on one key before giving up on it.
pub const MAX_PROBES: usize = 3;
const MAX_LIST_PAGES: usize = 5;

/// `generateContent` on one model with one API key.
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    base_url: String,
    model_name: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(client: Client, base_url: &str, model_name: &str, credential: &Credential) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: normalize_model_name(model_name),
            api_key: credential.secret().to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model_name)
    }
}

pub fn build_request(payload: &PromptPayload) -> GenerateContentRequest {
    let mut parts = vec![GeminiPart::Text {
        text: payload.prompt.clone(),
    }];
    if let Some(image) = &payload.image {
        parts.push(GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.bytes),
            },
        });
    }

    GenerateContentRequest {
        contents: vec![GeminiRequestContent { parts }],
    }
}

/// Model names from the listing API carry a `models/` prefix; overrides may not.
pub fn normalize_model_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{}", name)
    }
}

/// Keeps `generateContent`-capable models, ordered by the first preference
/// marker each name contains. Unmatched names keep their listing order at the end.
pub fn rank_models(models: Vec<GeminiModelInfo>, preferences: &[&str]) -> Vec<GeminiModelInfo> {
    let mut candidates: Vec<GeminiModelInfo> = models
        .into_iter()
        .filter(GeminiModelInfo::supports_generate_content)
        .collect();
    candidates.sort_by_key(|m| {
        let name = m.name.to_lowercase();
        preferences
            .iter()
            .position(|p| name.contains(p))
            .unwrap_or(usize::MAX)
    });
    candidates
}

async fn error_from_response(response: reqwest::Response) -> WasteSortError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    WasteSortError::ServiceError { status, message }
}

#[async_trait]
impl ModelHandle for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, payload: &PromptPayload) -> Result<String> {
        let request = build_request(payload);
        log::debug!(
            "Invoking {} (image: {})",
            self.model_name,
            payload.image.is_some()
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| WasteSortError::RequestError(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| WasteSortError::ResponseError(e.to_string()))?;

        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(WasteSortError::ResponseError(format!(
                "prompt blocked: {}",
                reason
            )));
        }

        let reason = body.finish_reason();
        match body.first_text() {
            Some(text) if !text.is_empty() || reason.map_or(true, |r| r == "STOP") => Ok(text),
            Some(_) | None => Err(WasteSortError::ResponseError(match reason {
                Some(reason) => format!("no text returned, finish reason {}", reason),
                None => "no candidates returned".to_string(),
            })),
        }
    }
}

/// Discovers a working model for a key by listing and probing.
#[derive(Clone)]
pub struct GeminiResolver {
    client: Client,
    base_url: String,
    probe_delay: Duration,
}

impl GeminiResolver {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_delay: PROBE_DELAY,
        }
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    async fn list_models(&self, credential: &Credential) -> Result<Vec<GeminiModelInfo>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut request = self
                .client
                .get(format!("{}/models", self.base_url))
                .query(&[("key", credential.secret()), ("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            let listing: ListModelsResponse = response
                .json()
                .await
                .map_err(|e| WasteSortError::ResponseError(e.to_string()))?;
            models.extend(listing.models);

            match listing.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(models)
    }

    fn bind(&self, credential: &Credential, model_name: &str) -> GeminiModel {
        GeminiModel::new(self.client.clone(), &self.base_url, model_name, credential)
    }
}

#[async_trait]
impl ModelResolver for GeminiResolver {
    async fn resolve(
        &self,
        credential: &Credential,
        preferences: &[&str],
    ) -> Result<Arc<dyn ModelHandle>> {
        log::info!("📡 Discovering models for credential {}", credential);

        let models = match self.list_models(credential).await {
            Ok(models) => models,
            Err(e) => {
                log::warn!("⚠️  Could not list models ({}), using {}", e, FALLBACK_MODELS[0]);
                return Ok(Arc::new(self.bind(credential, FALLBACK_MODELS[0])));
            }
        };

        let ranked = rank_models(models, preferences);
        let mut last_error = None;
        for (i, candidate) in ranked.iter().take(MAX_PROBES).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.probe_delay).await;
            }
            let model = self.bind(credential, &candidate.name);
            match model.generate(&PromptPayload::text(PROBE_PROMPT)).await {
                Ok(_) => {
                    log::info!("✅ Verified model {} for {}", candidate.name, credential);
                    return Ok(Arc::new(model));
                }
                Err(e) if FailureKind::of(&e).is_key_wide() => {
                    log::warn!("⚠️  Credential {} refused during discovery: {}", credential, e);
                    return Err(e);
                }
                Err(e) => {
                    log::debug!("{} failed verification: {}", candidate.name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(WasteSortError::ConfigError(format!(
            "no working model for credential {} ({} of {} candidates probed{})",
            credential,
            ranked.len().min(MAX_PROBES),
            ranked.len(),
            last_error
                .map(|e| format!(", last error: {}", e))
                .unwrap_or_default()
        )))
    }
}

/// Binds a fixed model name without touching the network.
#[derive(Clone)]
pub struct StaticResolver {
    client: Client,
    base_url: String,
    model_name: String,
}

impl StaticResolver {
    pub fn new(base_url: &str, model_name: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl ModelResolver for StaticResolver {
    async fn resolve(
        &self,
        credential: &Credential,
        _preferences: &[&str],
    ) -> Result<Arc<dyn ModelHandle>> {
        Ok(Arc::new(GeminiModel::new(
            self.client.clone(),
            &self.base_url,
            &self.model_name,
            credential,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::MODEL_PREFERENCES;
    use crate::intake::ImageInput;

    fn info(name: &str, generate: bool) -> GeminiModelInfo {
        GeminiModelInfo {
            name: name.to_string(),
            supported_generation_methods: if generate {
                vec!["generateContent".to_string()]
            } else {
                vec!["embedContent".to_string()]
            },
        }
    }

    #[test]
    fn test_rank_prefers_newest_flash() {
        let ranked = rank_models(
            vec![
                info("models/gemini-pro", true),
                info("models/text-embedding-004", false),
                info("models/gemini-1.5-flash", true),
                info("models/gemini-2.5-flash", true),
                info("models/gemma-3", true),
            ],
            MODEL_PREFERENCES,
        );
        let names: Vec<&str> = ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "models/gemini-2.5-flash",
                "models/gemini-1.5-flash",
                "models/gemini-pro",
                "models/gemma-3",
            ]
        );
    }

    #[test]
    fn test_normalize_model_name() {
        assert_eq!(normalize_model_name("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(normalize_model_name("models/gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn test_request_carries_inline_image() {
        let image = ImageInput {
            bytes: Arc::from(&b"abc"[..]),
            mime_type: "image/jpeg".to_string(),
            width: 1,
            height: 1,
        };
        let request = build_request(&PromptPayload::with_image("look", image));
        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "look");
        assert_eq!(parts[1]["inlineData"]["data"], "YWJj");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_text_only_request_has_one_part() {
        let request = build_request(&PromptPayload::text("hello"));
        assert_eq!(request.contents[0].parts.len(), 1);
    }

    #[tokio::test]
    async fn test_unlisted_service_falls_back_to_default_model() {
        let resolver = GeminiResolver::new("http://127.0.0.1:9");
        let handle = resolver
            .resolve(&Credential::new("key"), MODEL_PREFERENCES)
            .await
            .unwrap();
        assert_eq!(handle.model_name(), FALLBACK_MODELS[0]);
    }

    #[cfg(feature = "server")]
    mod live {
        use super::*;
        use crate::gemini::CredentialPool;
        use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
        use serde_json::{json, Value};
        use std::sync::atomic::{AtomicUsize, Ordering};

        /// In-process stand-in for the Gemini REST API.
        #[derive(Clone)]
        struct FakeGemini {
            models: Vec<&'static str>,
            paged: bool,
            answer: fn(&str) -> HttpResponse,
            generate_calls: Arc<AtomicUsize>,
        }

        impl FakeGemini {
            fn new(models: Vec<&'static str>, answer: fn(&str) -> HttpResponse) -> Self {
                Self {
                    models,
                    paged: false,
                    answer,
                    generate_calls: Arc::new(AtomicUsize::new(0)),
                }
            }

            fn calls(&self) -> usize {
                self.generate_calls.load(Ordering::SeqCst)
            }
        }

        fn listing(names: &[&str]) -> Value {
            let models: Vec<Value> = names
                .iter()
                .map(|n| json!({"name": n, "supportedGenerationMethods": ["generateContent"]}))
                .collect();
            json!({ "models": models })
        }

        fn reply(text: &str) -> HttpResponse {
            HttpResponse::Ok().json(json!({
                "candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": "STOP"}]
            }))
        }

        fn quota_exceeded(_model: &str) -> HttpResponse {
            HttpResponse::TooManyRequests()
                .json(json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}))
        }

        async fn route(req: HttpRequest, fake: web::Data<FakeGemini>) -> HttpResponse {
            let path = req.path();
            if let Some(model) = path.strip_suffix(":generateContent") {
                fake.generate_calls.fetch_add(1, Ordering::SeqCst);
                return (fake.answer)(model.trim_start_matches('/'));
            }
            if path != "/models" {
                return HttpResponse::NotFound().finish();
            }
            if !fake.paged {
                return HttpResponse::Ok().json(listing(&fake.models));
            }
            if req.query_string().contains("pageToken=next") {
                HttpResponse::Ok().json(listing(&fake.models[1..]))
            } else {
                let mut first = listing(&fake.models[..1]);
                first["nextPageToken"] = json!("next");
                HttpResponse::Ok().json(first)
            }
        }

        async fn serve(fake: FakeGemini) -> String {
            let data = web::Data::new(fake);
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(data.clone())
                    .default_service(web::to(route))
            })
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .unwrap();
            let addr = server.addrs()[0];
            actix_web::rt::spawn(server.run());
            format!("http://{}", addr)
        }

        fn resolver(base: &str) -> GeminiResolver {
            GeminiResolver::new(base).with_probe_delay(Duration::ZERO)
        }

        #[actix_web::test]
        async fn test_binds_first_verified_model_in_rank_order() {
            let fake = FakeGemini::new(
                vec!["models/gemini-pro", "models/gemini-1.5-flash", "models/gemini-2.5-flash"],
                |model| {
                    if model.contains("2.5-flash") {
                        HttpResponse::NotFound().json(json!({"error": {"status": "NOT_FOUND"}}))
                    } else {
                        reply("hello")
                    }
                },
            );
            let base = serve(fake.clone()).await;

            let handle = resolver(&base)
                .resolve(&Credential::new("key"), MODEL_PREFERENCES)
                .await
                .unwrap();
            assert_eq!(handle.model_name(), "models/gemini-1.5-flash");
            assert_eq!(fake.calls(), 2);
        }

        #[actix_web::test]
        async fn test_quota_refusal_stops_discovery() {
            let fake = FakeGemini::new(
                vec![
                    "models/gemini-2.5-flash",
                    "models/gemini-2.0-flash",
                    "models/gemini-1.5-flash",
                    "models/gemini-1.5-flash-8b",
                    "models/gemini-flash-latest",
                ],
                quota_exceeded,
            );
            let base = serve(fake.clone()).await;

            let err = resolver(&base)
                .resolve(&Credential::new("key"), MODEL_PREFERENCES)
                .await
                .err()
                .unwrap();
            assert_eq!(FailureKind::of(&err), FailureKind::RateLimited);
            assert_eq!(fake.calls(), 1);
        }

        #[actix_web::test]
        async fn test_discovery_gives_up_after_a_few_candidates() {
            let fake = FakeGemini::new(
                vec![
                    "models/gemini-2.5-flash",
                    "models/gemini-2.0-flash",
                    "models/gemini-1.5-flash",
                    "models/gemini-1.5-pro",
                    "models/gemini-flash-latest",
                ],
                |_| HttpResponse::InternalServerError().body("boom"),
            );
            let base = serve(fake.clone()).await;

            let err = resolver(&base)
                .resolve(&Credential::new("key"), MODEL_PREFERENCES)
                .await
                .err()
                .unwrap();
            assert!(matches!(err, WasteSortError::ConfigError(_)));
            assert_eq!(fake.calls(), MAX_PROBES);
        }

        #[actix_web::test]
        async fn test_listing_follows_page_token() {
            let mut fake = FakeGemini::new(
                vec!["models/gemini-pro", "models/gemini-2.0-flash"],
                |_| reply("hello"),
            );
            fake.paged = true;
            let base = serve(fake).await;

            let handle = resolver(&base)
                .resolve(&Credential::new("key"), MODEL_PREFERENCES)
                .await
                .unwrap();
            assert_eq!(handle.model_name(), "models/gemini-2.0-flash");
        }

        #[actix_web::test]
        async fn test_error_status_becomes_service_error() {
            let fake = FakeGemini::new(vec![], |_| {
                HttpResponse::ServiceUnavailable().body("overloaded")
            });
            let base = serve(fake).await;

            let model = GeminiModel::new(Client::new(), &base, "gemini-2.0-flash", &Credential::new("key"));
            let err = model.generate(&PromptPayload::text("hi")).await.unwrap_err();
            match err {
                WasteSortError::ServiceError { status, message } => {
                    assert_eq!(status, 503);
                    assert_eq!(message, "overloaded");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[actix_web::test]
        async fn test_blocked_prompt_is_response_error() {
            let fake = FakeGemini::new(vec![], |_| {
                HttpResponse::Ok().json(json!({"promptFeedback": {"blockReason": "SAFETY"}}))
            });
            let base = serve(fake).await;

            let model = GeminiModel::new(Client::new(), &base, "gemini-2.0-flash", &Credential::new("key"));
            let err = model.generate(&PromptPayload::text("hi")).await.unwrap_err();
            assert!(matches!(err, WasteSortError::ResponseError(ref m) if m.contains("blocked")));
        }

        #[actix_web::test]
        async fn test_safety_stop_without_text_is_response_error() {
            let fake = FakeGemini::new(vec![], |_| {
                HttpResponse::Ok().json(json!({"candidates": [{"finishReason": "SAFETY"}]}))
            });
            let base = serve(fake).await;

            let model = GeminiModel::new(Client::new(), &base, "gemini-2.0-flash", &Credential::new("key"));
            let err = model.generate(&PromptPayload::text("hi")).await.unwrap_err();
            assert!(matches!(err, WasteSortError::ResponseError(ref m) if m.contains("SAFETY")));
        }

        #[actix_web::test]
        async fn test_quota_exhausted_pool_makes_one_call_per_key() {
            let fake = FakeGemini::new(
                vec![
                    "models/gemini-2.5-flash",
                    "models/gemini-2.0-flash",
                    "models/gemini-1.5-flash",
                    "models/gemini-flash-latest",
                ],
                quota_exceeded,
            );
            let base = serve(fake.clone()).await;
            let pool = CredentialPool::new(
                vec![Credential::new("a"), Credential::new("b")],
                Arc::new(resolver(&base)),
            );

            for round in 1..=2 {
                let err = pool
                    .call_with_rotation(&PromptPayload::text("q"))
                    .await
                    .unwrap_err();
                assert_eq!(FailureKind::of(&err), FailureKind::RateLimited);
                assert_eq!(fake.calls(), 2 * round);
            }
        }
    }
}
