use super::AppState;
use crate::models::ChatRequest;
use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde_json::json;
use uuid::Uuid;

const UPLOAD_FIELD: &str = "image";
/// Largest image accepted on `/detect`.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

enum UploadError {
    Multipart(MultipartError),
    TooLarge,
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err)
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn bad_request(detail: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "detail": detail.to_string() }))
}

/// Bytes of the `image` field, or of the first field that carries a file name.
async fn read_upload(payload: &mut Multipart) -> Result<Option<Vec<u8>>, UploadError> {
    while let Some(field) = payload.next().await {
        let mut field = field?;
        let is_upload = {
            let disposition = field.content_disposition();
            disposition.get_name() == Some(UPLOAD_FIELD) || disposition.get_filename().is_some()
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if is_upload {
                if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                    return Err(UploadError::TooLarge);
                }
                data.extend_from_slice(&chunk);
            }
        }
        if is_upload {
            return Ok(Some(data));
        }
    }
    Ok(None)
}

pub async fn detect(state: web::Data<AppState>, mut payload: Multipart) -> HttpResponse {
    let request_id = Uuid::new_v4();

    let bytes = match read_upload(&mut payload).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::warn!("[req:{}] /detect without an image field", request_id);
            return bad_request("an image file is required");
        }
        Err(UploadError::TooLarge) => {
            log::warn!("[req:{}] upload exceeds {} bytes", request_id, MAX_UPLOAD_BYTES);
            return HttpResponse::PayloadTooLarge().json(json!({
                "detail": format!("image exceeds {} bytes", MAX_UPLOAD_BYTES)
            }));
        }
        Err(UploadError::Multipart(e)) => {
            log::warn!("[req:{}] malformed multipart body: {}", request_id, e);
            return bad_request(e);
        }
    };

    log::info!("📥 [req:{}] detection request, {} bytes", request_id, bytes.len());
    let response = state.orchestrator.detect_bytes(&bytes).await;
    log::info!("[req:{}] returning {} item(s)", request_id, response.len());
    HttpResponse::Ok().json(response)
}

pub async fn chat(state: web::Data<AppState>, request: web::Json<ChatRequest>) -> HttpResponse {
    let request_id = Uuid::new_v4();
    log::info!("💬 [req:{}] chat query, {} chars", request_id, request.query.chars().count());
    log::debug!("[req:{}] query text: {}", request_id, request.query);

    let turn = state.orchestrator.chat(&request.query).await;
    HttpResponse::Ok().json(turn)
}

#[cfg(test)]
mod tests {
    use super::super::{configure, AppState};
    use super::MAX_UPLOAD_BYTES;
    use crate::orchestrator::{Orchestrator, OFFLINE_MESSAGE};
    use actix_web::{http::header, http::StatusCode, test, web, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    const BOUNDARY: &str = "wastesort-test-boundary";

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(Arc::new(Orchestrator::new(None, None))))
    }

    fn multipart_body(name: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
        let disposition = match filename {
            Some(f) => format!("form-data; name=\"{}\"; filename=\"{}\"", name, f),
            None => format!("form-data; name=\"{}\"", name),
        };
        let mut body = format!(
            "--{b}\r\nContent-Disposition: {d}\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
            d = disposition
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn detect_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/detect")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[actix_web::test]
    async fn test_chat_offline() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"query": "Where does glass go?"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["response"], OFFLINE_MESSAGE);
        assert_eq!(body["binSuggestion"], "Landfill");
    }

    #[actix_web::test]
    async fn test_chat_without_query_is_rejected() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/chat")
            .set_json(json!({"question": "?"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_unreadable_image_is_empty_not_an_error() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = detect_request(multipart_body("image", Some("photo.jpg"), b"not really a jpeg")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"items": []}));
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let image = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let req = detect_request(multipart_body("image", Some("huge.jpg"), &image)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn test_detect_without_file_is_rejected() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = detect_request(multipart_body("note", None, b"hello")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
