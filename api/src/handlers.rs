use crate::api_error::ApiError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use docuquery::{GenerateRequest, GenerateResponse, UpstreamReply};
use serde_json::json;
use uuid::Uuid;

pub async fn root() -> &'static str {
    "DocuQuery backend is running. Use POST /api/generate"
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn generate_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not Found", None)
}

/// Only `application/json` bodies (parameters allowed) are parsed.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let Some(api_key) = state.api_key() else {
        log::error!("[{}] {} is not set", request_id, state.api_key_var());
        return ApiError::misconfigured(state.api_key_var()).into_response();
    };

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            log::warn!("[{}] Rejected body: {}", request_id, rejection.body_text());
            return ApiError::new(
                status,
                status.canonical_reason().unwrap_or("Bad Request"),
                Some(rejection.body_text()),
            )
            .into_response();
        }
    };

    // Empty or non-JSON bodies are treated as `{}`.
    let request: GenerateRequest = if body.is_empty() || !is_json(&headers) {
        GenerateRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(err) => {
                log::warn!("[{}] Rejected malformed body: {}", request_id, err);
                return ApiError::bad_request(err.to_string()).into_response();
            }
        }
    };

    log::info!(
        "[{}] POST /api/generate model={}",
        request_id,
        request.model_or_default()
    );

    match state.gemini.generate(&api_key, &request).await {
        Ok(UpstreamReply::Answer(answer)) => Json(GenerateResponse {
            text: Some(answer.into_text()),
        })
        .into_response(),
        Ok(UpstreamReply::Rejected {
            status,
            content_type,
            body,
        }) => {
            log::warn!("[{}] Upstream responded with {}", request_id, status);
            passthrough(status.as_u16(), content_type, body)
        }
        Err(err) => {
            log::error!("[{}] Proxy error: {}", request_id, err);
            ApiError::internal(err.to_string()).into_response()
        }
    }
}

/// Forwards an upstream error unchanged, keeping its content type when valid.
fn passthrough(status: u16, content_type: Option<String>, body: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, body).into_response();

    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }

    response
}
