use crate::models::*;
use crate::response_normalizer::{normalize, NormalizedAnswer};
use reqwest::{header, Client, StatusCode};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Outcome of a single `generateContent` call that reached the upstream service.
#[derive(Debug)]
pub enum UpstreamReply {
    Answer(NormalizedAnswer),
    /// Non-2xx reply, kept byte-for-byte so it can be forwarded.
    Rejected {
        status: StatusCode,
        content_type: Option<String>,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub struct GeminiService {
    client: Client,
    api_base: String,
}

impl GeminiService {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }

    /// Makes exactly one upstream attempt; retrying is left to the caller.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerateRequest,
    ) -> Result<UpstreamReply, UpstreamError> {
        let payload = GeminiRequest::from_generate_request(request);
        let url = self.endpoint(request.model_or_default());

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = response.text().await?;

        if !status.is_success() {
            return Ok(UpstreamReply::Rejected {
                status,
                content_type,
                body: raw,
            });
        }

        let json: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(UpstreamReply::Answer(normalize(&json)))
    }
}
