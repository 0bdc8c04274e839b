use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Body of `POST /api/generate`, shared by the proxy and the client.
///
/// Every field is optional on the wire; empty strings are treated the same
/// as missing values when the upstream payload is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Map<String, Value>>,
}

impl GenerateRequest {
    pub fn model_or_default(&self) -> &str {
        non_empty(self.model.as_deref()).unwrap_or(DEFAULT_MODEL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: Option<String>,
}

/// Structured error body returned by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![GeminiPart { text: text.into() }],
        }
    }
}

/// Request body sent to the `generateContent` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub system_instruction: GeminiContent,
    pub generation_config: Map<String, Value>,
}

impl GeminiRequest {
    pub fn from_generate_request(request: &GenerateRequest) -> Self {
        let user_query = request.user_query.clone().unwrap_or_default();

        let system_text = match non_empty(request.system_prompt.as_deref()) {
            Some(prompt) => prompt.to_string(),
            None => format!(
                "DOCUMENT:\n\n{}",
                request.extracted_text.as_deref().unwrap_or_default()
            ),
        };

        let generation_config = request
            .generation_config
            .clone()
            .unwrap_or_else(default_generation_config);

        Self {
            contents: vec![GeminiContent::text("user", user_query)],
            system_instruction: GeminiContent::text("system", system_text),
            generation_config,
        }
    }
}

pub fn default_generation_config() -> Map<String, Value> {
    let mut config = Map::new();
    config.insert("temperature".to_string(), json!(DEFAULT_TEMPERATURE));
    config
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
