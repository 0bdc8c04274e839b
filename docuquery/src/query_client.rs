use crate::models::{ErrorResponse, GenerateRequest};
use crate::retry_fetcher::{FetchError, RetryingFetcher};
use serde_json::Value;

pub const NOT_IN_DOCUMENT: &str = "I cannot find that information in the document.";
pub const EMPTY_RESPONSE: &str = "Sorry, I received an empty response from the AI.";

/// Result of asking the proxy a question.
///
/// Failures are kept as a variant so callers can tell them apart from
/// answers; only [`QueryResult::into_display_text`] turns them into chat text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Answered(String),
    Failed(String),
}

impl QueryResult {
    pub fn into_display_text(self) -> String {
        match self {
            QueryResult::Answered(text) => text,
            QueryResult::Failed(message) => {
                format!("An error occurred while communicating with the AI: {}", message)
            }
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, QueryResult::Answered(_))
    }
}

pub fn build_grounding_prompt(document_text: &str) -> String {
    format!(
        r#"You are an expert Q&A system. Your sole source of information is the document provided. You MUST only answer the user's question using the text found in the document provided within the triple backticks. Do not use any external knowledge.

If the answer is not available in the provided text, you MUST respond with the exact phrase: "{NOT_IN_DOCUMENT}"

DOCUMENT:
```
{document_text}
```"#
    )
}

pub struct QueryClient {
    fetcher: RetryingFetcher,
    endpoint: String,
    model: String,
}

impl QueryClient {
    pub fn new(fetcher: RetryingFetcher, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub async fn ask(&self, document_text: &str, question: &str) -> QueryResult {
        let request = GenerateRequest {
            user_query: Some(question.to_string()),
            system_prompt: Some(build_grounding_prompt(document_text)),
            extracted_text: Some(document_text.to_string()),
            model: Some(self.model.clone()),
            generation_config: None,
        };

        match self.send(&request).await {
            Ok(result) => result,
            Err(err) => {
                log::error!("Proxy call failed: {}", err);
                QueryResult::Failed(err.to_string())
            }
        }
    }

    async fn send(&self, request: &GenerateRequest) -> Result<QueryResult, FetchError> {
        let response = self.fetcher.post_json(&self.endpoint, request).await?;
        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            return Ok(QueryResult::Failed(error_message(status.as_u16(), &raw)));
        }

        let body: Value = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(err) => return Ok(QueryResult::Failed(err.to_string())),
        };

        let text = body
            .get("text")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .unwrap_or(EMPTY_RESPONSE);

        Ok(QueryResult::Answered(text.to_string()))
    }
}

/// The proxy answers errors as its own `{error, message}`, as a forwarded
/// Gemini `{error: {message}}`, or as an opaque upstream body.
fn error_message(status: u16, raw: &str) -> String {
    if let Ok(ErrorResponse { error, message }) = serde_json::from_str::<ErrorResponse>(raw) {
        return match message {
            Some(message) => format!("{}: {}", error, message),
            None => error,
        };
    }

    if let Some(message) = serde_json::from_str::<Value>(raw)
        .ok()
        .as_ref()
        .and_then(|body| body.get("error")?.get("message")?.as_str())
    {
        return message.to_string();
    }

    let raw = raw.trim();
    if raw.is_empty() {
        format!("proxy returned status {}", status)
    } else {
        raw.to_string()
    }
}
