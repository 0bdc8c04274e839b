pub mod models;
pub mod response_normalizer;
pub mod retry_fetcher;
pub mod gemini_service;
pub mod document_processor;
pub mod query_client;
pub mod chat_session;

pub use models::*;
pub use response_normalizer::{normalize, NormalizedAnswer, ResponseShape, NO_READABLE_TEXT};
pub use retry_fetcher::{FetchError, RetryPolicy, RetryingFetcher};
pub use gemini_service::{GeminiService, UpstreamError, UpstreamReply};
pub use document_processor::{DocumentProcessor, ExtractedDocument, ExtractionError, UploadedFile};
pub use query_client::{QueryClient, QueryResult};
pub use chat_session::{AskOutcome, ChatSession};
