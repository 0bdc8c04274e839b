use crate::config::{read_api_key, API_KEY_VAR};
use docuquery::GeminiService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gemini: Arc<GeminiService>,
    api_key_var: Arc<str>,
}

impl AppState {
    pub fn new(gemini: GeminiService) -> Self {
        Self {
            gemini: Arc::new(gemini),
            api_key_var: Arc::from(API_KEY_VAR),
        }
    }

    /// Reads the credential from a different environment variable.
    pub fn with_api_key_var(mut self, var: &str) -> Self {
        self.api_key_var = Arc::from(var);
        self
    }

    pub fn api_key_var(&self) -> &str {
        &self.api_key_var
    }

    /// Looked up on every call so a key set after startup is picked up.
    pub fn api_key(&self) -> Option<String> {
        read_api_key(&self.api_key_var)
    }
}
