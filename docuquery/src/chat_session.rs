use crate::document_processor::{DocumentProcessor, ExtractedDocument, ExtractionError, UploadedFile};
use crate::query_client::{QueryClient, QueryResult};

pub const AWAITING_UPLOAD: &str = "Awaiting file upload (PDF, DOCX, TXT, or PPTX).";
pub const DOCUMENT_REQUIRED: &str = "Please extract text from a document first!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Blank question; nothing happened.
    Ignored,
    /// No document loaded; the status line asks for one.
    NoDocument,
    Replied(QueryResult),
}

/// State of one user's Q&A session: the current document, the transcript and
/// the status line. Taking `&mut self` in [`ChatSession::ask`] keeps at most one
/// question in flight per session.
#[derive(Debug)]
pub struct ChatSession {
    document: Option<ExtractedDocument>,
    transcript: Vec<ChatMessage>,
    status: StatusMessage,
    chat_enabled: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            document: None,
            transcript: Vec::new(),
            status: StatusMessage::new(StatusKind::Warning, AWAITING_UPLOAD),
            chat_enabled: false,
        }
    }

    pub fn document(&self) -> Option<&ExtractedDocument> {
        self.document.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn chat_enabled(&self) -> bool {
        self.chat_enabled
    }

    /// Extracts `file` into the document slot.
    ///
    /// A presentation is refused before extraction and leaves the current
    /// document in place; any other failure clears it and disables chat.
    pub async fn load_file(
        &mut self,
        processor: &DocumentProcessor,
        file: UploadedFile,
    ) -> Result<&ExtractedDocument, ExtractionError> {
        match processor.extract(file).await {
            Ok(document) => {
                self.status = StatusMessage::new(
                    StatusKind::Success,
                    format!(
                        "Successfully extracted text from {}. Ready for Q&A!",
                        document.file_type
                    ),
                );
                self.chat_enabled = true;
                Ok(self.document.insert(document))
            }
            Err(err @ ExtractionError::PresentationUnsupported) => {
                self.status = StatusMessage::new(StatusKind::Error, err.to_string());
                Err(err)
            }
            Err(err) => {
                log::error!("Extraction Error: {}", err);
                self.document = None;
                self.chat_enabled = false;
                self.status = StatusMessage::new(StatusKind::Error, err.to_string());
                Err(err)
            }
        }
    }

    /// Drops the current document and transcript, back to the upload state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub async fn ask(&mut self, client: &QueryClient, question: &str) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            return AskOutcome::Ignored;
        }

        let Some(document) = self.document.as_ref() else {
            self.status = StatusMessage::new(StatusKind::Warning, DOCUMENT_REQUIRED);
            return AskOutcome::NoDocument;
        };

        self.transcript.push(ChatMessage {
            role: Role::User,
            text: question.to_string(),
        });
        self.chat_enabled = false;

        let result = client.ask(&document.text, question).await;

        self.chat_enabled = true;
        self.transcript.push(ChatMessage {
            role: Role::Assistant,
            text: result.clone().into_display_text(),
        });

        AskOutcome::Replied(result)
    }
}
