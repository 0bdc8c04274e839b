use serde_json::Value;

pub const NO_READABLE_TEXT: &str = "I'm sorry — the model returned no readable text.";

/// Which known response layout produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `candidates[0].content.parts[0].text`
    ContentParts,
    /// `candidates[0].content[0].text`
    ContentList,
    /// `candidates[0].output`
    CandidateOutput,
    /// top-level `text`
    TopLevelText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedAnswer {
    Found { shape: ResponseShape, text: String },
    NoReadableText,
}

impl NormalizedAnswer {
    pub fn into_text(self) -> String {
        match self {
            NormalizedAnswer::Found { text, .. } => text,
            NormalizedAnswer::NoReadableText => NO_READABLE_TEXT.to_string(),
        }
    }
}

type ShapeExtractor = fn(&Value) -> Option<&str>;

// Tried in order; the first non-empty string wins.
const EXTRACTORS: [(ResponseShape, ShapeExtractor); 4] = [
    (ResponseShape::ContentParts, content_parts),
    (ResponseShape::ContentList, content_list),
    (ResponseShape::CandidateOutput, candidate_output),
    (ResponseShape::TopLevelText, top_level_text),
];

pub fn normalize(payload: &Value) -> NormalizedAnswer {
    EXTRACTORS
        .iter()
        .find_map(|(shape, extract)| {
            extract(payload)
                .filter(|text| !text.is_empty())
                .map(|text| NormalizedAnswer::Found {
                    shape: *shape,
                    text: text.to_string(),
                })
        })
        .unwrap_or(NormalizedAnswer::NoReadableText)
}

/// Convenience wrapper returning the answer or the sentinel.
pub fn extract_answer(payload: &Value) -> String {
    normalize(payload).into_text()
}

fn first_candidate(payload: &Value) -> Option<&Value> {
    payload.get("candidates")?.get(0)
}

fn content_parts(payload: &Value) -> Option<&str> {
    first_candidate(payload)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

fn content_list(payload: &Value) -> Option<&str> {
    first_candidate(payload)?
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()
}

fn candidate_output(payload: &Value) -> Option<&str> {
    first_candidate(payload)?.get("output")?.as_str()
}

fn top_level_text(payload: &Value) -> Option<&str> {
    payload.get("text")?.as_str()
}
