use regex::Regex;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

pub const ACCEPTED_EXTENSIONS: [&str; 4] = [".pdf", ".docx", ".txt", ".pptx"];

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Pdf => write!(f, "PDF"),
            FileType::Docx => write!(f, "DOCX"),
            FileType::Txt => write!(f, "TXT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PPTX files are currently not supported for extraction. Please use PDF, DOCX, or TXT.")]
    PresentationUnsupported,
    #[error("Unsupported file type: {0}. Please use PDF, DOCX, or TXT.")]
    UnsupportedType(String),
    #[error("Extraction failed: No readable text found in {0}.")]
    Empty(FileType),
    #[error("An error occurred during extraction: {0}")]
    Failed(String),
}

/// A file as handed over by the user: name, declared MIME type and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing the MIME type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_for_name(&name).to_string();
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0 / 1024.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub file_type: FileType,
    pub text: String,
}

pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_str() {
        ".pdf" => PDF_MIME,
        ".docx" => DOCX_MIME,
        ".pptx" => PPTX_MIME,
        ".txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Lowercased extension including the dot, or an empty string.
pub fn extension_of(name: &str) -> String {
    name.rfind('.')
        .map(|idx| name[idx..].to_lowercase())
        .unwrap_or_default()
}

/// File-picker filter: rejects anything outside [`ACCEPTED_EXTENSIONS`].
pub fn check_accepted(name: &str) -> Result<(), ExtractionError> {
    let extension = extension_of(name);
    if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ExtractionError::UnsupportedType(extension))
    }
}

fn is_presentation(file: &UploadedFile) -> bool {
    file.name.ends_with(".pptx") || file.mime_type.contains("officedocument.presentationml")
}

pub fn detect_file_type(file: &UploadedFile) -> Result<FileType, ExtractionError> {
    if is_presentation(file) {
        return Err(ExtractionError::PresentationUnsupported);
    }

    let mime = file.mime_type.as_str();
    if mime == PDF_MIME {
        Ok(FileType::Pdf)
    } else if mime.contains("officedocument.wordprocessingml") || file.name.ends_with(".docx") {
        Ok(FileType::Docx)
    } else if mime.starts_with("text/") || file.name.ends_with(".txt") {
        Ok(FileType::Txt)
    } else {
        Err(ExtractionError::UnsupportedType(mime.to_string()))
    }
}

pub struct DocumentProcessor;

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(&self, file: UploadedFile) -> Result<ExtractedDocument, ExtractionError> {
        let file_type = detect_file_type(&file)?;

        log::info!(
            "Processing file: {} ({:.2} MB) as {}",
            file.name,
            file.size_mb(),
            file_type
        );

        let UploadedFile { name, bytes, .. } = file;

        let text = match file_type {
            FileType::Txt => String::from_utf8_lossy(&bytes).into_owned(),
            FileType::Pdf | FileType::Docx => {
                // pdf-extract can panic on malformed input; a failed join is an extraction error.
                tokio::task::spawn_blocking(move || match file_type {
                    FileType::Pdf => extract_pdf_text(&bytes),
                    _ => extract_docx_text(&bytes),
                })
                .await
                .map_err(|e| ExtractionError::Failed(e.to_string()))??
            }
        };

        if text.trim().is_empty() {
            log::warn!("No readable text found in {}", name);
            return Err(ExtractionError::Empty(file_type));
        }

        log::info!("Extracted {} characters from {}", text.chars().count(), name);

        Ok(ExtractedDocument {
            file_name: name,
            file_type,
            text,
        })
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pages are separated by blank lines.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;

    let pages: Vec<&str> = pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect();

    Ok(pages.join("\n\n"))
}

/// Raw text of `word/document.xml`, one paragraph per block.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Failed(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;

    let re_paragraph = Regex::new(r"(?s)<w:p[ >].*?</w:p>")
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;
    let re_run = Regex::new(
        r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:br\b[^>]*/>|<w:cr\s*/>",
    )
    .map_err(|e| ExtractionError::Failed(e.to_string()))?;
    let re_entity = Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]+|#x[0-9A-Fa-f]+);")
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;

    let paragraphs: Vec<String> = re_paragraph
        .find_iter(&xml)
        .map(|paragraph| {
            re_run
                .captures_iter(paragraph.as_str())
                .map(|cap| match cap.get(1) {
                    Some(text) => decode_xml_entities(&re_entity, text.as_str()),
                    None if cap[0].starts_with("<w:tab") => "\t".to_string(),
                    None => "\n".to_string(),
                })
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n\n").trim().to_string())
}

/// Single pass, so `&amp;lt;` stays `&lt;`.
fn decode_xml_entities(re_entity: &Regex, text: &str) -> String {
    re_entity
        .replace_all(text, |cap: &regex::Captures| {
            let entity = &cap[1];
            match entity {
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                "amp" => "&".to_string(),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| cap[0].to_string())
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// One Courier `Tj` per page.
    fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = pages
            .iter()
            .map(|text| {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 24.into()]),
                        Operation::new("Td", vec![100.into(), 600.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn dispatches_by_mime_then_extension() {
        let pdf = UploadedFile::new("a.bin", PDF_MIME, vec![]);
        assert_eq!(detect_file_type(&pdf).unwrap(), FileType::Pdf);

        let docx = UploadedFile::new("report.docx", "application/octet-stream", vec![]);
        assert_eq!(detect_file_type(&docx).unwrap(), FileType::Docx);

        let markdown = UploadedFile::new("notes.md", "text/markdown", vec![]);
        assert_eq!(detect_file_type(&markdown).unwrap(), FileType::Txt);

        let txt = UploadedFile::new("notes.txt", "", vec![]);
        assert_eq!(detect_file_type(&txt).unwrap(), FileType::Txt);
    }

    #[test]
    fn presentations_are_rejected_with_explicit_message() {
        let by_name = UploadedFile::new("deck.pptx", "", vec![]);
        let by_mime = UploadedFile::new("deck", PPTX_MIME, vec![]);

        for file in [by_name, by_mime] {
            let err = detect_file_type(&file).unwrap_err();
            assert!(matches!(err, ExtractionError::PresentationUnsupported));
            assert_eq!(
                err.to_string(),
                "PPTX files are currently not supported for extraction. Please use PDF, DOCX, or TXT."
            );
        }
    }

    #[test]
    fn unknown_mime_is_unsupported() {
        let image = UploadedFile::new("photo.png", "image/png", vec![1, 2, 3]);
        let err = detect_file_type(&image).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type: image/png. Please use PDF, DOCX, or TXT."
        );
    }

    #[test]
    fn accepted_extension_filter_is_case_insensitive() {
        assert!(check_accepted("Report.PDF").is_ok());
        assert!(check_accepted("slides.pptx").is_ok());
        let err = check_accepted("archive.zip").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type: .zip. Please use PDF, DOCX, or TXT."
        );
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(mime_for_name("a.pdf"), PDF_MIME);
        assert_eq!(mime_for_name("a.DOCX"), DOCX_MIME);
        assert_eq!(mime_for_name("a.txt"), "text/plain");
        assert_eq!(mime_for_name("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn extracts_plain_text() {
        let file = UploadedFile::new("notes.txt", "text/plain", b"X is a variable.".to_vec());
        let doc = DocumentProcessor::new().extract(file).await.unwrap();

        assert_eq!(doc.file_type, FileType::Txt);
        assert_eq!(doc.file_name, "notes.txt");
        assert_eq!(doc.text, "X is a variable.");
    }

    #[tokio::test]
    async fn whitespace_only_text_is_an_extraction_failure() {
        let file = UploadedFile::new("blank.txt", "text/plain", b"  \n\t \n".to_vec());
        let err = DocumentProcessor::new().extract(file).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Empty(FileType::Txt)));
        assert_eq!(err.to_string(), "Extraction failed: No readable text found in TXT.");
    }

    #[tokio::test]
    async fn extracts_docx_paragraphs() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body><w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world &amp; more</w:t></w:r></w:p><w:p><w:r><w:t>Second</w:t></w:r></w:p></w:body></w:document>"#;
        let file = UploadedFile::new("doc.docx", DOCX_MIME, docx_bytes(xml));

        let doc = DocumentProcessor::new().extract(file).await.unwrap();

        assert_eq!(doc.file_type, FileType::Docx);
        assert_eq!(doc.text, "Hello world & more\n\nSecond");
    }

    #[test]
    fn docx_breaks_and_character_references_survive() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>It&#8217;s</w:t><w:br w:type="page"/><w:t>next</w:t><w:cr/><w:t>line&#x21;</w:t><w:tab/><w:t>&amp;lt;kept&amp;gt;</w:t></w:r></w:p></w:body></w:document>"#;

        let text = extract_docx_text(&docx_bytes(xml)).unwrap();

        assert_eq!(text, "It\u{2019}s\nnext\nline!\t&lt;kept&gt;");
    }

    #[test]
    fn pdf_pages_are_joined_with_blank_lines() {
        let text = extract_pdf_text(&pdf_bytes(&["PageOne", "PageTwo"])).unwrap();

        assert!(text.contains("PageOne\n\nPageTwo"), "got {text:?}");
    }

    #[tokio::test]
    async fn extracts_pdf_document() {
        let file = UploadedFile::new("two.pdf", PDF_MIME, pdf_bytes(&["Alpha", "Beta"]));

        let doc = DocumentProcessor::new().extract(file).await.unwrap();

        assert_eq!(doc.file_type, FileType::Pdf);
        assert_eq!(doc.text, "Alpha\n\nBeta");
    }

    #[tokio::test]
    async fn docx_without_text_is_empty() {
        let xml = r#"<w:document><w:body><w:p></w:p></w:body></w:document>"#;
        let file = UploadedFile::new("empty.docx", DOCX_MIME, docx_bytes(xml));

        let err = DocumentProcessor::new().extract(file).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Empty(FileType::Docx)));
    }

    #[tokio::test]
    async fn corrupt_docx_reports_failure() {
        let file = UploadedFile::new("bad.docx", DOCX_MIME, b"not a zip".to_vec());
        let err = DocumentProcessor::new().extract(file).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
    }

    #[tokio::test]
    async fn corrupt_pdf_reports_failure() {
        let file = UploadedFile::new("bad.pdf", PDF_MIME, b"not a pdf".to_vec());
        let err = DocumentProcessor::new().extract(file).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
    }
}
