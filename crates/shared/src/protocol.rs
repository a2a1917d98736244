use serde::{Deserialize, Serialize};

use crate::domain::{FileKind, PageNumber};

pub const UPLOAD_PATH: &str = "/upload";
pub const PREVIEW_PDF_PAGE_PATH: &str = "/preview_pdf_page";
pub const EXTRACT_PDF_PATH: &str = "/extract_pdf";
pub const OCR_PATH: &str = "/ocr";
pub const CHAT_PATH: &str = "/chat";

/// Multipart field names shared by the form endpoints.
pub mod fields {
    pub const FILE: &str = "file";
    pub const PAGE: &str = "page";
    pub const RANGE: &str = "range";
    pub const OCR: &str = "ocr";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadMeta {
    #[serde(rename = "type", default)]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

/// Body of `/upload`. Errors come back in the same shape with only `error` set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<UploadMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn kind(&self) -> Option<&FileKind> {
        self.meta.as_ref().map(|meta| &meta.kind)
    }

    pub fn extracted_or_empty(&self) -> &str {
        self.extracted.as_deref().unwrap_or_default()
    }
}

/// Body of `/extract_pdf` and `/ocr`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TextResponse {
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub doc_text: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ChatResponse {
    pub fn answer_or_empty(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }
}

/// Which part of a PDF `/extract_pdf` should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractMode {
    Full,
    Page(PageNumber),
    /// Free-form range string such as `"1-3"`; validated by the backend.
    Range(String),
}

impl ExtractMode {
    /// Form fields besides `file`. `page` and `range` are mutually exclusive.
    pub fn form_fields(&self, force_ocr: bool) -> Vec<(&'static str, String)> {
        let mut out = Vec::with_capacity(2);
        match self {
            Self::Full => {}
            Self::Page(page) => out.push((fields::PAGE, page.to_string())),
            Self::Range(range) => out.push((fields::RANGE, range.clone())),
        }
        out.push((fields::OCR, force_ocr.to_string()));
        out
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Page(_) => "page",
            Self::Range(_) => "range",
        }
    }
}
