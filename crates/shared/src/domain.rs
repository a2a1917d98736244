use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a request in its region's issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// 1-based page index as the backend expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageNumber(u32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    /// Returns `None` for 0; pages are 1-based.
    pub fn new(page: u32) -> Option<Self> {
        (page >= 1).then_some(Self(page))
    }

    /// Blank input falls back to the first page, like an empty page field.
    pub fn parse_or_first(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(Self::FIRST);
        }
        raw.parse::<u32>().ok().and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend classification of an uploaded file (`meta.type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileKind {
    Image,
    Text,
    Pdf,
    Unknown(String),
}

impl Default for FileKind {
    fn default() -> Self {
        FileKind::Unknown(String::new())
    }
}

impl From<String> for FileKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => Self::Image,
            "text" => Self::Text,
            "pdf" => Self::Pdf,
            _ => Self::Unknown(value),
        }
    }
}

impl From<FileKind> for String {
    fn from(value: FileKind) -> Self {
        match value {
            FileKind::Image => "image".to_string(),
            FileKind::Text => "text".to_string(),
            FileKind::Pdf => "pdf".to_string(),
            FileKind::Unknown(other) => other,
        }
    }
}

/// Output regions of the interface that responses write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputRegion {
    Text,
    Preview,
    Chat,
}
