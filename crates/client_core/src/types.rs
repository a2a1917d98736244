use std::{fmt, sync::Arc};

use shared::{
    domain::{OutputRegion, PageNumber},
    protocol::ExtractMode,
};

/// The one file the session works on. Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Arc<Vec<u8>>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// True when both values refer to the same in-memory blob, not just equal bytes.
    pub fn same_blob(&self, other: &SelectedFile) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

/// Image shown in the preview region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewImage {
    /// Local reference to the selected file; no server round trip.
    SelectedFile(SelectedFile),
    RenderedPage { page: PageNumber, png: Vec<u8> },
}

/// Session state owned by the controller.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub selected: Option<SelectedFile>,
    pub force_ocr: bool,
    /// Page count the backend reported when it classified the file as a PDF.
    pub page_count: Option<u32>,
}

/// Input events coming from the user interface.
#[derive(Debug, Clone)]
pub enum UserAction {
    DragOver,
    DragLeave,
    DropZoneClicked,
    Dropped(Vec<SelectedFile>),
    FilesPicked(Vec<SelectedFile>),
    ForceOcrToggled(bool),
    PreviewRequested(PageNumber),
    ExtractRequested(ExtractMode),
    OcrRequested,
    ChatSubmitted(String),
}

impl UserAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DragOver => "drag_over",
            Self::DragLeave => "drag_leave",
            Self::DropZoneClicked => "drop_zone_clicked",
            Self::Dropped(_) => "dropped",
            Self::FilesPicked(_) => "files_picked",
            Self::ForceOcrToggled(_) => "force_ocr_toggled",
            Self::PreviewRequested(_) => "preview_requested",
            Self::ExtractRequested(_) => "extract_requested",
            Self::OcrRequested => "ocr_requested",
            Self::ChatSubmitted(_) => "chat_submitted",
        }
    }
}

/// Blocking notifications shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    NoFileSelected,
    EmptyQuestion,
    MissingDocumentText,
    PreviewFailed,
    /// Error text reported by the backend, shown verbatim.
    Server(String),
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFileSelected => f.write_str("Upload a file first"),
            Self::EmptyQuestion => f.write_str("Enter a question"),
            Self::MissingDocumentText => f.write_str("Extract text first"),
            Self::PreviewFailed => f.write_str("Preview failed"),
            Self::Server(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The response was written to the interface.
    Applied,
    /// A precondition failed; the user was prompted and nothing was sent.
    Prompted(Prompt),
    /// The request went out and the failure was shown to the user.
    Failed(Prompt),
    /// Nothing visible happened.
    Ignored,
    /// A newer request owns the region; this response was dropped.
    Discarded(OutputRegion),
}
