use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{FileKind, PageNumber},
    protocol::{
        ChatRequest, ChatResponse, ExtractMode, TextResponse, UploadMeta, UploadResponse,
    },
};
use tokio::sync::oneshot;

use crate::{surface::UiSurface, types::PreviewImage, DocumentBackend, SelectedFile};

#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    pub labels: Vec<String>,
    pub highlight: Vec<bool>,
    pub pickers_opened: usize,
    pub previews: Vec<PreviewImage>,
    pub text: String,
    pub text_writes: Vec<String>,
    pub chat_frames: Vec<String>,
    pub notifications: Vec<String>,
}

#[derive(Default)]
pub struct RecordingSurface {
    log: Mutex<SurfaceLog>,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn log(&self) -> SurfaceLog {
        self.log.lock().expect("surface lock").clone()
    }

    /// Simulates the user typing into the text region.
    pub fn type_text(&self, text: &str) {
        self.log.lock().expect("surface lock").text = text.to_string();
    }
}

impl UiSurface for RecordingSurface {
    fn set_upload_label(&self, label: &str) {
        self.log
            .lock()
            .expect("surface lock")
            .labels
            .push(label.to_string());
    }

    fn set_drop_highlight(&self, active: bool) {
        self.log.lock().expect("surface lock").highlight.push(active);
    }

    fn open_file_picker(&self) {
        self.log.lock().expect("surface lock").pickers_opened += 1;
    }

    fn show_preview(&self, image: PreviewImage) {
        self.log.lock().expect("surface lock").previews.push(image);
    }

    fn set_extracted_text(&self, text: &str) {
        let mut log = self.log.lock().expect("surface lock");
        log.text = text.to_string();
        log.text_writes.push(text.to_string());
    }

    fn extracted_text(&self) -> String {
        self.log.lock().expect("surface lock").text.clone()
    }

    fn set_chat_output(&self, text: &str) {
        self.log
            .lock()
            .expect("surface lock")
            .chat_frames
            .push(text.to_string());
    }

    fn notify(&self, message: &str) {
        self.log
            .lock()
            .expect("surface lock")
            .notifications
            .push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Classify(String),
    Preview(u32),
    Extract { mode: ExtractMode, force_ocr: bool },
    Ocr(String),
    Chat(ChatRequest),
}

type Gated<T> = (Option<oneshot::Receiver<()>>, T);

pub struct MockBackend {
    calls: Mutex<Vec<BackendCall>>,
    upload: Mutex<VecDeque<Gated<UploadResponse>>>,
    preview: Option<Vec<u8>>,
    preview_queue: Mutex<VecDeque<Gated<Vec<u8>>>>,
    extract: Mutex<VecDeque<Gated<TextResponse>>>,
    ocr: TextResponse,
    chat: Mutex<VecDeque<Gated<ChatResponse>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            upload: Mutex::new(VecDeque::new()),
            preview: Some(b"\x89PNG-page".to_vec()),
            preview_queue: Mutex::new(VecDeque::new()),
            extract: Mutex::new(VecDeque::new()),
            ocr: TextResponse::default(),
            chat: Mutex::new(VecDeque::new()),
        }
    }
}

impl MockBackend {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn with_upload(self, response: UploadResponse) -> Self {
        self.queue_upload(None, response);
        self
    }

    pub fn with_failing_preview(mut self) -> Self {
        self.preview = None;
        self
    }

    pub fn with_extract(self, text: &str) -> Self {
        self.queue_extract(None, text_response(text));
        self
    }

    pub fn with_ocr(mut self, response: TextResponse) -> Self {
        self.ocr = response;
        self
    }

    pub fn with_chat(self, answer: &str) -> Self {
        self.queue_chat(None, chat_response(answer));
        self
    }

    pub fn queue_upload(&self, gate: Option<oneshot::Receiver<()>>, response: UploadResponse) {
        self.upload
            .lock()
            .expect("upload lock")
            .push_back((gate, response));
    }

    /// Queued previews are served before the fixed one.
    pub fn queue_preview(&self, gate: Option<oneshot::Receiver<()>>, png: &[u8]) {
        self.preview_queue
            .lock()
            .expect("preview lock")
            .push_back((gate, png.to_vec()));
    }

    pub fn queue_extract(&self, gate: Option<oneshot::Receiver<()>>, response: TextResponse) {
        self.extract
            .lock()
            .expect("extract lock")
            .push_back((gate, response));
    }

    pub fn queue_chat(&self, gate: Option<oneshot::Receiver<()>>, response: ChatResponse) {
        self.chat
            .lock()
            .expect("chat lock")
            .push_back((gate, response));
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    async fn take<T: Default>(queue: &Mutex<VecDeque<Gated<T>>>) -> T {
        let next = queue.lock().expect("queue lock").pop_front();
        let Some((gate, value)) = next else {
            return T::default();
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        value
    }
}

#[async_trait]
impl DocumentBackend for MockBackend {
    async fn classify(&self, file: &SelectedFile) -> Result<UploadResponse> {
        self.record(BackendCall::Classify(file.name().to_string()));
        Ok(Self::take(&self.upload).await)
    }

    async fn preview_pdf_page(&self, _file: &SelectedFile, page: PageNumber) -> Result<Vec<u8>> {
        self.record(BackendCall::Preview(page.get()));
        let queued = self.preview_queue.lock().expect("preview lock").pop_front();
        if let Some((gate, png)) = queued {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            return Ok(png);
        }
        self.preview
            .clone()
            .ok_or_else(|| anyhow!("backend returned status 500"))
    }

    async fn extract_pdf(
        &self,
        _file: &SelectedFile,
        mode: &ExtractMode,
        force_ocr: bool,
    ) -> Result<TextResponse> {
        self.record(BackendCall::Extract {
            mode: mode.clone(),
            force_ocr,
        });
        Ok(Self::take(&self.extract).await)
    }

    async fn ocr_image(&self, file: &SelectedFile) -> Result<TextResponse> {
        self.record(BackendCall::Ocr(file.name().to_string()));
        Ok(self.ocr.clone())
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.record(BackendCall::Chat(request.clone()));
        Ok(Self::take(&self.chat).await)
    }
}

pub fn upload_response(kind: FileKind, extracted: Option<&str>) -> UploadResponse {
    UploadResponse {
        meta: Some(UploadMeta {
            kind,
            ..UploadMeta::default()
        }),
        extracted: extracted.map(str::to_string),
        ..UploadResponse::default()
    }
}

pub fn text_response(text: &str) -> TextResponse {
    TextResponse {
        text: Some(text.to_string()),
        error: None,
    }
}

pub fn chat_response(answer: &str) -> ChatResponse {
    ChatResponse {
        answer: Some(answer.to_string()),
    }
}

pub fn sample_pdf() -> SelectedFile {
    SelectedFile::new("report.pdf", b"%PDF-1.7 sample".to_vec())
}

pub fn sample_image() -> SelectedFile {
    SelectedFile::new("scan.png", b"\x89PNG sample".to_vec())
}
