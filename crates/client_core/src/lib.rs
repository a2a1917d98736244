use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::PageNumber,
    error::BackendError,
    protocol::{
        fields, ChatRequest, ChatResponse, ExtractMode, TextResponse, UploadResponse, CHAT_PATH,
        EXTRACT_PDF_PATH, OCR_PATH, PREVIEW_PDF_PAGE_PATH, UPLOAD_PATH,
    },
};
use tracing::debug;
use url::Url;

mod controller;
pub mod surface;
mod tokens;
pub mod typewriter;
pub mod types;

pub use controller::UploadController;
pub use surface::{UiEventSource, UiSurface};
pub use typewriter::TypeWriter;
pub use types::{ActionOutcome, PreviewImage, Prompt, SelectedFile, Session, UserAction};

/// The extraction backend as the controller sees it.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn classify(&self, file: &SelectedFile) -> Result<UploadResponse>;
    /// PNG bytes of the rendered page. Non-success statuses are errors.
    async fn preview_pdf_page(&self, file: &SelectedFile, page: PageNumber) -> Result<Vec<u8>>;
    async fn extract_pdf(
        &self,
        file: &SelectedFile,
        mode: &ExtractMode,
        force_ocr: bool,
    ) -> Result<TextResponse>;
    async fn ocr_image(&self, file: &SelectedFile) -> Result<TextResponse>;
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// `DocumentBackend` over HTTP.
pub struct HttpBackend {
    http: Client,
    server_url: String,
}

impl HttpBackend {
    pub fn new(server_url: &Url) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &Url) -> Self {
        Self {
            http,
            server_url: server_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }

    fn file_form(file: &SelectedFile) -> Result<Form> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(&file.mime_type())
            .with_context(|| format!("invalid mime type for {}", file.name()))?;
        Ok(Form::new().part(fields::FILE, part))
    }

    async fn send_form(&self, path: &'static str, form: Form) -> Result<Response> {
        debug!(path, "backend: posting form");
        let response = self
            .http
            .post(self.endpoint(path))
            .multipart(form)
            .send()
            .await
            .map_err(|err| BackendError::Transport {
                path,
                message: err.to_string(),
            })?;
        Ok(response)
    }

    /// JSON endpoints report their own errors in the body, so the status is
    /// only logged here.
    async fn read_json<T: DeserializeOwned>(path: &'static str, response: Response) -> Result<T> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| BackendError::Transport {
                path,
                message: err.to_string(),
            })?;
        if !status.is_success() {
            debug!(path, status = status.as_u16(), "backend: non-success json response");
        }
        let parsed = serde_json::from_slice(&body).map_err(|err| BackendError::Malformed {
            path,
            message: format!("status {status}: {err}"),
        })?;
        Ok(parsed)
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn classify(&self, file: &SelectedFile) -> Result<UploadResponse> {
        let form = Self::file_form(file)?;
        let response = self.send_form(UPLOAD_PATH, form).await?;
        Self::read_json(UPLOAD_PATH, response).await
    }

    async fn preview_pdf_page(&self, file: &SelectedFile, page: PageNumber) -> Result<Vec<u8>> {
        let form = Self::file_form(file)?.text(fields::PAGE, page.to_string());
        let response = self.send_form(PREVIEW_PDF_PAGE_PATH, form).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                path: PREVIEW_PDF_PAGE_PATH,
                status: status.as_u16(),
            }
            .into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| BackendError::Transport {
                path: PREVIEW_PDF_PAGE_PATH,
                message: err.to_string(),
            })?;
        Ok(bytes.to_vec())
    }

    async fn extract_pdf(
        &self,
        file: &SelectedFile,
        mode: &ExtractMode,
        force_ocr: bool,
    ) -> Result<TextResponse> {
        let mut form = Self::file_form(file)?;
        for (name, value) in mode.form_fields(force_ocr) {
            form = form.text(name, value);
        }
        let response = self.send_form(EXTRACT_PDF_PATH, form).await?;
        Self::read_json(EXTRACT_PDF_PATH, response).await
    }

    async fn ocr_image(&self, file: &SelectedFile) -> Result<TextResponse> {
        let form = Self::file_form(file)?;
        let response = self.send_form(OCR_PATH, form).await?;
        Self::read_json(OCR_PATH, response).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(path = CHAT_PATH, "backend: posting chat message");
        let response = self
            .http
            .post(self.endpoint(CHAT_PATH))
            .json(request)
            .send()
            .await
            .map_err(|err| BackendError::Transport {
                path: CHAT_PATH,
                message: err.to_string(),
            })?;
        Self::read_json(CHAT_PATH, response).await
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
