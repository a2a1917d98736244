//! Upload controller: session state, action dispatch and response routing.

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::Result;
use shared::{
    domain::{FileKind, OutputRegion, PageNumber},
    protocol::{ChatRequest, ExtractMode},
};
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{debug, error, info, warn};

use crate::{
    surface::{UiEventSource, UiSurface},
    tokens::RequestTokens,
    typewriter::TypeWriter,
    types::{ActionOutcome, PreviewImage, Prompt, SelectedFile, Session, UserAction},
    DocumentBackend,
};

pub struct UploadController {
    backend: Arc<dyn DocumentBackend>,
    surface: Arc<dyn UiSurface>,
    session: Mutex<Session>,
    tokens: RequestTokens,
    typewriter: TypeWriter,
}

impl UploadController {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        surface: Arc<dyn UiSurface>,
        typewriter_tick: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            typewriter: TypeWriter::new(Arc::clone(&surface), typewriter_tick),
            backend,
            surface,
            session: Mutex::new(Session::default()),
            tokens: RequestTokens::new(),
        })
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    pub fn typewriter(&self) -> &TypeWriter {
        &self.typewriter
    }

    pub async fn set_force_ocr(&self, force_ocr: bool) {
        self.session.lock().await.force_ocr = force_ocr;
        debug!(force_ocr, "session: ocr toggle changed");
    }

    async fn selected_file(&self) -> Option<SelectedFile> {
        self.session.lock().await.selected.clone()
    }

    fn prompt(&self, prompt: Prompt) -> ActionOutcome {
        self.surface.notify(&prompt.to_string());
        ActionOutcome::Prompted(prompt)
    }

    fn fail(&self, prompt: Prompt) -> ActionOutcome {
        self.surface.notify(&prompt.to_string());
        ActionOutcome::Failed(prompt)
    }

    /// Keeps the first offered file and replaces any earlier selection.
    async fn record_selection(&self, files: Vec<SelectedFile>) -> Option<SelectedFile> {
        let Some(file) = files.into_iter().next() else {
            debug!("selection: empty file list ignored");
            return None;
        };

        {
            let mut session = self.session.lock().await;
            session.selected = Some(file.clone());
            session.page_count = None;
        }
        self.surface
            .set_upload_label(&format!("Uploaded: {}", file.name()));
        info!(filename = file.name(), size = file.size(), "selection: file selected");
        Some(file)
    }

    /// Records the selection and classifies it right away.
    pub async fn select_file(&self, files: Vec<SelectedFile>) -> Result<ActionOutcome> {
        if self.record_selection(files).await.is_none() {
            return Ok(ActionOutcome::Ignored);
        }
        self.submit_for_classification().await
    }

    pub async fn submit_for_classification(&self) -> Result<ActionOutcome> {
        let Some(file) = self.selected_file().await else {
            return Ok(ActionOutcome::Ignored);
        };

        let text_token = self.tokens.issue(OutputRegion::Text);
        let preview_token = self.tokens.issue(OutputRegion::Preview);
        let response = self.backend.classify(&file).await?;

        if let Some(message) = response.error.clone() {
            warn!(filename = file.name(), %message, "classify: backend reported error");
            return Ok(self.fail(Prompt::Server(message)));
        }

        let text_current = self.tokens.is_current(OutputRegion::Text, text_token);
        let kind = response.kind().cloned().unwrap_or_default();
        match kind {
            FileKind::Image => {
                let preview_current = self.tokens.is_current(OutputRegion::Preview, preview_token);
                if preview_current {
                    self.surface
                        .show_preview(PreviewImage::SelectedFile(file.clone()));
                }
                if text_current {
                    self.surface
                        .set_extracted_text(response.extracted_or_empty());
                }
                info!(
                    filename = file.name(),
                    preview_current,
                    text_current,
                    "classify: image"
                );
                if text_current || preview_current {
                    Ok(ActionOutcome::Applied)
                } else {
                    Ok(ActionOutcome::Discarded(OutputRegion::Text))
                }
            }
            FileKind::Text if !text_current => {
                debug!(filename = file.name(), "classify: stale text discarded");
                Ok(ActionOutcome::Discarded(OutputRegion::Text))
            }
            FileKind::Text => {
                self.surface
                    .set_extracted_text(response.extracted_or_empty());
                info!(filename = file.name(), "classify: text");
                Ok(ActionOutcome::Applied)
            }
            FileKind::Pdf => {
                let pages = response.meta.as_ref().and_then(|meta| meta.pages);
                {
                    let mut session = self.session.lock().await;
                    if session
                        .selected
                        .as_ref()
                        .is_some_and(|selected| selected.same_blob(&file))
                    {
                        session.page_count = pages;
                    }
                }
                info!(filename = file.name(), ?pages, "classify: pdf");
                Ok(ActionOutcome::Ignored)
            }
            FileKind::Unknown(other) => {
                warn!(filename = file.name(), kind = %other, "classify: unrecognized file type");
                Ok(ActionOutcome::Ignored)
            }
        }
    }

    pub async fn preview_pdf_page(&self, page: PageNumber) -> Result<ActionOutcome> {
        let Some(file) = self.selected_file().await else {
            return Ok(self.prompt(Prompt::NoFileSelected));
        };

        let token = self.tokens.issue(OutputRegion::Preview);
        let result = self.backend.preview_pdf_page(&file, page).await;

        if !self.tokens.is_current(OutputRegion::Preview, token) {
            debug!(%page, "preview: stale response discarded");
            return Ok(ActionOutcome::Discarded(OutputRegion::Preview));
        }

        match result {
            Ok(png) => {
                debug!(%page, bytes = png.len(), "preview: page rendered");
                self.surface
                    .show_preview(PreviewImage::RenderedPage { page, png });
                Ok(ActionOutcome::Applied)
            }
            Err(err) => {
                warn!(%page, "preview: failed: {err:#}");
                Ok(self.fail(Prompt::PreviewFailed))
            }
        }
    }

    pub async fn extract_text(&self, mode: ExtractMode) -> Result<ActionOutcome> {
        let (file, force_ocr) = {
            let session = self.session.lock().await;
            (session.selected.clone(), session.force_ocr)
        };
        let Some(file) = file else {
            return Ok(self.prompt(Prompt::NoFileSelected));
        };

        let token = self.tokens.issue(OutputRegion::Text);
        let response = self.backend.extract_pdf(&file, &mode, force_ocr).await?;

        if !self.tokens.is_current(OutputRegion::Text, token) {
            debug!(mode = mode.as_str(), "extract: stale response discarded");
            return Ok(ActionOutcome::Discarded(OutputRegion::Text));
        }
        if let Some(message) = &response.error {
            warn!(mode = mode.as_str(), %message, "extract: backend reported error");
        }

        self.surface.set_extracted_text(response.text_or_empty());
        info!(
            mode = mode.as_str(),
            force_ocr,
            chars = response.text_or_empty().chars().count(),
            "extract: text replaced"
        );
        Ok(ActionOutcome::Applied)
    }

    pub async fn ocr_image(&self) -> Result<ActionOutcome> {
        let Some(file) = self.selected_file().await else {
            return Ok(self.prompt(Prompt::NoFileSelected));
        };

        let token = self.tokens.issue(OutputRegion::Text);
        let response = self.backend.ocr_image(&file).await?;

        if !self.tokens.is_current(OutputRegion::Text, token) {
            return Ok(ActionOutcome::Discarded(OutputRegion::Text));
        }
        if let Some(message) = &response.error {
            warn!(filename = file.name(), %message, "ocr: backend reported error");
            return Ok(self.fail(Prompt::Server(message.clone())));
        }

        self.surface.set_extracted_text(response.text_or_empty());
        Ok(ActionOutcome::Applied)
    }

    pub async fn ask_chat(&self, question: &str) -> Result<ActionOutcome> {
        if question.trim().is_empty() {
            return Ok(self.prompt(Prompt::EmptyQuestion));
        }
        let doc_text = self.surface.extracted_text();
        if doc_text.trim().is_empty() {
            return Ok(self.prompt(Prompt::MissingDocumentText));
        }

        let token = self.tokens.issue(OutputRegion::Chat);
        let response = self
            .backend
            .chat(&ChatRequest {
                doc_text,
                message: question.to_string(),
            })
            .await?;

        if !self.tokens.is_current(OutputRegion::Chat, token) {
            debug!("chat: stale answer discarded");
            return Ok(ActionOutcome::Discarded(OutputRegion::Chat));
        }

        self.typewriter.start(response.answer_or_empty()).await;
        Ok(ActionOutcome::Applied)
    }

    /// Handles one action to completion.
    pub async fn handle(&self, action: UserAction) -> Result<ActionOutcome> {
        match action {
            UserAction::DragOver => {
                self.surface.set_drop_highlight(true);
                Ok(ActionOutcome::Applied)
            }
            UserAction::DragLeave => {
                self.surface.set_drop_highlight(false);
                Ok(ActionOutcome::Applied)
            }
            UserAction::DropZoneClicked => {
                self.surface.open_file_picker();
                Ok(ActionOutcome::Applied)
            }
            UserAction::Dropped(files) => {
                self.surface.set_drop_highlight(false);
                self.select_file(files).await
            }
            UserAction::FilesPicked(files) => self.select_file(files).await,
            UserAction::ForceOcrToggled(force_ocr) => {
                self.set_force_ocr(force_ocr).await;
                Ok(ActionOutcome::Applied)
            }
            UserAction::PreviewRequested(page) => self.preview_pdf_page(page).await,
            UserAction::ExtractRequested(mode) => self.extract_text(mode).await,
            UserAction::OcrRequested => self.ocr_image().await,
            UserAction::ChatSubmitted(question) => self.ask_chat(&question).await,
        }
    }

    /// Drains `source` until it closes. State changes are applied in arrival
    /// order; network work runs in its own task so later actions are not
    /// blocked behind a slow response.
    pub async fn run<S: UiEventSource>(self: &Arc<Self>, mut source: S) {
        let mut tasks = JoinSet::new();
        while let Some(action) = source.next_action().await {
            let name = action.name();
            match action {
                UserAction::Dropped(files) => {
                    self.surface.set_drop_highlight(false);
                    if self.record_selection(files).await.is_some() {
                        self.spawn_logged(&mut tasks, name, |controller| async move {
                            controller.submit_for_classification().await
                        });
                    }
                }
                UserAction::FilesPicked(files) => {
                    if self.record_selection(files).await.is_some() {
                        self.spawn_logged(&mut tasks, name, |controller| async move {
                            controller.submit_for_classification().await
                        });
                    }
                }
                action @ (UserAction::PreviewRequested(_)
                | UserAction::ExtractRequested(_)
                | UserAction::OcrRequested
                | UserAction::ChatSubmitted(_)) => {
                    self.spawn_logged(&mut tasks, name, |controller| async move {
                        controller.handle(action).await
                    });
                }
                action => {
                    if let Err(err) = self.handle(action).await {
                        error!(action = name, "ui action failed: {err:#}");
                    }
                }
            }
            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
        self.typewriter.wait().await;
        debug!("controller: event source closed");
    }

    fn spawn_logged<F, Fut>(self: &Arc<Self>, tasks: &mut JoinSet<()>, name: &'static str, work: F)
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<ActionOutcome>> + Send + 'static,
    {
        let fut = work(Arc::clone(self));
        tasks.spawn(async move {
            match fut.await {
                Ok(outcome) => debug!(action = name, ?outcome, "ui action handled"),
                Err(err) => error!(action = name, "ui action failed: {err:#}"),
            }
        });
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
