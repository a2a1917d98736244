//! Terminal rendition of the interface: stdout as the surface, stdin lines as events.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Context;
use async_trait::async_trait;
use client_core::{PreviewImage, SelectedFile, UiEventSource, UiSurface, UserAction};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, warn};

use crate::commands::{help, parse_line, LineCommand};

#[derive(Default)]
struct TerminalState {
    text: String,
    chat: String,
    previews_written: u32,
}

pub struct TerminalSurface {
    preview_dir: PathBuf,
    state: Mutex<TerminalState>,
}

impl TerminalSurface {
    pub fn new(preview_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            preview_dir,
            state: Mutex::new(TerminalState::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn print(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    fn write_preview(&self, file_name: &str, bytes: &[u8]) -> Option<PathBuf> {
        let path = self.preview_dir.join(file_name);
        match std::fs::write(&path, bytes) {
            Ok(()) => Some(path),
            Err(err) => {
                error!(path = %path.display(), "failed to write preview: {err}");
                None
            }
        }
    }
}

impl UiSurface for TerminalSurface {
    fn set_upload_label(&self, label: &str) {
        self.print(label);
    }

    fn set_drop_highlight(&self, active: bool) {
        if active {
            self.print("[drop zone active]");
        }
    }

    fn open_file_picker(&self) {
        self.print("choose a file with: open <path>");
    }

    fn show_preview(&self, image: PreviewImage) {
        match image {
            PreviewImage::SelectedFile(file) => {
                self.print(&format!(
                    "preview: {} (local file, {} bytes)",
                    file.name(),
                    file.size()
                ));
            }
            PreviewImage::RenderedPage { page, png } => {
                let index = {
                    let mut state = self.state();
                    state.previews_written += 1;
                    state.previews_written
                };
                let name = format!("page-{page}-{index}.png");
                if let Some(path) = self.write_preview(&name, &png) {
                    self.print(&format!("preview: page {page} -> {}", path.display()));
                }
            }
        }
    }

    fn set_extracted_text(&self, text: &str) {
        self.state().text = text.to_string();
        let chars = text.chars().count();
        self.print(&format!("extracted text updated ({chars} chars); type `text` to view"));
    }

    fn extracted_text(&self) -> String {
        self.state().text.clone()
    }

    fn set_chat_output(&self, text: &str) {
        let mut state = self.state();
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "{}", chat_delta(&state.chat, text));
        state.chat = text.to_string();
        let _ = out.flush();
    }

    fn notify(&self, message: &str) {
        self.print(&format!("!! {message}"));
    }
}

/// What to print to move the terminal from `previous` to `next`. Anything that
/// does not extend the previous frame starts a fresh answer line.
fn chat_delta(previous: &str, next: &str) -> String {
    match next.strip_prefix(previous) {
        Some(rest) if !next.is_empty() => rest.to_string(),
        _ => format!("\n> {next}"),
    }
}

pub async fn read_selection(paths: &[PathBuf]) -> Vec<SelectedFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match read_file(path).await {
            Ok(file) => files.push(file),
            Err(err) => warn!("skipping {}: {err:#}", path.display()),
        }
    }
    files
}

async fn read_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    Ok(SelectedFile::new(name, bytes))
}

/// Reads commands from stdin until EOF or `quit`.
pub struct LineEventSource {
    lines: Lines<BufReader<Stdin>>,
    surface: Arc<TerminalSurface>,
    pending: Vec<UserAction>,
}

impl LineEventSource {
    pub fn new(surface: Arc<TerminalSurface>, initial: Vec<UserAction>) -> Self {
        let mut pending = initial;
        pending.reverse();
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            surface,
            pending,
        }
    }
}

#[async_trait]
impl UiEventSource for LineEventSource {
    async fn next_action(&mut self) -> Option<UserAction> {
        if let Some(action) = self.pending.pop() {
            return Some(action);
        }

        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(err) => {
                    error!("failed to read stdin: {err}");
                    return None;
                }
            };

            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    self.surface.print(message.trim_end());
                    continue;
                }
            };

            match command {
                LineCommand::Help => self.surface.print(&help()),
                LineCommand::Quit => return None,
                LineCommand::Text => {
                    let text = self.surface.extracted_text();
                    self.surface.print(if text.is_empty() { "(empty)" } else { text.as_str() });
                }
                LineCommand::Open { path: Some(path) } => {
                    if let Some(files) = self.read_or_report(&[path]).await {
                        return Some(UserAction::FilesPicked(files));
                    }
                }
                LineCommand::Drop { paths } => {
                    if let Some(files) = self.read_or_report(&paths).await {
                        return Some(UserAction::Dropped(files));
                    }
                }
                other => {
                    if let Some(action) = other.into_action() {
                        return Some(action);
                    }
                }
            }
        }
    }
}

impl LineEventSource {
    async fn read_or_report(&self, paths: &[PathBuf]) -> Option<Vec<SelectedFile>> {
        let files = read_selection(paths).await;
        if files.is_empty() {
            self.surface.print("no readable file given");
            return None;
        }
        Some(files)
    }
}

#[cfg(test)]
mod tests {
    use super::chat_delta;

    #[test]
    fn chat_delta_appends_only_the_new_suffix() {
        assert_eq!(chat_delta("", ""), "\n> ");
        assert_eq!(chat_delta("", "o"), "o");
        assert_eq!(chat_delta("o", "ok"), "k");
        assert_eq!(chat_delta("n", "né"), "é");
    }

    #[test]
    fn chat_delta_restarts_when_frames_diverge() {
        assert_eq!(chat_delta("a", "é"), "\n> é");
        assert_eq!(chat_delta("abc", "x"), "\n> x");
    }
}
