//! Line commands typed at the prompt, translated into controller actions.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use client_core::UserAction;
use shared::{domain::PageNumber, protocol::ExtractMode};

#[derive(Parser, Debug)]
#[command(
    name = "docuquery",
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct Line {
    #[command(subcommand)]
    command: LineCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Select a file; without a path, asks for one
    Open { path: Option<PathBuf> },
    /// Drop files onto the upload area; only the first is kept
    Drop {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Render a PDF page (default 1)
    Preview {
        #[arg(value_parser = parse_page)]
        page: Option<PageNumber>,
    },
    /// Extract text from the selected PDF
    Extract {
        #[command(subcommand)]
        scope: Option<ExtractScope>,
    },
    /// OCR the selected image, or toggle forced OCR with on|off
    Ocr {
        #[arg(value_enum)]
        toggle: Option<OcrToggle>,
    },
    /// Ask a question about the extracted text
    Ask {
        #[arg(allow_hyphen_values = true)]
        question: Option<String>,
    },
    /// Show the extracted text
    Text,
    /// Show this help
    Help,
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ExtractScope {
    /// The whole document
    #[command(alias = "full")]
    All,
    /// A single page
    Page {
        #[arg(value_parser = parse_page)]
        page: PageNumber,
    },
    /// A page range such as 1-3
    Range { range: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrToggle {
    On,
    Off,
}

fn extract_mode(scope: Option<ExtractScope>) -> ExtractMode {
    match scope {
        None | Some(ExtractScope::All) => ExtractMode::Full,
        Some(ExtractScope::Page { page }) => ExtractMode::Page(page),
        Some(ExtractScope::Range { range }) => ExtractMode::Range(range),
    }
}

impl LineCommand {
    /// The controller action for commands that need neither the disk nor the terminal.
    pub fn into_action(self) -> Option<UserAction> {
        match self {
            LineCommand::Open { path: None } => Some(UserAction::DropZoneClicked),
            LineCommand::Preview { page } => Some(UserAction::PreviewRequested(
                page.unwrap_or(PageNumber::FIRST),
            )),
            LineCommand::Extract { scope } => Some(UserAction::ExtractRequested(extract_mode(scope))),
            LineCommand::Ocr { toggle: None } => Some(UserAction::OcrRequested),
            LineCommand::Ocr { toggle: Some(toggle) } => {
                Some(UserAction::ForceOcrToggled(toggle == OcrToggle::On))
            }
            LineCommand::Ask { question } => {
                Some(UserAction::ChatSubmitted(question.unwrap_or_default()))
            }
            LineCommand::Open { path: Some(_) }
            | LineCommand::Drop { .. }
            | LineCommand::Text
            | LineCommand::Help
            | LineCommand::Quit => None,
        }
    }
}

fn parse_page(raw: &str) -> Result<PageNumber, String> {
    raw.parse::<u32>()
        .ok()
        .and_then(PageNumber::new)
        .ok_or_else(|| format!("'{raw}' is not a page number (pages start at 1)"))
}

pub fn help() -> String {
    Line::command().render_help().to_string()
}

/// `Ok(None)` for a blank line. Errors carry clap's rendered message.
pub fn parse_line(line: &str) -> Result<Option<LineCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    // questions are free text and keep their quotes and apostrophes
    let words = match line.split_once(char::is_whitespace) {
        Some(("ask", question)) => vec!["ask".to_string(), question.trim().to_string()],
        _ => shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?,
    };

    Line::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|err| err.render().to_string())
}
