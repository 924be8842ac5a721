//! CLI command handlers.

pub mod analyze;
pub mod config;
pub mod export;
pub mod history;
pub mod shell;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use snappal_core::analysis::Analyzer;
use snappal_core::config::Config;
use snappal_core::controller::Controller;
use snappal_core::history::{HistoryStore, find_entry};
use snappal_core::images::{ImageRegistry, SourceImage};
use snappal_core::providers::{GeminiClient, GeminiConfig};
use snappal_core::state::StateEvent;
use snappal_types::AnalysisResult;
use tokio::sync::mpsc;

use super::ViewFormat;
use crate::clipboard;
use crate::views;

/// Controller wired to Gemini and the default history slot, history loaded.
pub fn open_session(
    config: &Config,
) -> Result<(
    Controller<GeminiClient>,
    mpsc::UnboundedReceiver<StateEvent>,
)> {
    let gemini = GeminiConfig::from_settings(&config.gemini).context("configure Gemini")?;
    tracing::debug!(model = %gemini.model, base_url = %gemini.base_url, "opening session");
    let analyzer = Analyzer::new(
        GeminiClient::new(gemini),
        ImageRegistry::new(),
        config.gemini.temperature,
    );
    let (mut controller, rx) = Controller::new(analyzer, HistoryStore::at_default_path());
    controller.load_history();
    Ok((controller, rx))
}

/// Resolves `N|ID` against history.
pub fn lookup<'a>(history: &'a [AnalysisResult], key: &str) -> Result<&'a AnalysisResult> {
    find_entry(history, key).map(|(_, entry)| entry).with_context(|| {
        format!("No history entry matches '{key}'. Run `snappal history list` to see entries.")
    })
}

/// Renders a result in the requested view.
pub fn render(
    result: &AnalysisResult,
    format: ViewFormat,
    image: Option<&SourceImage>,
) -> Result<String> {
    match format.export() {
        Some(export) => export.render(result),
        None => Ok(views::render_summary(result, image)),
    }
}

/// Prints `text` or writes it to `out`, then optionally copies it.
pub fn deliver(text: &str, out: Option<&Path>, copy: bool) -> Result<()> {
    match out {
        Some(path) => {
            write_file(path, text)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    if copy {
        copy_to_clipboard(text);
    }
    Ok(())
}

/// Copies text, reporting the outcome on stderr.
pub fn copy_to_clipboard(text: &str) {
    match clipboard::copy(text) {
        Ok(transport) => eprintln!("Copied to clipboard ({transport})."),
        Err(e) => {
            tracing::warn!(error = %e, "clipboard copy failed");
            eprintln!("Could not copy to clipboard: {e}");
        }
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("write '{}'", path.display()))
}
