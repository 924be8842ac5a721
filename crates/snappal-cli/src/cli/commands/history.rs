//! History command handlers.

use anyhow::{Context, Result, bail};
use snappal_core::history::HistoryStore;
use snappal_core::state::{AnalysisState, Effect, StateEvent};

use super::{lookup, render};
use crate::cli::ViewFormat;
use crate::views;

pub fn list() -> Result<()> {
    let history = HistoryStore::at_default_path().load();
    println!("{}", views::render_history(&history));
    Ok(())
}

pub fn show(key: &str, format: ViewFormat) -> Result<()> {
    let history = HistoryStore::at_default_path().load();
    let entry = lookup(&history, key)?;
    // Handles from earlier sessions never resolve in a fresh process.
    println!("{}", render(entry, format, None)?);
    Ok(())
}

/// Clears saved history. Only local storage is involved, so the analysis
/// service is never configured.
pub fn clear() -> Result<()> {
    let store = HistoryStore::at_default_path();
    let mut state = AnalysisState::new();
    state.update(StateEvent::HistoryLoaded(store.load()));
    let removed = state.history.len();

    for effect in state.update(StateEvent::ClearHistory) {
        match effect {
            Effect::ClearStorage => store.clear().context("clear saved history")?,
            Effect::Notice(notice) => bail!("{notice}"),
            Effect::StartAnalysis(_) | Effect::PersistHistory(_) | Effect::ReleaseImage(_) => {}
        }
    }
    println!("Cleared {removed} saved analyses.");
    Ok(())
}
