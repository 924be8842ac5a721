//! Export command handler.

use std::path::{Path, PathBuf};

use anyhow::Result;
use snappal_core::export::{ExportFormat, json_file_name};
use snappal_core::history::HistoryStore;

use super::{deliver, lookup};

/// Renders a saved entry.
///
/// JSON without `--out` is saved as `snap_palette_<id>.json` in the current
/// directory; other formats print to stdout.
pub fn run(key: &str, format: ExportFormat, out: Option<&Path>, copy: bool) -> Result<()> {
    let history = HistoryStore::at_default_path().load();
    let entry = lookup(&history, key)?;
    let text = format.render(entry)?;

    let default_out = (format == ExportFormat::Json && out.is_none())
        .then(|| PathBuf::from(json_file_name(entry)));
    deliver(&text, out.or(default_out.as_deref()), copy)
}
