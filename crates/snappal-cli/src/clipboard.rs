//! Write-only clipboard access.
//!
//! Uses the OSC 52 terminal escape when stdout is a terminal (works over SSH),
//! otherwise the system clipboard through `arboard`.

use std::fmt;
use std::io::{IsTerminal, Write};

use base64::Engine;

/// How the text reached the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Osc52,
    System,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Osc52 => f.write_str("terminal"),
            Transport::System => f.write_str("system"),
        }
    }
}

/// Clipboard failure, carrying the reason from every transport tried.
#[derive(Debug)]
pub struct ClipboardError {
    pub osc52: Option<String>,
    pub system: String,
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.osc52 {
            Some(osc52) => write!(f, "OSC 52 failed ({osc52}); system clipboard failed ({})", self.system),
            None => write!(f, "system clipboard failed ({})", self.system),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Copies `text`, trying OSC 52 first on a terminal.
pub fn copy(text: &str) -> Result<Transport, ClipboardError> {
    let osc52 = if std::io::stdout().is_terminal() {
        match write_osc52(&mut std::io::stdout(), text) {
            Ok(()) => return Ok(Transport::Osc52),
            Err(e) => Some(e.to_string()),
        }
    } else {
        None
    };

    copy_system(text)
        .map(|()| Transport::System)
        .map_err(|system| ClipboardError { osc52, system })
}

/// ESC ] 52 ; c ; <base64> ESC \   ('c' selects the system clipboard)
fn write_osc52(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    write!(out, "\x1b]52;c;{encoded}\x1b\\")?;
    out.flush()
}

fn copy_system(text: &str) -> Result<(), String> {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text))
        .map_err(|e| e.to_string())
}
