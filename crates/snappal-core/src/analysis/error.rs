//! Analysis failure taxonomy.

use std::fmt;

use serde_json::Value;

/// Categories of analysis failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    /// Missing or unusable credential; raised before any request is sent
    Configuration,
    /// Network failure or non-success HTTP status
    Transport,
    /// Empty response or JSON that does not match the analysis schema
    Parse,
}

impl fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisErrorKind::Configuration => write!(f, "configuration"),
            AnalysisErrorKind::Transport => write!(f, "transport"),
            AnalysisErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the analysis client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Configuration, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Transport, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Parse, message)
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Creates a transport error from a non-success HTTP response.
    ///
    /// Uses `error.message` from a JSON body when the service provides one.
    pub fn http_status(status: u16, body: &str) -> Self {
        if body.is_empty() {
            return Self::transport(format!("HTTP {status}"));
        }
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
        {
            return Self::transport(format!("HTTP {status}: {msg}")).with_details(body);
        }
        Self::transport(format!("HTTP {status}")).with_details(body)
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == AnalysisErrorKind::Configuration
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AnalysisError {}
