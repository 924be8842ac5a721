//! Design-token data shapes shared by the analysis client, history and exporters.
//!
//! Wire names are camelCase so that persisted history and exported JSON match
//! the shape the generative service is asked to return.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of results kept in history.
pub const MAX_HISTORY: usize = 10;

/// Semantic role of a palette color.
///
/// Primary colors are constrained to the six named roles. Extended colors may
/// come back with any label, which is kept verbatim in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Background,
    Primary,
    Secondary,
    Accent,
    Text,
    Neutral,
    #[serde(untagged)]
    Custom(String),
}

impl ColorRole {
    /// The six roles allowed for the primary palette.
    pub fn named() -> &'static [ColorRole] {
        &[
            ColorRole::Background,
            ColorRole::Primary,
            ColorRole::Secondary,
            ColorRole::Accent,
            ColorRole::Text,
            ColorRole::Neutral,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColorRole::Background => "background",
            ColorRole::Primary => "primary",
            ColorRole::Secondary => "secondary",
            ColorRole::Accent => "accent",
            ColorRole::Text => "text",
            ColorRole::Neutral => "neutral",
            ColorRole::Custom(role) => role,
        }
    }
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorToken {
    pub hex: String,
    pub role: ColorRole,
    /// Fraction of the screenshot covered by this color, in `[0, 1]`.
    /// Fractions are not required to sum to 1 across a palette.
    #[serde(default)]
    pub usage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Dominant colors plus the fuller supporting set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: Vec<ColorToken>,
    pub extended: Vec<ColorToken>,
}

/// One distinct text treatment detected in the screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStyle {
    pub id: String,
    /// Display label such as "H1" or "Body".
    pub label: String,
    pub font_family_guess: String,
    pub font_size_px: f64,
    pub font_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height_px: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing_px: Option<f64>,
}

/// Measured whitespace and the inferred spacing scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingData {
    pub raw_distances: Vec<f64>,
    /// Deduplicated, ascending step values.
    pub scale: Vec<f64>,
    pub base_unit: f64,
}

/// The structured part of a result, as returned by the generative service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub colors: Palette,
    pub typography: Vec<TypeStyle>,
    pub spacing: SpacingData,
}

/// A completed analysis. Immutable once created; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    /// Session-local reference to the analyzed image bytes.
    pub image_url: String,
    #[serde(flatten)]
    pub payload: AnalysisPayload,
}

impl AnalysisResult {
    pub fn colors(&self) -> &Palette {
        &self.payload.colors
    }

    pub fn typography(&self) -> &[TypeStyle] {
        &self.payload.typography
    }

    pub fn spacing(&self) -> &SpacingData {
        &self.payload.spacing
    }

    /// The id without its `snap_` prefix, for compact display.
    pub fn short_id(&self) -> &str {
        self.id
            .split_once('_')
            .map_or(self.id.as_str(), |(_, rest)| rest)
    }
}

/// Lifecycle of the current analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Analyzing,
    Complete,
    Error,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStatus::Idle => write!(f, "idle"),
            AnalysisStatus::Analyzing => write!(f, "analyzing"),
            AnalysisStatus::Complete => write!(f, "complete"),
            AnalysisStatus::Error => write!(f, "error"),
        }
    }
}
