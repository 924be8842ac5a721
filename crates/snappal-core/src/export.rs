//! Export formats for a finished analysis.
//!
//! Every function here is a pure function of the result: the same input
//! always renders byte-identical output.

use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use snappal_types::AnalysisResult;

/// One exportable representation of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Css,
    Tailwind,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Css => "css",
            ExportFormat::Tailwind => "tailwind",
        }
    }

    /// Renders `result` in this format.
    ///
    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render(self, result: &AnalysisResult) -> Result<String> {
        match self {
            ExportFormat::Json => to_json(result),
            ExportFormat::Css => Ok(css_variables(result)),
            ExportFormat::Tailwind => Ok(tailwind_config(result)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "css" => Ok(ExportFormat::Css),
            "tailwind" | "tw" => Ok(ExportFormat::Tailwind),
            other => bail!("Unknown export format '{other}' (expected json, css or tailwind)"),
        }
    }
}

/// Pretty JSON of the full result, as stored in history.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json(result: &AnalysisResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("serialize analysis result")
}

/// Download name for the JSON artifact.
pub fn json_file_name(result: &AnalysisResult) -> String {
    format!("snap_palette_{}.json", result.id)
}

/// CSS custom properties block.
pub fn css_variables(result: &AnalysisResult) -> String {
    let mut out = String::from(":root {\n  /* Colors */\n");
    let mut keys = UniqueKeys::default();
    for color in &result.colors().primary {
        let key = keys.claim(&css_ident(color.role.as_str()));
        let _ = writeln!(out, "  --color-{key}: {};", color.hex);
    }
    for (i, color) in result.colors().extended.iter().enumerate() {
        let _ = writeln!(out, "  --color-ext-{}: {};", i + 1, color.hex);
    }

    out.push_str("\n  /* Spacing */\n");
    for value in &result.spacing().scale {
        let num = format_number(*value);
        let _ = writeln!(out, "  --space-{}: {num}px;", num.replace('.', "\\."));
    }
    out.push('}');
    out
}

/// Tailwind `theme.extend` snippet.
pub fn tailwind_config(result: &AnalysisResult) -> String {
    let mut out = String::from("module.exports = {\n  theme: {\n    extend: {\n      colors: {\n");
    let mut keys = UniqueKeys::default();
    for color in &result.colors().primary {
        let key = keys.claim(&css_ident(color.role.as_str()));
        let _ = writeln!(out, "        {}: '{}',", js_key(&key), color.hex);
    }

    out.push_str("      },\n      fontSize: {\n");
    let mut keys = UniqueKeys::default();
    for style in result.typography() {
        let key = keys.claim(&style.label.trim().to_lowercase());
        let mut metrics = Vec::new();
        if let Some(line_height) = style.line_height_px {
            metrics.push(format!("lineHeight: '{}px'", format_number(line_height)));
        }
        if let Some(letter_spacing) = style.letter_spacing_px {
            metrics.push(format!("letterSpacing: '{}px'", format_number(letter_spacing)));
        }
        let size = format!("'{}px'", format_number(style.font_size_px));
        if metrics.is_empty() {
            let _ = writeln!(out, "        {}: [{size}],", js_string(&key));
        } else {
            let _ = writeln!(
                out,
                "        {}: [{size}, {{ {} }}],",
                js_string(&key),
                metrics.join(", ")
            );
        }
    }

    out.push_str("      },\n      spacing: {\n");
    for value in &result.spacing().scale {
        let num = format_number(*value);
        let _ = writeln!(out, "        '{num}': '{num}px',");
    }
    out.push_str("      }\n    }\n  }\n}");
    out
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    // Adding zero turns -0 into 0.
    format!("{}", value + 0.0)
}

/// Lowercase CSS-safe identifier: runs of other characters collapse to `-`.
fn css_ident(raw: &str) -> String {
    let mut ident = String::with_capacity(raw.len());
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            ident.push(ch);
        } else if !ident.ends_with('-') {
            ident.push('-');
        }
    }
    let ident = ident.trim_matches('-');
    if ident.is_empty() {
        "color".to_string()
    } else {
        ident.to_string()
    }
}

fn js_key(key: &str) -> String {
    let bare = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare { key.to_string() } else { js_string(key) }
}

fn js_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Hands out keys, suffixing repeats with `-2`, `-3`, ...
#[derive(Default)]
struct UniqueKeys {
    taken: HashSet<String>,
}

impl UniqueKeys {
    fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let key = format!("{base}-{n}");
            if self.taken.insert(key.clone()) {
                return key;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use snappal_types::{
        AnalysisPayload, ColorRole, ColorToken, Palette, SpacingData, TypeStyle,
    };

    use super::*;

    fn color(hex: &str, role: ColorRole) -> ColorToken {
        ColorToken {
            hex: hex.to_string(),
            role,
            usage: 0.1,
            name: None,
        }
    }

    fn style(label: &str, size: f64, line_height: Option<f64>, letter_spacing: Option<f64>) -> TypeStyle {
        TypeStyle {
            id: label.to_lowercase(),
            label: label.to_string(),
            font_family_guess: "Inter".to_string(),
            font_size_px: size,
            font_weight: 400.0,
            line_height_px: line_height,
            letter_spacing_px: letter_spacing,
        }
    }

    fn sample() -> AnalysisResult {
        AnalysisResult {
            id: "snap_1700000000000".to_string(),
            timestamp: 1_700_000_000_000,
            image_url: "blob:snappal/x".to_string(),
            payload: AnalysisPayload {
                colors: Palette {
                    primary: vec![
                        color("#ffffff", ColorRole::Background),
                        color("#2563eb", ColorRole::Primary),
                        color("#f59e0b", ColorRole::Accent),
                        color("#0f172a", ColorRole::Text),
                    ],
                    extended: vec![
                        color("#e2e8f0", ColorRole::Custom("border".to_string())),
                        color("#64748b", ColorRole::Neutral),
                    ],
                },
                typography: vec![
                    style("H1", 32.0, Some(40.0), Some(-0.5)),
                    style("Body", 16.0, Some(24.0), None),
                ],
                spacing: SpacingData {
                    raw_distances: vec![4.0, 8.0, 16.0, 24.0],
                    scale: vec![4.0, 8.0, 16.0, 24.0],
                    base_unit: 4.0,
                },
            },
        }
    }

    #[test]
    fn css_lists_every_role_extended_index_and_space() {
        let css = css_variables(&sample());

        for role in ["background", "primary", "accent", "text"] {
            assert_eq!(css.matches(&format!("--color-{role}:")).count(), 1, "{role}");
        }
        assert!(css.contains("  --color-ext-1: #e2e8f0;\n"));
        assert!(css.contains("  --color-ext-2: #64748b;\n"));
        for value in [4, 8, 16, 24] {
            assert!(css.contains(&format!("  --space-{value}: {value}px;\n")));
        }
        assert!(css.starts_with(":root {\n  /* Colors */\n"));
        assert!(css.ends_with('}'));
        assert!(!css.contains(".0"));
    }

    #[test]
    fn css_suffixes_duplicate_roles() {
        let mut result = sample();
        result.payload.colors.primary = vec![
            color("#111111", ColorRole::Neutral),
            color("#222222", ColorRole::Neutral),
            color("#333333", ColorRole::Custom("neutral-2".to_string())),
        ];

        let css = css_variables(&result);

        assert!(css.contains("--color-neutral: #111111;"));
        assert!(css.contains("--color-neutral-2: #222222;"));
        assert!(css.contains("--color-neutral-2-2: #333333;"));
    }

    #[test]
    fn css_escapes_fractional_spacing() {
        let mut result = sample();
        result.payload.spacing.scale = vec![2.5];
        assert!(css_variables(&result).contains("  --space-2\\.5: 2.5px;"));
    }

    #[test]
    fn tailwind_has_all_sections() {
        let tw = tailwind_config(&sample());

        assert!(tw.starts_with("module.exports = {\n  theme: {\n    extend: {\n"));
        assert!(tw.contains("        primary: '#2563eb',\n"));
        assert!(tw.contains(
            "        'h1': ['32px', { lineHeight: '40px', letterSpacing: '-0.5px' }],\n"
        ));
        assert!(tw.contains("        'body': ['16px', { lineHeight: '24px' }],\n"));
        assert!(tw.contains("        '16': '16px',\n"));
        assert!(!tw.contains("undefined"));
    }

    #[test]
    fn tailwind_omits_all_metrics_when_absent() {
        let mut result = sample();
        result.payload.typography = vec![style("Caption", 12.0, None, None)];
        assert!(tailwind_config(&result).contains("        'caption': ['12px'],\n"));
    }

    #[test]
    fn renders_are_deterministic() {
        let result = sample();
        for format in [ExportFormat::Json, ExportFormat::Css, ExportFormat::Tailwind] {
            assert_eq!(
                format.render(&result).unwrap(),
                format.render(&result).unwrap(),
                "{format}"
            );
        }
    }

    #[test]
    fn json_round_trips_and_names_artifact() {
        let result = sample();
        let json = to_json(&result).unwrap();

        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(json.contains("\"imageUrl\""));
        assert_eq!(json_file_name(&result), "snap_palette_snap_1700000000000.json");
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSS".parse::<ExportFormat>().unwrap(), ExportFormat::Css);
        assert_eq!("tailwind".parse::<ExportFormat>().unwrap(), ExportFormat::Tailwind);
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn numbers_drop_integral_fraction() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn idents_are_sanitized() {
        assert_eq!(css_ident("Surface Alt"), "surface-alt");
        assert_eq!(css_ident("  !!  "), "color");
    }
}
