//! Text rendering of results and history.

use chrono::{DateTime, Local};
use comfy_table::{ContentArrangement, Table};
use snappal_core::export::format_number;
use snappal_core::images::SourceImage;
use snappal_types::{AnalysisResult, ColorToken, TypeStyle};

const IMAGE_UNAVAILABLE: &str = "image unavailable";

/// Formats a millisecond epoch stamp in local time.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms).map_or_else(
        || "unknown".to_string(),
        |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn usage_percent(usage: f64) -> String {
    format!("{:.0}%", usage * 100.0)
}

fn px(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}px", format_number(v)))
}

fn color_rows(table: &mut Table, colors: &[ColorToken]) {
    for (i, color) in colors.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            color.role.to_string(),
            color.hex.clone(),
            usage_percent(color.usage),
            color.name.clone().unwrap_or_default(),
        ]);
    }
}

/// Header line: id, capture time and image availability.
pub fn render_header(result: &AnalysisResult, image: Option<&SourceImage>) -> String {
    let source = image.map_or_else(
        || IMAGE_UNAVAILABLE.to_string(),
        |image| format!("{}, {} bytes", image.mime_type, image.bytes.len()),
    );
    format!(
        "{}  {}  ({source})",
        result.id,
        format_timestamp(result.timestamp)
    )
}

pub fn render_colors(result: &AnalysisResult) -> String {
    let palette = result.colors();
    let mut out = String::from("Primary palette\n");
    let mut primary = table(&["#", "Role", "Hex", "Usage", "Name"]);
    color_rows(&mut primary, &palette.primary);
    out.push_str(&primary.to_string());

    if !palette.extended.is_empty() {
        out.push_str("\n\nExtended palette\n");
        let mut extended = table(&["#", "Role", "Hex", "Usage", "Name"]);
        color_rows(&mut extended, &palette.extended);
        out.push_str(&extended.to_string());
    }
    out
}

pub fn render_typography(result: &AnalysisResult) -> String {
    let styles: &[TypeStyle] = result.typography();
    if styles.is_empty() {
        return "No type styles detected.".to_string();
    }
    let mut table = table(&["Style", "Family", "Size", "Weight", "Line height", "Tracking"]);
    for style in styles {
        table.add_row(vec![
            style.label.clone(),
            style.font_family_guess.clone(),
            px(Some(style.font_size_px)),
            format_number(style.font_weight),
            px(style.line_height_px),
            px(style.letter_spacing_px),
        ]);
    }
    table.to_string()
}

pub fn render_spacing(result: &AnalysisResult) -> String {
    let spacing = result.spacing();
    let join = |values: &[f64]| {
        values
            .iter()
            .map(|v| format_number(*v))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Base unit: {}px\nScale: [{}]\nMeasured: [{}]",
        format_number(spacing.base_unit),
        join(&spacing.scale),
        join(&spacing.raw_distances)
    )
}

/// Full human-readable summary of one result.
pub fn render_summary(result: &AnalysisResult, image: Option<&SourceImage>) -> String {
    format!(
        "{}\n\n{}\n\nTypography\n{}\n\nSpacing\n{}",
        render_header(result, image),
        render_colors(result),
        render_typography(result),
        render_spacing(result)
    )
}

/// History table, newest first, numbered from 1.
pub fn render_history(history: &[AnalysisResult]) -> String {
    if history.is_empty() {
        return "No analyses in history.".to_string();
    }
    let mut table = table(&["#", "ID", "Captured", "Colors", "Styles", "Base unit"]);
    for (i, entry) in history.iter().enumerate() {
        let colors = entry.colors().primary.len() + entry.colors().extended.len();
        table.add_row(vec![
            (i + 1).to_string(),
            entry.id.clone(),
            format_timestamp(entry.timestamp),
            colors.to_string(),
            entry.typography().len().to_string(),
            format!("{}px", format_number(entry.spacing().base_unit)),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use snappal_types::{AnalysisPayload, ColorRole, Palette, SpacingData};

    use super::*;

    fn png() -> SourceImage {
        SourceImage {
            bytes: vec![0x89, b'P', b'N'],
            mime_type: "image/png".to_string(),
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            id: "snap_1700000000000".to_string(),
            timestamp: 1_700_000_000_000,
            image_url: "blob:snappal/gone".to_string(),
            payload: AnalysisPayload {
                colors: Palette {
                    primary: vec![ColorToken {
                        hex: "#2563eb".to_string(),
                        role: ColorRole::Primary,
                        usage: 0.125,
                        name: Some("Blue 600".to_string()),
                    }],
                    extended: Vec::new(),
                },
                typography: vec![TypeStyle {
                    id: "body".to_string(),
                    label: "Body".to_string(),
                    font_family_guess: "Inter".to_string(),
                    font_size_px: 16.0,
                    font_weight: 400.0,
                    line_height_px: Some(24.0),
                    letter_spacing_px: None,
                }],
                spacing: SpacingData {
                    raw_distances: vec![8.0, 4.0],
                    scale: vec![4.0, 8.0],
                    base_unit: 4.0,
                },
            },
        }
    }

    #[test]
    fn summary_marks_unavailable_image() {
        let text = render_summary(&result(), None);
        assert!(text.contains("snap_1700000000000"));
        assert!(text.contains(IMAGE_UNAVAILABLE));
        assert!(!render_summary(&result(), Some(&png())).contains(IMAGE_UNAVAILABLE));
    }

    #[test]
    fn header_describes_live_image() {
        let header = render_header(&result(), Some(&png()));
        assert!(header.ends_with("(image/png, 3 bytes)"), "got: {header}");
    }

    #[test]
    fn summary_lists_tokens() {
        let text = render_summary(&result(), Some(&png()));
        assert!(text.contains("#2563eb"));
        assert!(text.contains("Blue 600"));
        assert!(text.contains("13%") || text.contains("12%"));
        assert!(text.contains("16px"));
        assert!(text.contains("Scale: [4, 8]"));
        assert!(text.contains("Measured: [8, 4]"));
        assert!(!text.contains("Extended palette"));
    }

    #[test]
    fn history_numbers_entries() {
        let text = render_history(&[result()]);
        assert!(text.contains("snap_1700000000000"));
        assert!(text.contains("4px"));
        assert_eq!(render_history(&[]), "No analyses in history.");
    }

    #[test]
    fn invalid_timestamp_is_unknown() {
        assert_eq!(format_timestamp(i64::MAX), "unknown");
    }
}
