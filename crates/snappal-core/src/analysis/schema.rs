//! Instruction prompt and structured-output schema sent with every analysis.

use serde_json::{Value, json};
use snappal_types::ColorRole;

/// Natural-language instruction for the three extraction tasks.
pub const ANALYSIS_PROMPT: &str = "\
Analyze this UI screenshot thoroughly. Act as a senior design systems engineer.

1. Colors: Extract the primary palette (backgrounds, brand colors, text) and an extended palette. Assign semantic roles.
2. Typography: Identify distinct text styles (Headings, Body, Captions, Buttons). Estimate font family (e.g., Inter, Roboto, SF Pro, Playfair), size in pixels, weight, line-height and letter-spacing.
3. Spacing: Analyze the whitespace between elements (padding, margins, gaps). Infer a spacing scale (e.g., 4, 8, 16...).

Return the data in strict JSON format matching the provided schema.";

/// Response schema in the Generative Language API `Schema` notation.
///
/// Mirrors `AnalysisPayload`: the result minus `id`, `timestamp` and `imageUrl`.
pub fn response_schema() -> Value {
    let primary_roles: Vec<&str> = ColorRole::named().iter().map(ColorRole::as_str).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "colors": {
                "type": "OBJECT",
                "properties": {
                    "primary": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "hex": { "type": "STRING" },
                                "role": { "type": "STRING", "enum": primary_roles },
                                "usage": { "type": "NUMBER" },
                                "name": { "type": "STRING" }
                            },
                            "required": ["hex", "role", "usage"]
                        }
                    },
                    "extended": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "hex": { "type": "STRING" },
                                "role": { "type": "STRING" },
                                "usage": { "type": "NUMBER" }
                            },
                            "required": ["hex", "role"]
                        }
                    }
                },
                "required": ["primary", "extended"]
            },
            "typography": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "label": { "type": "STRING" },
                        "fontFamilyGuess": { "type": "STRING" },
                        "fontSizePx": { "type": "NUMBER" },
                        "fontWeight": { "type": "NUMBER" },
                        "lineHeightPx": { "type": "NUMBER" },
                        "letterSpacingPx": { "type": "NUMBER" }
                    },
                    "required": ["id", "label", "fontFamilyGuess", "fontSizePx", "fontWeight"]
                }
            },
            "spacing": {
                "type": "OBJECT",
                "properties": {
                    "rawDistances": { "type": "ARRAY", "items": { "type": "NUMBER" } },
                    "scale": { "type": "ARRAY", "items": { "type": "NUMBER" } },
                    "baseUnit": { "type": "NUMBER" }
                },
                "required": ["rawDistances", "scale", "baseUnit"]
            }
        },
        "required": ["colors", "typography", "spacing"]
    })
}
