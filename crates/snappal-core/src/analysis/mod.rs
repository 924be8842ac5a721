//! Screenshot analysis: one structured-output request per image.
//!
//! The flow is credential check → base64 encode → single `generate` call →
//! schema parse → stamp with id, timestamp and a session-local image handle.
//! There are no retries; each call is at-most-once.

mod error;
pub mod schema;

use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};

pub use error::{AnalysisError, AnalysisErrorKind};
use serde_json::Value;
use snappal_types::{AnalysisPayload, AnalysisResult, ColorRole};

use crate::images::{ImageRegistry, SourceImage};

/// Prefix of every result id.
pub const ID_PREFIX: &str = "snap_";

/// One request to the generative service.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub mime_type: &'a str,
    /// Base64 image payload, without a data-URL prefix
    pub data_base64: &'a str,
    pub instructions: &'a str,
    pub response_schema: &'a Value,
    pub temperature: f32,
}

/// External service that turns an image plus schema into JSON text.
pub trait GenerativeService: Send + Sync {
    /// Fails fast when the service cannot be called at all (e.g. no API key).
    ///
    /// # Errors
    /// Returns a configuration error when credentials are missing.
    fn check_credentials(&self) -> Result<(), AnalysisError>;

    /// Sends one request and returns the raw response text.
    fn generate(
        &self,
        request: GenerateRequest<'_>,
    ) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

/// Issues strictly increasing millisecond stamps.
///
/// Wall-clock time is used when it moved forward; otherwise the previous
/// stamp is bumped by one so ids never collide within a process.
#[derive(Debug, Default)]
pub struct IdClock {
    last: AtomicI64,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.next_after(chrono::Utc::now().timestamp_millis())
    }

    fn next_after(&self, now_ms: i64) -> i64 {
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now_ms.max(current + 1);
            match self.last.compare_exchange(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Analysis client: wraps a generative service with the fixed prompt and schema.
pub struct Analyzer<S> {
    service: S,
    images: ImageRegistry,
    clock: IdClock,
    temperature: f32,
    schema: Value,
}

impl<S: GenerativeService> Analyzer<S> {
    pub fn new(service: S, images: ImageRegistry, temperature: f32) -> Self {
        Self {
            service,
            images,
            clock: IdClock::new(),
            temperature,
            schema: schema::response_schema(),
        }
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    /// Analyzes one screenshot.
    ///
    /// # Errors
    /// Returns a configuration error before any network traffic when the
    /// credential is missing, a transport error when the call fails, and a
    /// parse error when the response is empty or does not match the schema.
    pub async fn analyze(&self, image: &SourceImage) -> Result<AnalysisResult, AnalysisError> {
        self.service.check_credentials()?;

        let data = image.to_base64();
        let request = GenerateRequest {
            mime_type: &image.mime_type,
            data_base64: &data,
            instructions: schema::ANALYSIS_PROMPT,
            response_schema: &self.schema,
            temperature: self.temperature,
        };

        tracing::info!(
            mime_type = %image.mime_type,
            size = image.bytes.len(),
            "sending analysis request"
        );
        let text = self.service.generate(request).await?;
        let payload = parse_payload(&text)?;

        let stamp = self.clock.next();
        let image_url = self.images.register(image.clone());
        let result = AnalysisResult {
            id: format!("{ID_PREFIX}{stamp}"),
            timestamp: stamp,
            image_url,
            payload,
        };
        tracing::info!(
            id = %result.id,
            primary = result.colors().primary.len(),
            styles = result.typography().len(),
            "analysis complete"
        );
        Ok(result)
    }
}

/// Parses and normalizes the service's JSON text.
///
/// # Errors
/// Returns a parse error for empty text, malformed JSON, a shape that does not
/// match the schema, or non-positive sizes.
pub fn parse_payload(text: &str) -> Result<AnalysisPayload, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::parse("No response from Gemini"));
    }

    let mismatch = |e: serde_json::Error| {
        AnalysisError::parse(format!("Response did not match the analysis schema: {e}"))
            .with_details(trimmed)
    };
    let value: Value = serde_json::from_str(trimmed).map_err(mismatch)?;
    check_primary_usage(&value).map_err(|e| e.with_details(trimmed))?;
    let mut payload: AnalysisPayload = serde_json::from_value(value).map_err(mismatch)?;

    normalize(&mut payload);
    validate(&payload).map_err(|e| e.with_details(trimmed))?;
    Ok(payload)
}

/// `usage` is optional on extended colors only, so it is checked on the raw
/// JSON before deserialization fills in the default.
fn check_primary_usage(value: &Value) -> Result<(), AnalysisError> {
    let Some(primary) = value.pointer("/colors/primary").and_then(Value::as_array) else {
        return Ok(());
    };
    for color in primary {
        if color.get("usage").and_then(Value::as_f64).is_none() {
            let hex = color.get("hex").and_then(Value::as_str).unwrap_or("?");
            return Err(AnalysisError::parse(format!(
                "Primary color {hex} has no numeric usage"
            )));
        }
    }
    Ok(())
}

fn normalize(payload: &mut AnalysisPayload) {
    let scale = &mut payload.spacing.scale;
    scale.retain(|v| v.is_finite());
    scale.sort_by(f64::total_cmp);
    scale.dedup();

    for color in payload
        .colors
        .primary
        .iter_mut()
        .chain(payload.colors.extended.iter_mut())
    {
        color.usage = if color.usage.is_finite() {
            color.usage.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}

fn validate(payload: &AnalysisPayload) -> Result<(), AnalysisError> {
    if let Some(color) = payload
        .colors
        .primary
        .iter()
        .find(|color| matches!(color.role, ColorRole::Custom(_)))
    {
        let allowed: Vec<&str> = ColorRole::named().iter().map(ColorRole::as_str).collect();
        return Err(AnalysisError::parse(format!(
            "Primary color {} has role '{}' (expected one of {})",
            color.hex,
            color.role,
            allowed.join(", ")
        )));
    }
    let base_unit = payload.spacing.base_unit;
    if !(base_unit.is_finite() && base_unit > 0.0) {
        return Err(AnalysisError::parse(format!(
            "Spacing base unit must be positive, got {base_unit}"
        )));
    }
    if let Some(style) = payload
        .typography
        .iter()
        .find(|style| !(style.font_size_px.is_finite() && style.font_size_px > 0.0))
    {
        return Err(AnalysisError::parse(format!(
            "Type style '{}' has a non-positive font size ({})",
            style.label, style.font_size_px
        )));
    }
    Ok(())
}
