//! Image intake and session-local image handles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, bail};
use base64::Engine;

/// MIME types accepted for analysis.
pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Prefix of the handles issued by [`ImageRegistry`].
pub const HANDLE_PREFIX: &str = "blob:snappal/";

/// Raw image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SourceImage {
    /// Returns the bytes as standard base64 without any data-URL prefix.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Normalizes user-provided file paths.
///
/// Handles common drag-and-drop shell escaping (`\ `, `\(`, `\)`) and
/// expands `~/` to the HOME directory when available.
#[must_use]
pub fn normalize_input_path(path: &str) -> PathBuf {
    let unescaped = path
        .trim()
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    let path = Path::new(&unescaped);
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    path.to_path_buf()
}

/// Returns MIME type inferred from file extension for supported image formats.
#[must_use]
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Detects the MIME type from magic bytes, falling back to the extension.
///
/// Returns `None` for anything that is not a supported raster image.
pub fn detect_mime_type(bytes: &[u8], path: Option<&Path>) -> Option<&'static str> {
    if let Some(kind) = infer::get(bytes) {
        let mime = kind.mime_type();
        return SUPPORTED_MIME_TYPES.iter().copied().find(|m| *m == mime);
    }
    path.and_then(mime_type_for_extension)
}

/// Reads an image file for analysis.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a supported image.
pub fn load_image(path: &Path) -> Result<SourceImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read image {}", path.display()))?;
    let Some(mime_type) = detect_mime_type(&bytes, Some(path)) else {
        bail!(
            "{} is not an image (supported: PNG, JPEG, WebP, GIF)",
            path.display()
        );
    };
    tracing::debug!(path = %path.display(), mime_type, size = bytes.len(), "loaded image");
    Ok(SourceImage {
        bytes,
        mime_type: mime_type.to_string(),
    })
}

/// Strips a `data:<mime>;base64,` prefix, returning the payload.
pub fn strip_data_url_prefix(data: &str) -> &str {
    match data.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => data,
    }
}

/// Parses a `data:image/...;base64,...` URL into an image.
///
/// # Errors
/// Returns an error if the URL is malformed, not base64, or not an image.
pub fn parse_data_url(url: &str) -> Result<SourceImage> {
    let Some((header, _)) = url.split_once(',') else {
        bail!("malformed data URL");
    };
    let declared = header
        .strip_prefix("data:")
        .and_then(|rest| rest.strip_suffix(";base64"))
        .context("only base64 data URLs are supported")?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(strip_data_url_prefix(url).trim())
        .context("decode base64 image data")?;

    let mime_type = detect_mime_type(&bytes, None)
        .or_else(|| SUPPORTED_MIME_TYPES.iter().copied().find(|m| *m == declared))
        .with_context(|| format!("data URL is not a supported image ({declared})"))?;

    Ok(SourceImage {
        bytes,
        mime_type: mime_type.to_string(),
    })
}

/// Loads an image from either a file path or a data URL.
///
/// # Errors
/// Returns an error if the input cannot be read or is not a supported image.
pub fn load_image_input(input: &str) -> Result<SourceImage> {
    if input.trim_start().starts_with("data:") {
        parse_data_url(input.trim())
    } else {
        load_image(&normalize_input_path(input))
    }
}

/// Session-local handles to analyzed image bytes.
///
/// Handles are only meaningful inside the process that issued them; a handle
/// read back from persisted history after a restart resolves to nothing.
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    inner: Arc<Mutex<HashMap<String, SourceImage>>>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the image and returns a fresh handle for it.
    pub fn register(&self, image: SourceImage) -> String {
        let handle = format!("{HANDLE_PREFIX}{}", uuid::Uuid::new_v4());
        self.lock().insert(handle.clone(), image);
        handle
    }

    /// The image behind a handle, if this registry issued it and it has not
    /// been revoked.
    pub fn resolve(&self, handle: &str) -> Option<SourceImage> {
        self.lock().get(handle).cloned()
    }

    /// Releases the bytes behind a handle. Returns `true` if it was live.
    pub fn revoke(&self, handle: &str) -> bool {
        let removed = self.lock().remove(handle).is_some();
        if removed {
            tracing::debug!(handle, "released image handle");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SourceImage>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
