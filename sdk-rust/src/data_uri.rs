//! Parsing of `data:` URIs into image parts.
//!
//! Uploads reach the OCR flow as `data:image/png;base64,iVBOR...`. Only
//! base64-encoded image payloads are accepted.

use crate::{ImagePart, LanguageModelError, LanguageModelResult};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Split a `data:<mime>;base64,<payload>` URI into an [`ImagePart`].
///
/// The payload is checked to be valid base64 but is kept encoded, since every
/// provider wants it that way on the wire.
pub fn parse_image_data_uri(uri: &str) -> LanguageModelResult<ImagePart> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| LanguageModelError::InvalidInput("Expected a data: URI".to_string()))?;

    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        LanguageModelError::InvalidInput("Data URI is missing the ',' separator".to_string())
    })?;

    let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
        LanguageModelError::InvalidInput("Data URI payload must be base64 encoded".to_string())
    })?;

    if !mime_type.starts_with("image/") {
        return Err(LanguageModelError::InvalidInput(format!(
            "Expected an image data URI, got '{mime_type}'"
        )));
    }

    if payload.is_empty() {
        return Err(LanguageModelError::InvalidInput(
            "Data URI payload is empty".to_string(),
        ));
    }

    STANDARD.decode(payload).map_err(|error| {
        LanguageModelError::InvalidInput(format!("Invalid base64 in data URI: {error}"))
    })?;

    Ok(ImagePart::new(payload, mime_type))
}

/// Reassemble an image part into a `data:` URI.
#[must_use]
pub fn to_data_uri(image: &ImagePart) -> String {
    format!("data:{};base64,{}", image.mime_type, image.data)
}
