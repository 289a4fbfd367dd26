//! Decoding of the persisted `content` column.
//!
//! Three formats exist in the wild, tried in this order:
//! 1. a JSON array of well-formed sections (current format)
//! 2. the legacy marker format: `<!-- STRUCTURED_CONTENT_JSON:{json}-->`
//!    followed by pre-rendered HTML
//! 3. anything else is raw HTML from before structured content existed
//!
//! Decoding never fails; a value that matches no structured format is
//! returned as [`DecodedContent::RawHtml`].

use super::blocks::StructuredContent;
use super::import::import_html;

/// Opening marker of the legacy embedded-JSON format.
pub const LEGACY_MARKER: &str = "<!-- STRUCTURED_CONTENT_JSON:";

/// Closing marker of the legacy embedded-JSON format.
pub const LEGACY_SUFFIX: &str = "-->";

/// Result of decoding a persisted content value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedContent {
    /// A structured section tree.
    Structured(StructuredContent),
    /// Opaque HTML with no structured representation.
    RawHtml(String),
}

impl DecodedContent {
    /// Whether the value decoded to a structured tree.
    pub fn is_structured(&self) -> bool {
        matches!(self, DecodedContent::Structured(_))
    }

    /// Turn the decoded value into a tree, importing raw HTML if needed.
    pub fn into_structured(self) -> StructuredContent {
        match self {
            DecodedContent::Structured(content) => content,
            DecodedContent::RawHtml(html) => import_html(&html),
        }
    }
}

/// Decode a persisted content value.
///
/// JSON that parses but holds an element missing its type's required
/// fields is treated like any other non-structured value.
pub fn decode_content(raw: &str) -> DecodedContent {
    match StructuredContent::from_json(raw.trim()) {
        Ok(content) if content.is_well_formed() => return DecodedContent::Structured(content),
        Ok(_) => tracing::debug!("structured JSON has malformed elements"),
        Err(e) => tracing::debug!(error = %e, "content is not structured JSON"),
    }

    if let Some(content) = decode_legacy(raw) {
        return DecodedContent::Structured(content);
    }

    DecodedContent::RawHtml(raw.to_string())
}

/// Extract the embedded JSON of the legacy marker format.
fn decode_legacy(raw: &str) -> Option<StructuredContent> {
    let rest = raw.trim_start().strip_prefix(LEGACY_MARKER)?;
    let end = rest.find(LEGACY_SUFFIX)?;

    match StructuredContent::from_json(rest[..end].trim()) {
        Ok(content) if content.is_well_formed() => Some(content),
        Ok(_) => {
            tracing::debug!("legacy content marker holds malformed elements");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "legacy content marker holds invalid JSON");
            None
        }
    }
}

/// Encode content in the legacy marker format.
///
/// Only used to produce fixtures and by migration tooling; saves always
/// write plain JSON.
pub fn encode_legacy(content: &StructuredContent, html: &str) -> Result<String, serde_json::Error> {
    Ok(format!("{LEGACY_MARKER}{}{LEGACY_SUFFIX}{html}", content.to_json()?))
}
