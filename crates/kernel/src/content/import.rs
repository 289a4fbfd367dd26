//! Legacy HTML import.
//!
//! Articles written before structured content existed are stored as raw
//! HTML. This module rebuilds an approximate section/element tree from that
//! HTML with a non-validating tag scan: only `<section>`, `<h2>`, `<h3>` and
//! `<p>` are recognized, and matches are re-ordered by their byte offset so
//! the original reading order is kept.

use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{ContentElement, ContentSection, ElementType, StructuredContent};

// The patterns are literals; construction cannot fail at runtime.
#[allow(clippy::expect_used)]
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<section(?:\s[^>]*)?>(.*?)</section\s*>").expect("valid section pattern")
});

#[allow(clippy::expect_used)]
static TAG_PATTERNS: LazyLock<[(ElementType, Regex); 3]> = LazyLock::new(|| {
    [
        (
            ElementType::H2,
            Regex::new(r"(?is)<h2(?:\s[^>]*)?>(.*?)</h2\s*>").expect("valid h2 pattern"),
        ),
        (
            ElementType::H3,
            Regex::new(r"(?is)<h3(?:\s[^>]*)?>(.*?)</h3\s*>").expect("valid h3 pattern"),
        ),
        (
            ElementType::Paragraph,
            Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>").expect("valid p pattern"),
        ),
    ]
});

/// A recognized tag inside a block of HTML.
#[derive(Debug)]
struct TagMatch {
    offset: usize,
    element_type: ElementType,
    text: String,
}

/// Import raw HTML into structured content.
///
/// The result always has at least one section. If no heading or paragraph
/// tag is found anywhere, the whole input becomes a single paragraph so no
/// content is silently dropped.
///
/// Captured element text is trimmed. Legacy HTML indents text inside its
/// tags, and the exporter never writes whitespace there, so leading or
/// trailing whitespace in an element's content does not survive a
/// fragment round trip.
pub fn import_html(html: &str) -> StructuredContent {
    if html.trim().is_empty() {
        return StructuredContent::single_empty_section();
    }

    let blocks: Vec<&str> = SECTION_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let scanned: Vec<(&str, Vec<TagMatch>)> = if blocks.is_empty() {
        vec![(html, scan_tags(html))]
    } else {
        blocks
            .into_iter()
            .map(|block| (block, scan_tags(block)))
            .collect()
    };

    let total_matches: usize = scanned.iter().map(|(_, matches)| matches.len()).sum();
    if total_matches == 0 {
        tracing::debug!(len = html.len(), "no recognized tags, importing as one paragraph");
        return StructuredContent::new(vec![ContentSection::with_elements(vec![
            ContentElement::paragraph(html),
        ])]);
    }

    let sections = scanned
        .into_iter()
        .map(|(block, matches)| {
            if matches.is_empty() {
                // Keep untagged text from this block rather than drop it.
                let inner = block.trim();
                if inner.is_empty() {
                    return ContentSection::new();
                }
                return ContentSection::with_elements(vec![ContentElement::paragraph(inner)]);
            }

            ContentSection::with_elements(
                matches
                    .into_iter()
                    .map(|m| ContentElement::with_text(m.element_type, m.text))
                    .collect(),
            )
        })
        .collect();

    StructuredContent::new(sections)
}

/// Find all recognized tags in `html`, sorted by starting offset.
fn scan_tags(html: &str) -> Vec<TagMatch> {
    let mut matches: Vec<TagMatch> = TAG_PATTERNS
        .iter()
        .flat_map(|(element_type, re)| {
            re.captures_iter(html).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let inner = caps.get(1)?;
                Some(TagMatch {
                    offset: whole.start(),
                    element_type: element_type.clone(),
                    text: inner.as_str().trim().to_string(),
                })
            })
        })
        .collect();

    matches.sort_by_key(|m| m.offset);
    matches
}
