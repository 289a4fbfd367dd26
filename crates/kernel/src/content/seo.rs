//! SEO completeness score.
//!
//! A presentational aid shown next to the article form. It never gates
//! validation or saving.

use serde::Serialize;

/// Weight of each mandatory signal.
const MANDATORY_WEIGHT: f64 = 1.0;

/// Weight of each optional signal.
const OPTIONAL_WEIGHT: f64 = 0.5;

/// Weight of each structure signal.
const STRUCTURE_WEIGHT: f64 = 0.25;

/// Content must be longer than this many characters to count.
const MIN_CONTENT_CHARS: usize = 300;

/// Values the score is computed from.
#[derive(Debug, Clone, Default)]
pub struct SeoInput<'a> {
    pub title: &'a str,
    pub excerpt: &'a str,
    /// Article body as displayed (fragment HTML).
    pub content: &'a str,
    pub slug: &'a str,
    pub author: &'a str,
    pub intro_text: &'a str,
    pub main_image_url: &'a str,
    pub main_image_alt: &'a str,
    /// Exported HTML checked for structural markers.
    pub html: &'a str,
}

/// Signal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Mandatory,
    Optional,
    Structure,
}

impl SignalKind {
    fn weight(self) -> f64 {
        match self {
            SignalKind::Mandatory => MANDATORY_WEIGHT,
            SignalKind::Optional => OPTIONAL_WEIGHT,
            SignalKind::Structure => STRUCTURE_WEIGHT,
        }
    }
}

/// One evaluated signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoSignal {
    pub name: &'static str,
    pub kind: SignalKind,
    pub passed: bool,
}

/// Score plus the signals it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoReport {
    /// Integer score in `0..=100`.
    pub score: u8,
    pub signals: Vec<SeoSignal>,
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True when `html` contains an opening `<tag>` or `<tag ...>`.
fn has_tag(html: &str, tag: &str) -> bool {
    html.match_indices('<').any(|(at, _)| {
        let rest = &html[at + 1..];
        rest.strip_prefix(tag)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
    })
}

/// Evaluate every signal for `input`.
pub fn evaluate(input: &SeoInput<'_>) -> SeoReport {
    let html = input.html;
    let has_image = present(input.main_image_url);

    let checks = [
        ("title", SignalKind::Mandatory, present(input.title)),
        ("excerpt", SignalKind::Mandatory, present(input.excerpt)),
        (
            "content_length",
            SignalKind::Mandatory,
            input.content.chars().count() > MIN_CONTENT_CHARS,
        ),
        ("slug", SignalKind::Mandatory, present(input.slug)),
        ("author", SignalKind::Optional, present(input.author)),
        ("intro_text", SignalKind::Optional, present(input.intro_text)),
        ("main_image", SignalKind::Optional, has_image),
        (
            "main_image_alt",
            SignalKind::Optional,
            has_image && present(input.main_image_alt),
        ),
        ("h2", SignalKind::Structure, has_tag(html, "h2")),
        ("h3", SignalKind::Structure, has_tag(html, "h3")),
        ("paragraph", SignalKind::Structure, has_tag(html, "p")),
        (
            "list",
            SignalKind::Structure,
            has_tag(html, "ul") || has_tag(html, "ol"),
        ),
    ];

    let max: f64 = checks.iter().map(|(_, kind, _)| kind.weight()).sum();
    let achieved: f64 = checks
        .iter()
        .filter(|(_, _, passed)| *passed)
        .map(|(_, kind, _)| kind.weight())
        .sum();

    let score = (100.0 * achieved / max).round().clamp(0.0, 100.0) as u8;

    SeoReport {
        score,
        signals: checks
            .into_iter()
            .map(|(name, kind, passed)| SeoSignal { name, kind, passed })
            .collect(),
    }
}

/// Compute only the score for `input`.
pub fn score(input: &SeoInput<'_>) -> u8 {
    evaluate(input).score
}
