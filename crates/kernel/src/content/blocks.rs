//! Structured content model.
//!
//! An article body is an ordered list of sections, each holding an ordered
//! list of elements drawn from a closed set of six types. This is the shape
//! persisted as JSON in the `content` column:
//!
//! ```json
//! [{ "id": "…", "elements": [{ "id": "…", "type": "h2", "content": "Intro" }] }]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh opaque identifier for a section or element.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// The type of a content element.
///
/// Unknown type strings survive a decode/encode cycle as [`ElementType::Other`]
/// and render as paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    H2,
    H3,
    Paragraph,
    Image,
    Video,
    List,
    Other(String),
}

impl ElementType {
    /// The six types the editor can create.
    pub const ALL: [ElementType; 6] = [
        ElementType::H2,
        ElementType::H3,
        ElementType::Paragraph,
        ElementType::Image,
        ElementType::Video,
        ElementType::List,
    ];

    /// Machine name as stored in JSON.
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::H2 => "h2",
            ElementType::H3 => "h3",
            ElementType::Paragraph => "paragraph",
            ElementType::Image => "image",
            ElementType::Video => "video",
            ElementType::List => "list",
            ElementType::Other(name) => name,
        }
    }

    /// Human-readable label for element pickers.
    pub fn label(&self) -> &str {
        match self {
            ElementType::H2 => "Heading 2",
            ElementType::H3 => "Heading 3",
            ElementType::Paragraph => "Paragraph",
            ElementType::Image => "Image",
            ElementType::Video => "Video",
            ElementType::List => "List",
            ElementType::Other(name) => name,
        }
    }

    /// Whether this type carries a media `url`.
    pub fn is_media(&self) -> bool {
        matches!(self, ElementType::Image | ElementType::Video)
    }
}

impl From<String> for ElementType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "h2" => ElementType::H2,
            "h3" => ElementType::H3,
            "paragraph" => ElementType::Paragraph,
            "image" => ElementType::Image,
            "video" => ElementType::Video,
            "list" => ElementType::List,
            _ => ElementType::Other(value),
        }
    }
}

impl From<ElementType> for String {
    fn from(value: ElementType) -> Self {
        match value {
            ElementType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One semantic unit inside a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentElement {
    #[serde(default = "new_id")]
    pub id: String,

    #[serde(rename = "type")]
    pub element_type: ElementType,

    /// Heading or paragraph text, or the caption of an image/video.
    #[serde(default)]
    pub content: String,

    /// Media source for image and video elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Accessibility text for image elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Bullet text for list elements, in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<String>>,
}

impl ContentElement {
    /// Create an empty element of the given type with a fresh id.
    ///
    /// Lists start with a single empty item so they always render.
    pub fn new(element_type: ElementType) -> Self {
        let (url, alt, list_items) = match element_type {
            ElementType::Image => (Some(String::new()), Some(String::new()), None),
            ElementType::Video => (Some(String::new()), None, None),
            ElementType::List => (None, None, Some(vec![String::new()])),
            _ => (None, None, None),
        };

        Self {
            id: new_id(),
            element_type,
            content: String::new(),
            url,
            alt,
            list_items,
        }
    }

    /// Create an element of the given type holding `text`.
    pub fn with_text(element_type: ElementType, text: impl Into<String>) -> Self {
        let mut element = Self::new(element_type);
        element.content = text.into();
        element
    }

    pub fn heading2(text: impl Into<String>) -> Self {
        Self::with_text(ElementType::H2, text)
    }

    pub fn heading3(text: impl Into<String>) -> Self {
        Self::with_text(ElementType::H3, text)
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_text(ElementType::Paragraph, text)
    }

    /// Create an image element.
    pub fn image(url: impl Into<String>, alt: impl Into<String>, caption: impl Into<String>) -> Self {
        let mut element = Self::new(ElementType::Image);
        element.url = Some(url.into());
        element.alt = Some(alt.into());
        element.content = caption.into();
        element
    }

    /// Create a video element.
    pub fn video(url: impl Into<String>, caption: impl Into<String>) -> Self {
        let mut element = Self::new(ElementType::Video);
        element.url = Some(url.into());
        element.content = caption.into();
        element
    }

    /// Create a list element from its items.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut element = Self::new(ElementType::List);
        element.list_items = Some(items.into_iter().map(Into::into).collect());
        element
    }

    /// Check the per-type required fields.
    pub fn is_well_formed(&self) -> bool {
        match self.element_type {
            ElementType::List => self.list_items.is_some(),
            ElementType::Image | ElementType::Video => self.url.is_some(),
            _ => true,
        }
    }
}

/// An ordered container of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default = "new_id")]
    pub id: String,

    /// Optional section title. Not rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub elements: Vec<ContentElement>,
}

impl ContentSection {
    /// Create an empty section with a fresh id.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            title: None,
            elements: Vec::new(),
        }
    }

    /// Create a section holding the given elements.
    pub fn with_elements(elements: Vec<ContentElement>) -> Self {
        Self {
            elements,
            ..Self::new()
        }
    }

    /// Find an element by id.
    pub fn element(&self, element_id: &str) -> Option<&ContentElement> {
        self.elements.iter().find(|e| e.id == element_id)
    }

    /// Find an element by id for mutation.
    pub fn element_mut(&mut self, element_id: &str) -> Option<&mut ContentElement> {
        self.elements.iter_mut().find(|e| e.id == element_id)
    }
}

impl Default for ContentSection {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete article body: the persisted list of sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredContent(pub Vec<ContentSection>);

impl StructuredContent {
    pub fn new(sections: Vec<ContentSection>) -> Self {
        Self(sections)
    }

    /// A document with a single empty section.
    pub fn single_empty_section() -> Self {
        Self(vec![ContentSection::new()])
    }

    /// Parse persisted JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn sections(&self) -> &[ContentSection] {
        &self.0
    }

    pub fn into_sections(self) -> Vec<ContentSection> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of elements across all sections.
    pub fn element_count(&self) -> usize {
        self.0.iter().map(|s| s.elements.len()).sum()
    }

    /// Whether every element carries its type's required fields.
    pub fn is_well_formed(&self) -> bool {
        self.0
            .iter()
            .flat_map(|s| s.elements.iter())
            .all(ContentElement::is_well_formed)
    }
}

impl From<Vec<ContentSection>> for StructuredContent {
    fn from(sections: Vec<ContentSection>) -> Self {
        Self(sections)
    }
}
