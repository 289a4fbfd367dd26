//! Live editing state for an article body.
//!
//! [`ContentEditor`] owns the section tree for one editing session. Structural
//! operations (add, remove, move) mutate the tree directly and report whether
//! anything changed so the caller knows to re-render. Field values typed into
//! the presentation layer are committed either one element at a time through
//! [`ContentEditor::update_element`] or in bulk by
//! [`ContentEditor::collect_and_serialize`], which is also the point where the
//! JSON and fragment HTML are produced for saving.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::blocks::{ContentElement, ContentSection, ElementType, StructuredContent};
use super::codec::decode_content;
use super::export::render_fragment;

/// The value an editing session starts from.
#[derive(Debug, Clone)]
pub enum InitialContent {
    /// Already-parsed sections.
    Sections(Vec<ContentSection>),
    /// A persisted string: JSON, legacy marker format, or raw HTML.
    Text(String),
    /// Nothing persisted yet.
    Empty,
}

impl From<Option<String>> for InitialContent {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) => InitialContent::Text(text),
            None => InitialContent::Empty,
        }
    }
}

/// Pending field values for one element.
///
/// Fields a type does not use are ignored when applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<String>>,
}

impl ElementEdit {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    fn apply(&self, element: &mut ContentElement) {
        if let Some(content) = &self.content {
            element.content.clone_from(content);
        }
        if element.element_type.is_media()
            && let Some(url) = &self.url
        {
            element.url = Some(url.clone());
        }
        if element.element_type == ElementType::Image
            && let Some(alt) = &self.alt
        {
            element.alt = Some(alt.clone());
        }
        if element.element_type == ElementType::List
            && let Some(items) = &self.list_items
        {
            element.list_items = Some(if items.is_empty() {
                vec![String::new()]
            } else {
                items.clone()
            });
        }
    }
}

/// Field values collected from the presentation layer, keyed by element id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(pub HashMap<String, ElementEdit>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element_id: impl Into<String>, edit: ElementEdit) {
        self.0.insert(element_id.into(), edit);
    }

    pub fn get(&self, element_id: &str) -> Option<&ElementEdit> {
        self.0.get(element_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of [`ContentEditor::collect_and_serialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedContent {
    /// Persisted JSON form.
    pub json: String,
    /// Fragment HTML for preview and the `content` display field.
    pub html: String,
    /// The committed tree.
    pub content: StructuredContent,
}

/// Mutable section tree for one editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEditor {
    sections: Vec<ContentSection>,
}

impl Default for ContentEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentEditor {
    /// Start with a single empty section.
    pub fn new() -> Self {
        Self {
            sections: vec![ContentSection::new()],
        }
    }

    /// Start from a persisted or parsed initial value.
    ///
    /// Strings are decoded as JSON first, then the legacy marker format, and
    /// finally imported as HTML. Empty input or an empty section list starts
    /// from one empty section.
    pub fn from_initial(initial: InitialContent) -> Self {
        let sections = match initial {
            InitialContent::Sections(sections) => sections,
            InitialContent::Text(text) if text.trim().is_empty() => Vec::new(),
            InitialContent::Text(text) => decode_content(&text).into_structured().into_sections(),
            InitialContent::Empty => Vec::new(),
        };

        if sections.is_empty() {
            return Self::new();
        }
        Self { sections }
    }

    /// Start from an already-structured tree.
    pub fn from_content(content: StructuredContent) -> Self {
        Self::from_initial(InitialContent::Sections(content.into_sections()))
    }

    pub fn sections(&self) -> &[ContentSection] {
        &self.sections
    }

    pub fn section(&self, section_id: &str) -> Option<&ContentSection> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    fn section_mut(&mut self, section_id: &str) -> Option<&mut ContentSection> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    /// Snapshot of the current tree.
    pub fn content(&self) -> StructuredContent {
        StructuredContent::new(self.sections.clone())
    }

    /// Append an empty section and return its id.
    pub fn add_section(&mut self) -> String {
        let section = ContentSection::new();
        let id = section.id.clone();
        self.sections.push(section);
        id
    }

    /// Remove a section. Removing the last section is allowed here; callers
    /// that need at least one section must guard against it.
    pub fn remove_section(&mut self, section_id: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.id != section_id);
        self.sections.len() != before
    }

    /// Append a new element of `element_type` to a section.
    pub fn add_element(&mut self, section_id: &str, element_type: ElementType) -> Option<String> {
        let section = self.section_mut(section_id)?;
        let element = ContentElement::new(element_type);
        let id = element.id.clone();
        section.elements.push(element);
        Some(id)
    }

    pub fn remove_element(&mut self, section_id: &str, element_id: &str) -> bool {
        let Some(section) = self.section_mut(section_id) else {
            return false;
        };
        let before = section.elements.len();
        section.elements.retain(|e| e.id != element_id);
        section.elements.len() != before
    }

    /// Append an empty item to a list element.
    pub fn add_list_item(&mut self, section_id: &str, element_id: &str) -> bool {
        let Some(element) = self
            .section_mut(section_id)
            .and_then(|s| s.element_mut(element_id))
        else {
            return false;
        };
        if element.element_type != ElementType::List {
            return false;
        }
        element
            .list_items
            .get_or_insert_with(Vec::new)
            .push(String::new());
        true
    }

    /// Remove the item at `index` from a list element.
    ///
    /// Refused when the list would be left without items.
    pub fn remove_list_item(&mut self, section_id: &str, element_id: &str, index: usize) -> bool {
        let Some(items) = self
            .section_mut(section_id)
            .and_then(|s| s.element_mut(element_id))
            .and_then(|e| e.list_items.as_mut())
        else {
            return false;
        };
        if items.len() <= 1 || index >= items.len() {
            return false;
        }
        items.remove(index);
        true
    }

    pub fn move_element_up(&mut self, section_id: &str, index: usize) -> bool {
        let Some(section) = self.section_mut(section_id) else {
            return false;
        };
        if index == 0 || index >= section.elements.len() {
            return false;
        }
        section.elements.swap(index - 1, index);
        true
    }

    pub fn move_element_down(&mut self, section_id: &str, index: usize) -> bool {
        let Some(section) = self.section_mut(section_id) else {
            return false;
        };
        if index >= section.elements.len().saturating_sub(1) {
            return false;
        }
        section.elements.swap(index, index + 1);
        true
    }

    pub fn move_section_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.sections.len() {
            return false;
        }
        self.sections.swap(index - 1, index);
        true
    }

    pub fn move_section_down(&mut self, index: usize) -> bool {
        if index >= self.sections.len().saturating_sub(1) {
            return false;
        }
        self.sections.swap(index, index + 1);
        true
    }

    /// Commit the field values of a single element.
    pub fn update_element(&mut self, section_id: &str, element_id: &str, edit: &ElementEdit) -> bool {
        let Some(element) = self
            .section_mut(section_id)
            .and_then(|s| s.element_mut(element_id))
        else {
            return false;
        };
        edit.apply(element);
        true
    }

    /// Commit pending field values and serialize the tree.
    ///
    /// Values for element ids not present in the tree are ignored. The JSON
    /// form is never `[]`: an empty tree gains one empty section first.
    pub fn collect_and_serialize(
        &mut self,
        values: &FieldValues,
    ) -> Result<SerializedContent, serde_json::Error> {
        if !values.is_empty() {
            for element in self.sections.iter_mut().flat_map(|s| s.elements.iter_mut()) {
                if let Some(edit) = values.get(&element.id) {
                    edit.apply(element);
                }
            }
        }

        if self.sections.is_empty() {
            self.sections.push(ContentSection::new());
        }

        let content = self.content();
        Ok(SerializedContent {
            json: content.to_json()?,
            html: render_fragment(&content),
            content,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn first_section_id(editor: &ContentEditor) -> String {
        editor.sections()[0].id.clone()
    }

    fn texts(editor: &ContentEditor, section: usize) -> Vec<String> {
        editor.sections()[section]
            .elements
            .iter()
            .map(|e| e.content.clone())
            .collect()
    }

    fn editor_with_paragraphs(texts: &[&str]) -> ContentEditor {
        ContentEditor::from_content(StructuredContent::new(vec![ContentSection::with_elements(
            texts.iter().map(|t| ContentElement::paragraph(*t)).collect(),
        )]))
    }

    #[test]
    fn new_editor_has_one_empty_section() {
        let editor = ContentEditor::new();
        assert_eq!(editor.sections().len(), 1);
        assert!(editor.sections()[0].elements.is_empty());
    }

    #[test]
    fn initial_empty_values_start_with_one_section() {
        for initial in [
            InitialContent::Empty,
            InitialContent::Text(String::new()),
            InitialContent::Text("[]".to_string()),
            InitialContent::Sections(Vec::new()),
        ] {
            let editor = ContentEditor::from_initial(initial);
            assert_eq!(editor.sections().len(), 1);
            assert!(editor.sections()[0].elements.is_empty());
        }
    }

    #[test]
    fn initial_json_is_parsed() {
        let json = StructuredContent::new(vec![ContentSection::with_elements(vec![
            ContentElement::heading2("Hi"),
        ])])
        .to_json()
        .unwrap();
        let editor = ContentEditor::from_initial(InitialContent::Text(json));
        assert_eq!(editor.sections()[0].elements[0].element_type, ElementType::H2);
    }

    #[test]
    fn initial_html_is_imported() {
        let editor = ContentEditor::from_initial(InitialContent::Text(
            "<h2>A</h2><p>B</p>".to_string(),
        ));
        assert_eq!(texts(&editor, 0), vec!["A", "B"]);
    }

    #[test]
    fn initial_plain_text_becomes_paragraph() {
        let editor = ContentEditor::from_initial(Some("plain words".to_string()).into());
        assert_eq!(texts(&editor, 0), vec!["plain words"]);
    }

    #[test]
    fn add_and_remove_sections() {
        let mut editor = ContentEditor::new();
        let id = editor.add_section();
        assert_eq!(editor.sections().len(), 2);
        assert!(editor.remove_section(&id));
        assert!(!editor.remove_section("missing"));

        let first = first_section_id(&editor);
        assert!(editor.remove_section(&first));
        assert!(editor.sections().is_empty());
    }

    #[test]
    fn add_element_to_section() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        let id = editor.add_element(&section, ElementType::List).unwrap();
        let element = editor.section(&section).unwrap().element(&id).unwrap();
        assert_eq!(element.list_items, Some(vec![String::new()]));

        assert!(editor.add_element("missing", ElementType::H2).is_none());
    }

    #[test]
    fn remove_element_from_section() {
        let mut editor = editor_with_paragraphs(&["a", "b"]);
        let section = first_section_id(&editor);
        let id = editor.sections()[0].elements[0].id.clone();
        assert!(editor.remove_element(&section, &id));
        assert_eq!(texts(&editor, 0), vec!["b"]);
        assert!(!editor.remove_element(&section, &id));
    }

    #[test]
    fn list_items_never_drop_below_one() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        let list = editor.add_element(&section, ElementType::List).unwrap();

        assert!(!editor.remove_list_item(&section, &list, 0));
        assert!(editor.add_list_item(&section, &list));
        assert!(editor.remove_list_item(&section, &list, 1));
        assert!(!editor.remove_list_item(&section, &list, 0));

        let items = editor.sections()[0].elements[0].list_items.as_ref().unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn remove_list_item_out_of_range_is_noop() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        let list = editor.add_element(&section, ElementType::List).unwrap();
        editor.add_list_item(&section, &list);
        assert!(!editor.remove_list_item(&section, &list, 5));
    }

    #[test]
    fn add_list_item_requires_list() {
        let mut editor = editor_with_paragraphs(&["a"]);
        let section = first_section_id(&editor);
        let id = editor.sections()[0].elements[0].id.clone();
        assert!(!editor.add_list_item(&section, &id));
    }

    #[test]
    fn move_elements_within_bounds() {
        let mut editor = editor_with_paragraphs(&["a", "b", "c"]);
        let section = first_section_id(&editor);

        assert!(editor.move_element_up(&section, 2));
        assert_eq!(texts(&editor, 0), vec!["a", "c", "b"]);
        assert!(editor.move_element_down(&section, 0));
        assert_eq!(texts(&editor, 0), vec!["c", "a", "b"]);
    }

    #[test]
    fn move_elements_at_boundaries_is_noop() {
        let mut editor = editor_with_paragraphs(&["a", "b"]);
        let section = first_section_id(&editor);
        let before = editor.clone();

        assert!(!editor.move_element_up(&section, 0));
        assert!(!editor.move_element_down(&section, 1));
        assert!(!editor.move_element_down(&section, 7));
        assert_eq!(editor, before);
    }

    #[test]
    fn move_down_with_huge_index_is_noop() {
        let mut editor = editor_with_paragraphs(&["a", "b"]);
        let section = first_section_id(&editor);
        editor.add_section();
        let before = editor.clone();

        assert!(!editor.move_element_down(&section, usize::MAX));
        assert!(!editor.move_element_up(&section, usize::MAX));
        assert!(!editor.move_section_down(usize::MAX));
        assert!(!editor.move_section_up(usize::MAX));
        assert_eq!(editor, before);
    }

    #[test]
    fn move_down_in_empty_section_is_noop() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        assert!(!editor.move_element_down(&section, 0));

        editor.remove_section(&section);
        assert!(!editor.move_section_down(0));
    }

    #[test]
    fn move_sections_within_bounds() {
        let mut editor = ContentEditor::new();
        let first = first_section_id(&editor);
        let second = editor.add_section();

        assert!(!editor.move_section_up(0));
        assert!(!editor.move_section_down(1));
        assert!(editor.move_section_down(0));
        assert_eq!(editor.sections()[0].id, second);
        assert!(editor.move_section_up(1));
        assert_eq!(editor.sections()[0].id, first);
    }

    #[test]
    fn update_element_applies_type_relevant_fields() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        let id = editor.add_element(&section, ElementType::H2).unwrap();

        let edit = ElementEdit {
            content: Some("Heading".into()),
            url: Some("https://example.com".into()),
            ..ElementEdit::default()
        };
        assert!(editor.update_element(&section, &id, &edit));

        let element = editor.section(&section).unwrap().element(&id).unwrap();
        assert_eq!(element.content, "Heading");
        assert!(element.url.is_none());
    }

    #[test]
    fn collect_applies_field_values() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        let heading = editor.add_element(&section, ElementType::H2).unwrap();
        let image = editor.add_element(&section, ElementType::Image).unwrap();
        let list = editor.add_element(&section, ElementType::List).unwrap();

        let mut values = FieldValues::new();
        values.insert(heading.clone(), ElementEdit::content("Intro"));
        values.insert(
            image,
            ElementEdit {
                content: Some("Caption".into()),
                url: Some("https://example.com/a.png".into()),
                alt: Some("Alt".into()),
                list_items: None,
            },
        );
        values.insert(
            list,
            ElementEdit {
                list_items: Some(vec!["x".into(), "y".into()]),
                ..ElementEdit::default()
            },
        );
        values.insert("unknown", ElementEdit::content("ignored"));

        let out = editor.collect_and_serialize(&values).unwrap();
        assert_eq!(
            out.html,
            "<section><h2>Intro</h2>\
             <figure><img src=\"https://example.com/a.png\" alt=\"Alt\"><figcaption>Caption</figcaption></figure>\
             <ul><li>x</li><li>y</li></ul></section>"
        );
        assert_eq!(StructuredContent::from_json(&out.json).unwrap(), out.content);
        assert_eq!(editor.content(), out.content);
    }

    #[test]
    fn collect_on_empty_tree_synthesizes_a_section() {
        let mut editor = ContentEditor::new();
        let first = first_section_id(&editor);
        editor.remove_section(&first);

        let out = editor.collect_and_serialize(&FieldValues::new()).unwrap();
        let parsed = StructuredContent::from_json(&out.json).unwrap();
        assert_eq!(parsed.sections().len(), 1);
        assert!(parsed.sections()[0].elements.is_empty());
        assert_ne!(out.json, "[]");
        assert_eq!(out.html, "<section></section>");
    }

    #[test]
    fn empty_list_edit_keeps_one_item() {
        let mut editor = ContentEditor::new();
        let section = first_section_id(&editor);
        let list = editor.add_element(&section, ElementType::List).unwrap();
        let edit = ElementEdit {
            list_items: Some(Vec::new()),
            ..ElementEdit::default()
        };
        editor.update_element(&section, &list, &edit);
        let items = editor.sections()[0].elements[0].list_items.as_ref().unwrap();
        assert_eq!(items, &vec![String::new()]);
    }
}
