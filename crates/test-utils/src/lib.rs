//! Inkwell test utilities.
//!
//! Fixture builders for integration tests. Everything is produced as
//! `serde_json::Value` in the wire format the API accepts, so tests exercise
//! the same deserialization path as real clients.

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Password used for every fixture account.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Legacy body from before structured content: two sections, headings and
/// paragraphs.
pub const LEGACY_TWO_SECTIONS: &str = "<section><h2>Intro</h2><p>First paragraph.</p></section>\
<section><h3>Details</h3><p>Second paragraph.</p><p>Third paragraph.</p></section>";

fn element_id() -> String {
    Uuid::now_v7().to_string()
}

/// An `h2` element.
pub fn h2(text: &str) -> JsonValue {
    json!({ "id": element_id(), "type": "h2", "content": text })
}

/// An `h3` element.
pub fn h3(text: &str) -> JsonValue {
    json!({ "id": element_id(), "type": "h3", "content": text })
}

/// A paragraph element.
pub fn paragraph(text: &str) -> JsonValue {
    json!({ "id": element_id(), "type": "paragraph", "content": text })
}

/// A list element.
pub fn list(items: &[&str]) -> JsonValue {
    json!({ "id": element_id(), "type": "list", "content": "", "listItems": items })
}

/// An image element.
pub fn image(url: &str, alt: &str, caption: &str) -> JsonValue {
    json!({ "id": element_id(), "type": "image", "content": caption, "url": url, "alt": alt })
}

/// A video element.
pub fn video(url: &str, caption: &str) -> JsonValue {
    json!({ "id": element_id(), "type": "video", "content": caption, "url": url })
}

/// A section holding `elements`.
pub fn section(elements: Vec<JsonValue>) -> JsonValue {
    json!({ "id": element_id(), "elements": elements })
}

/// Create a test article with default values.
pub fn test_article(title: &str) -> TestArticle {
    TestArticle {
        title: title.to_string(),
        slug: None,
        excerpt: String::new(),
        author: String::new(),
        status: "draft".to_string(),
        main_image_url: String::new(),
        main_image_alt: String::new(),
        intro_text: String::new(),
        sections: vec![section(vec![h2(title), paragraph("Body text.")])],
        field_values: json!({}),
    }
}

/// An article form builder for request bodies.
#[derive(Debug, Clone)]
pub struct TestArticle {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: String,
    pub author: String,
    pub status: String,
    pub main_image_url: String,
    pub main_image_alt: String,
    pub intro_text: String,
    pub sections: Vec<JsonValue>,
    pub field_values: JsonValue,
}

impl TestArticle {
    /// Set an explicit slug. Without one the server derives it from the title.
    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    pub fn with_excerpt(mut self, excerpt: &str) -> Self {
        self.excerpt = excerpt.to_string();
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn with_intro(mut self, intro: &str) -> Self {
        self.intro_text = intro.to_string();
        self
    }

    pub fn with_main_image(mut self, url: &str, alt: &str) -> Self {
        self.main_image_url = url.to_string();
        self.main_image_alt = alt.to_string();
        self
    }

    /// Set as published.
    pub fn published(mut self) -> Self {
        self.status = "published".to_string();
        self
    }

    /// Replace the body.
    pub fn with_sections(mut self, sections: Vec<JsonValue>) -> Self {
        self.sections = sections;
        self
    }

    /// Add a pending field value for an element.
    pub fn with_field_value(mut self, element_id: &str, edit: JsonValue) -> Self {
        if let Some(values) = self.field_values.as_object_mut() {
            values.insert(element_id.to_string(), edit);
        }
        self
    }

    /// Request body for create, update and preview.
    pub fn to_json(&self) -> JsonValue {
        let mut body = json!({
            "title": self.title,
            "excerpt": self.excerpt,
            "author": self.author,
            "status": self.status,
            "main_image_url": self.main_image_url,
            "main_image_alt": self.main_image_alt,
            "intro_text": self.intro_text,
            "structured_content": self.sections,
            "field_values": self.field_values,
        });
        if let (Some(slug), Some(object)) = (&self.slug, body.as_object_mut()) {
            object.insert("slug".to_string(), json!(slug));
        }
        body
    }
}

/// Credentials request body.
pub fn credentials(email: &str, password: &str) -> JsonValue {
    json!({ "email": email, "password": password })
}

/// Assert that a JSON value contains a specific key with expected value.
pub fn assert_json_field(json: &JsonValue, key: &str, expected: &JsonValue) {
    let actual = json.get(key);
    assert!(actual.is_some(), "expected key '{key}' not found in JSON");
    assert_eq!(
        actual,
        Some(expected),
        "key '{key}' has unexpected value"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn article_body_has_form_fields() {
        let body = test_article("Hello").with_slug("hello").published().to_json();
        assert_json_field(&body, "title", &json!("Hello"));
        assert_json_field(&body, "slug", &json!("hello"));
        assert_json_field(&body, "status", &json!("published"));
        assert_eq!(body["structured_content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn slug_omitted_by_default() {
        let body = test_article("Hello").to_json();
        assert!(body.get("slug").is_none());
    }

    #[test]
    fn element_ids_are_unique() {
        assert_ne!(paragraph("a")["id"], paragraph("a")["id"]);
    }

    #[test]
    fn field_values_keyed_by_element() {
        let body = test_article("Hello")
            .with_field_value("abc", json!({ "content": "typed" }))
            .to_json();
        assert_eq!(body["field_values"]["abc"]["content"], "typed");
    }
}
