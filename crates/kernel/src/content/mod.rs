//! Structured article content.
//!
//! This module provides:
//! - Block model: sections of typed elements, persisted as JSON
//! - Codec: decoding of persisted values (JSON, legacy marker, raw HTML)
//! - Importer: best-effort conversion of legacy HTML into sections
//! - Exporter: fragment HTML and standalone SEO documents
//! - ContentEditor: mutable editing state with a single commit point
//! - SEO scorer: completeness score for the article form

pub mod blocks;
pub mod codec;
pub mod editor;
pub mod export;
pub mod import;
pub mod seo;

pub use blocks::{ContentElement, ContentSection, ElementType, StructuredContent};
pub use codec::{DecodedContent, decode_content};
pub use editor::{ContentEditor, ElementEdit, FieldValues, InitialContent, SerializedContent};
pub use export::{DocumentMeta, render_document, render_fragment, youtube_video_id};
pub use import::import_html;
pub use seo::{SeoInput, SeoReport};
