//! HTML export for structured content.
//!
//! Two outputs are produced from the same tree:
//! - a fragment of `<section>` elements for live preview and the `content`
//!   display field
//! - a standalone HTML document (metadata, Open Graph tags, inline styles)
//!   persisted as `generated_html`
//!
//! Inline text (headings, paragraphs, captions, list items) may contain
//! formatting markup. The fragment writes it exactly as stored so importing
//! the fragment gives back the same text. The standalone document is public
//! output and passes inline text through ammonia. Attribute values are
//! HTML-escaped in both.

use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{ContentElement, ContentSection, ElementType, StructuredContent};
use crate::routes::helpers::html_escape;

/// Length of every YouTube video id.
const YOUTUBE_ID_LEN: usize = 11;

// Matches the usual share, embed and watch URL shapes. The capture is
// accepted on length alone.
#[allow(clippy::expect_used)]
static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("valid youtube pattern")
});

/// Inline stylesheet for the standalone document.
const DOCUMENT_STYLES: &str = "\
body{margin:0;background:#fff;color:#1f2933;font-family:Georgia,'Times New Roman',serif;line-height:1.7}\
article{max-width:720px;margin:0 auto;padding:2rem 1.25rem}\
header h1{font-size:2.4rem;line-height:1.2;margin:0 0 .5rem}\
.byline{color:#616e7c;font-size:.95rem;margin:0 0 1.5rem}\
.byline a{color:inherit}\
.intro{font-size:1.2rem;color:#323f4b;margin:1.5rem 0}\
h2{font-size:1.7rem;margin:2.5rem 0 1rem}\
h3{font-size:1.3rem;margin:2rem 0 .75rem}\
p{margin:0 0 1.25rem}\
ul{padding-left:1.5rem;margin:0 0 1.25rem}\
figure{margin:2rem 0}\
figure img,figure video{display:block;max-width:100%;height:auto}\
figure.video iframe{width:100%;aspect-ratio:16/9;border:0}\
figcaption{color:#616e7c;font-size:.9rem;margin-top:.5rem;text-align:center}";

/// Sanitize inline rich text, allowing only safe formatting markup.
fn sanitize_text(input: &str) -> String {
    ammonia::clean(input)
}

/// How inline rich text is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineText {
    /// As stored.
    Verbatim,
    /// Through [`sanitize_text`].
    Sanitized,
}

impl InlineText {
    fn write(self, text: &str) -> String {
        match self {
            InlineText::Verbatim => text.to_string(),
            InlineText::Sanitized => sanitize_text(text),
        }
    }
}

/// Extract the video id from a YouTube URL.
///
/// Returns `None` when the URL does not look like YouTube or the captured id
/// is not exactly 11 characters long.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let caps = YOUTUBE_RE.captures(url)?;
    let id = caps.get(2)?.as_str();
    (id.chars().count() == YOUTUBE_ID_LEN).then(|| id.to_string())
}

/// Render structured content as a sequence of `<section>` fragments.
///
/// Inline text is written as stored.
pub fn render_fragment(content: &StructuredContent) -> String {
    render_sections(content, InlineText::Verbatim)
}

fn render_sections(content: &StructuredContent, inline: InlineText) -> String {
    content
        .sections()
        .iter()
        .map(|section| render_section_with(section, inline))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one section and its elements.
pub fn render_section(section: &ContentSection) -> String {
    render_section_with(section, InlineText::Verbatim)
}

fn render_section_with(section: &ContentSection, inline: InlineText) -> String {
    let mut html = String::from("<section>");
    for element in &section.elements {
        html.push_str(&render_element_with(element, inline));
    }
    html.push_str("</section>");
    html
}

/// Render a single element. Unknown types render as paragraphs.
pub fn render_element(element: &ContentElement) -> String {
    render_element_with(element, InlineText::Verbatim)
}

fn render_element_with(element: &ContentElement, inline: InlineText) -> String {
    match element.element_type {
        ElementType::H2 => format!("<h2>{}</h2>", inline.write(&element.content)),
        ElementType::H3 => format!("<h3>{}</h3>", inline.write(&element.content)),
        ElementType::List => render_list(element, inline),
        ElementType::Image => render_image(element, inline),
        ElementType::Video => render_video(element, inline),
        ElementType::Paragraph | ElementType::Other(_) => {
            format!("<p>{}</p>", inline.write(&element.content))
        }
    }
}

fn render_list(element: &ContentElement, inline: InlineText) -> String {
    let Some(items) = element.list_items.as_ref().filter(|items| !items.is_empty()) else {
        return String::new();
    };

    let mut html = String::from("<ul>");
    for item in items {
        html.push_str(&format!("<li>{}</li>", inline.write(item)));
    }
    html.push_str("</ul>");
    html
}

fn render_image(element: &ContentElement, inline: InlineText) -> String {
    let url = html_escape(element.url.as_deref().unwrap_or_default());
    let alt = html_escape(element.alt.as_deref().unwrap_or_default());
    let caption = inline.write(&element.content);
    format!("<figure><img src=\"{url}\" alt=\"{alt}\"><figcaption>{caption}</figcaption></figure>")
}

fn render_video(element: &ContentElement, inline: InlineText) -> String {
    let url = element.url.as_deref().unwrap_or_default();
    let caption = inline.write(&element.content);

    let player = match youtube_video_id(url) {
        Some(id) => format!(
            "<iframe src=\"https://www.youtube.com/embed/{}\" title=\"YouTube video\" \
             allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" \
             allowfullscreen></iframe>",
            html_escape(&id)
        ),
        None => format!("<video controls src=\"{}\"></video>", html_escape(url)),
    };

    format!("<figure class=\"video\">{player}<figcaption>{caption}</figcaption></figure>")
}

/// Metadata wrapped around the sections in a standalone document.
///
/// Every field is optional; empty strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct DocumentMeta {
    pub title: String,
    pub description: String,
    pub author: String,
    pub author_link: String,
    pub publish_date: String,
    pub main_image_url: String,
    pub main_image_alt: String,
    pub main_image_caption: String,
    pub intro_text: String,
    pub lang: String,
    /// Publication name for `og:site_name`.
    pub site_name: String,
}

/// Render a complete HTML document for SEO preview and public display.
pub fn render_document(meta: &DocumentMeta, content: &StructuredContent) -> String {
    let lang = if meta.lang.is_empty() { "en" } else { &meta.lang };

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n");
    html.push_str(&format!("<html lang=\"{}\">\n<head>\n", html_escape(lang)));
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");

    if !meta.title.is_empty() {
        let title = html_escape(&meta.title);
        html.push_str(&format!("<title>{title}</title>\n"));
        html.push_str(&format!("<meta property=\"og:title\" content=\"{title}\">\n"));
    }
    if !meta.description.is_empty() {
        let description = html_escape(&meta.description);
        html.push_str(&format!("<meta name=\"description\" content=\"{description}\">\n"));
        html.push_str(&format!(
            "<meta property=\"og:description\" content=\"{description}\">\n"
        ));
    }
    if !meta.main_image_url.is_empty() {
        html.push_str(&format!(
            "<meta property=\"og:image\" content=\"{}\">\n",
            html_escape(&meta.main_image_url)
        ));
    }
    if !meta.site_name.is_empty() {
        html.push_str(&format!(
            "<meta property=\"og:site_name\" content=\"{}\">\n",
            html_escape(&meta.site_name)
        ));
    }
    html.push_str("<meta property=\"og:type\" content=\"article\">\n");
    html.push_str(&format!("<style>{DOCUMENT_STYLES}</style>\n"));
    html.push_str("</head>\n<body>\n<article>\n");

    if let Some(header) = render_header(meta) {
        html.push_str(&header);
        html.push('\n');
    }

    if !meta.main_image_url.is_empty() {
        html.push_str(&format!(
            "<figure class=\"main-image\"><img src=\"{}\" alt=\"{}\">",
            html_escape(&meta.main_image_url),
            html_escape(&meta.main_image_alt)
        ));
        if !meta.main_image_caption.is_empty() {
            html.push_str(&format!(
                "<figcaption>{}</figcaption>",
                sanitize_text(&meta.main_image_caption)
            ));
        }
        html.push_str("</figure>\n");
    }

    if !meta.intro_text.is_empty() {
        html.push_str(&format!(
            "<div class=\"intro\">{}</div>\n",
            sanitize_text(&meta.intro_text)
        ));
    }

    let fragment = render_sections(content, InlineText::Sanitized);
    if !fragment.is_empty() {
        html.push_str(&fragment);
        html.push('\n');
    }

    html.push_str("</article>\n</body>\n</html>\n");
    html
}

/// Title and byline. `None` when there is neither a title nor an author.
fn render_header(meta: &DocumentMeta) -> Option<String> {
    if meta.title.is_empty() && meta.author.is_empty() {
        return None;
    }

    let mut header = String::from("<header>");
    if !meta.title.is_empty() {
        header.push_str(&format!("<h1>{}</h1>", html_escape(&meta.title)));
    }

    if !meta.author.is_empty() {
        let author = html_escape(&meta.author);
        let name = if meta.author_link.is_empty() {
            author
        } else {
            format!(
                "<a href=\"{}\" rel=\"author\">{author}</a>",
                html_escape(&meta.author_link)
            )
        };
        header.push_str(&format!("<p class=\"byline\">By {name}"));
        if !meta.publish_date.is_empty() {
            let date = html_escape(&meta.publish_date);
            header.push_str(&format!(" · <time datetime=\"{date}\">{date}</time>"));
        }
        header.push_str("</p>");
    }

    header.push_str("</header>");
    Some(header)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn one_section(elements: Vec<ContentElement>) -> StructuredContent {
        StructuredContent::new(vec![ContentSection::with_elements(elements)])
    }

    #[test]
    fn renders_text_elements() {
        let content = one_section(vec![
            ContentElement::heading2("Title"),
            ContentElement::heading3("Sub"),
            ContentElement::paragraph("Body"),
        ]);
        assert_eq!(
            render_fragment(&content),
            "<section><h2>Title</h2><h3>Sub</h3><p>Body</p></section>"
        );
    }

    #[test]
    fn sections_are_separated_by_newlines() {
        let content = StructuredContent::new(vec![
            ContentSection::with_elements(vec![ContentElement::paragraph("a")]),
            ContentSection::new(),
        ]);
        assert_eq!(
            render_fragment(&content),
            "<section><p>a</p></section>\n<section></section>"
        );
    }

    #[test]
    fn renders_list_items_in_order() {
        let html = render_element(&ContentElement::list(["one", "two"]));
        assert_eq!(html, "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn empty_list_renders_nothing() {
        let mut list = ContentElement::list(Vec::<String>::new());
        assert_eq!(render_element(&list), "");
        list.list_items = None;
        assert_eq!(render_element(&list), "");
    }

    #[test]
    fn renders_image_figure() {
        let html = render_element(&ContentElement::image(
            "https://example.com/a.jpg",
            "A cat",
            "Our cat",
        ));
        assert_eq!(
            html,
            "<figure><img src=\"https://example.com/a.jpg\" alt=\"A cat\">\
             <figcaption>Our cat</figcaption></figure>"
        );
    }

    #[test]
    fn image_attributes_are_escaped() {
        let html = render_element(&ContentElement::image(
            "https://example.com/a.jpg?x=1&y=2",
            "say \"hi\"",
            "",
        ));
        assert!(html.contains("x=1&amp;y=2"));
        assert!(html.contains("alt=\"say &quot;hi&quot;\""));
    }

    #[test]
    fn youtube_video_embeds_iframe() {
        let html = render_element(&ContentElement::video(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "Classic",
        ));
        assert!(html.starts_with("<figure class=\"video\">"));
        assert!(html.contains("<iframe src=\"https://www.youtube.com/embed/dQw4w9WgXcQ\""));
        assert!(!html.contains("<video"));
        assert!(html.contains("<figcaption>Classic</figcaption>"));
    }

    #[test]
    fn other_video_uses_native_tag() {
        let html = render_element(&ContentElement::video("https://cdn.example.com/clip.mp4", ""));
        assert!(html.contains("<video controls src=\"https://cdn.example.com/clip.mp4\"></video>"));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn youtube_id_extraction() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?start=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_video_id("https://example.com/video.mp4"), None);
        assert_eq!(youtube_video_id("https://youtu.be/short"), None);
        assert_eq!(youtube_video_id(""), None);
    }

    #[test]
    fn youtube_id_accepts_any_eleven_characters() {
        assert_eq!(
            youtube_video_id("https://cdn.example.com/v/abcdefghijk").as_deref(),
            Some("abcdefghijk")
        );
    }

    #[test]
    fn unknown_type_renders_as_paragraph() {
        let element = ContentElement::with_text(ElementType::Other("quote".into()), "Quoted");
        assert_eq!(render_element(&element), "<p>Quoted</p>");
    }

    #[test]
    fn fragment_keeps_stored_text() {
        let text = "Fish & Chips, 1 < 2, <a href=\"https://example.com\">link</a>";
        let html = render_element(&ContentElement::paragraph(text));
        assert_eq!(html, format!("<p>{text}</p>"));
    }

    #[test]
    fn document_sanitizes_inline_markup() {
        let content = one_section(vec![
            ContentElement::paragraph("Hi <strong>there</strong><script>alert(1)</script>"),
            ContentElement::list(["<em>ok</em><script>x()</script>"]),
        ]);
        let html = render_document(&DocumentMeta::default(), &content);
        assert!(html.contains("<p>Hi <strong>there</strong></p>"));
        assert!(html.contains("<li><em>ok</em></li>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn document_contains_metadata_and_sections() {
        let meta = DocumentMeta {
            title: "My Post".into(),
            description: "A summary".into(),
            author: "Ada".into(),
            author_link: "https://example.com/ada".into(),
            publish_date: "2026-01-02".into(),
            main_image_url: "https://example.com/main.jpg".into(),
            main_image_alt: "Main".into(),
            main_image_caption: "Caption".into(),
            intro_text: "Intro words".into(),
            lang: String::new(),
            site_name: "Inkwell".into(),
        };
        let content = one_section(vec![ContentElement::paragraph("Body")]);
        let html = render_document(&meta, &content);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("<title>My Post</title>"));
        assert!(html.contains("<meta name=\"description\" content=\"A summary\">"));
        assert!(html.contains("<meta property=\"og:title\" content=\"My Post\">"));
        assert!(html.contains("<meta property=\"og:image\" content=\"https://example.com/main.jpg\">"));
        assert!(html.contains("<meta property=\"og:site_name\" content=\"Inkwell\">"));
        assert!(html.contains("<meta property=\"og:type\" content=\"article\">"));
        assert!(html.contains("<style>"));
        assert!(html.contains("<h1>My Post</h1>"));
        assert!(html.contains("<a href=\"https://example.com/ada\" rel=\"author\">Ada</a>"));
        assert!(html.contains("<time datetime=\"2026-01-02\">"));
        assert!(html.contains("<figure class=\"main-image\">"));
        assert!(html.contains("<div class=\"intro\">Intro words</div>"));
        assert!(html.contains("<section><p>Body</p></section>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn document_omits_empty_metadata() {
        let html = render_document(&DocumentMeta::default(), &StructuredContent::default());
        assert!(!html.contains("<title>"));
        assert!(!html.contains("name=\"description\""));
        assert!(!html.contains("og:image"));
        assert!(!html.contains("og:site_name"));
        assert!(!html.contains("<header>"));
        assert!(!html.contains("main-image"));
        assert!(!html.contains("class=\"intro\""));
        assert!(html.contains("<article>"));
    }

    #[test]
    fn document_escapes_title() {
        let meta = DocumentMeta {
            title: "Fish & <Chips>".into(),
            ..DocumentMeta::default()
        };
        let html = render_document(&meta, &StructuredContent::default());
        assert!(html.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }
}
