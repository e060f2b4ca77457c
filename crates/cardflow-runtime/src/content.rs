#![forbid(unsafe_code)]

//! Content parsing for the three recognized kinds.
//!
//! Turns a fetched [`RawContent`] into the `(title, body)` pair a card
//! needs, selecting an optional fragment:
//!
//! - **structured**: title from the `title` field, else the first
//!   key/value pair; body from the field matching the fragment, else the
//!   serialized payload.
//! - **markup**: body from the element matching the fragment id, else the
//!   whole document; title from the `<title>` element, else a 3-word
//!   excerpt of the visible text.
//! - **plain text**: the first line becomes the title; the remainder is
//!   lightly reformatted — blank-line-separated blocks become paragraphs,
//!   single line breaks become `<br>`, and `[text](url)` tokens become
//!   hyperlinks.
//!
//! The markup scan is deliberately lightweight: fragment extraction
//! counts same-name open/close tags rather than building a full tree,
//! which is enough for the well-formed documents this widget consumes.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::fetcher::{ContentKind, FetchError, RawContent};

/// A `(title, body)` pair ready for card insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContent {
    pub title: String,
    pub body: String,
}

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("title regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static PARA_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\r?\n){2,}").expect("paragraph break regex"));
static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n").expect("line break regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link regex"));

/// Parse a fetched body into a `(title, body)` pair.
pub fn parse_content(
    raw: &RawContent,
    fragment: Option<&str>,
) -> Result<ParsedContent, FetchError> {
    match raw.kind {
        ContentKind::Structured => parse_structured(&raw.body, fragment),
        ContentKind::Markup => Ok(parse_markup(&raw.body, fragment)),
        ContentKind::Plain => Ok(parse_plain(&raw.body)),
    }
}

fn parse_structured(body: &str, fragment: Option<&str>) -> Result<ParsedContent, FetchError> {
    let data: serde_json::Value = serde_json::from_str(body)
        .map_err(|err| FetchError::Failed(format!("invalid structured payload: {err}")))?;

    let mut title = String::new();
    match data.get("title") {
        Some(t) if !t.is_null() && t.as_str() != Some("") => title = value_text(t),
        _ => {
            if let Some((key, value)) = data.as_object().and_then(|obj| obj.iter().next()) {
                title = format!("{key}: {}", value_text(value));
            }
        }
    }

    let body = match fragment.and_then(|f| data.get(f)) {
        Some(value) => value_text(value),
        None => serde_json::to_string(&data)
            .map_err(|err| FetchError::Failed(format!("serialize payload: {err}")))?,
    };

    Ok(ParsedContent { title, body })
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_markup(body: &str, fragment: Option<&str>) -> ParsedContent {
    let fragment_html = fragment.and_then(|id| extract_element_by_id(body, id));
    let result = fragment_html.clone().unwrap_or_else(|| body.to_string());

    let title = match TITLE_RE.captures(body) {
        Some(caps) => strip_tags(caps.get(1).map_or("", |m| m.as_str()))
            .trim()
            .to_string(),
        None => {
            let scope = fragment_html.as_deref().unwrap_or(body);
            excerpt(&strip_tags(scope))
        }
    };

    ParsedContent {
        title,
        body: result,
    }
}

fn parse_plain(body: &str) -> ParsedContent {
    let (mut title, rest) = match body.find(['\r', '\n']) {
        Some(i) => (body[..i].trim().to_string(), body[i..].trim()),
        None => (String::new(), body.trim()),
    };

    if title.is_empty() && !rest.is_empty() {
        title = excerpt(rest);
    }

    let formatted = if rest.is_empty() {
        String::new()
    } else {
        let blocks = PARA_BREAK_RE.replace_all(rest, "</p><p>");
        let lines = LINE_BREAK_RE.replace_all(&blocks, "<br>");
        let linked = LINK_RE.replace_all(&lines, r#"<a href="$2">$1</a>"#);
        format!("<p>{linked}</p>")
    };

    ParsedContent {
        title,
        body: formatted,
    }
}

/// Find the element with the given id and return its inner markup.
///
/// Nesting-aware for same-name tags; an unterminated element runs to the
/// end of the document.
fn extract_element_by_id(html: &str, id: &str) -> Option<String> {
    let open_pattern = format!(
        r#"(?is)<([a-zA-Z][a-zA-Z0-9-]*)[^>]*\bid\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(id)
    );
    let open_re = Regex::new(&open_pattern).ok()?;
    let caps = open_re.captures(html)?;
    let whole = caps.get(0)?;
    let tag = caps.get(1)?.as_str().to_ascii_lowercase();

    if whole.as_str().trim_end().ends_with("/>") {
        return Some(String::new());
    }

    let rest = &html[whole.end()..];
    let tag_re = Regex::new(&format!(r"(?i)<{tag}\b[^>]*>|</{tag}\s*>")).ok()?;

    let mut depth = 1usize;
    for m in tag_re.find_iter(rest) {
        if m.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some(rest[..m.start()].to_string());
            }
        } else if !m.as_str().ends_with("/>") {
            depth += 1;
        }
    }

    Some(rest.to_string())
}

fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").into_owned()
}

/// First three words of the text, joined by single spaces.
fn excerpt(text: &str) -> String {
    text.unicode_words().take(3).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(body: &str) -> RawContent {
        RawContent::new(ContentKind::Structured, body)
    }

    fn markup(body: &str) -> RawContent {
        RawContent::new(ContentKind::Markup, body)
    }

    fn plain(body: &str) -> RawContent {
        RawContent::new(ContentKind::Plain, body)
    }

    // ── Structured data ────────────────────────────────────────────

    #[test]
    fn structured_title_field_wins() {
        let parsed = parse_content(
            &structured(r#"{"title": "Hello", "content": "<p>Hi</p>"}"#),
            None,
        )
        .unwrap();
        assert_eq!(parsed.title, "Hello");
    }

    #[test]
    fn structured_first_pair_synthesizes_title() {
        let parsed =
            parse_content(&structured(r#"{"name": "Ada", "role": "pioneer"}"#), None).unwrap();
        assert_eq!(parsed.title, "name: Ada");
    }

    #[test]
    fn structured_fragment_selects_field() {
        let parsed = parse_content(
            &structured(r#"{"title": "T", "content": "<p>Body</p>"}"#),
            Some("content"),
        )
        .unwrap();
        assert_eq!(parsed.body, "<p>Body</p>");
    }

    #[test]
    fn structured_missing_fragment_serializes_payload() {
        let parsed =
            parse_content(&structured(r#"{"title": "T", "n": 3}"#), Some("absent")).unwrap();
        assert!(parsed.body.contains("\"n\":3"));
    }

    #[test]
    fn structured_non_string_field_serialized() {
        let parsed = parse_content(
            &structured(r#"{"title": "T", "content": {"a": 1}}"#),
            Some("content"),
        )
        .unwrap();
        assert_eq!(parsed.body, r#"{"a":1}"#);
    }

    #[test]
    fn structured_invalid_payload_fails() {
        let err = parse_content(&structured("{nope"), None).unwrap_err();
        assert!(matches!(err, FetchError::Failed(_)));
    }

    // ── Markup ─────────────────────────────────────────────────────

    #[test]
    fn markup_title_element() {
        let doc = "<html><head><title>The Title</title></head><body><p>x</p></body></html>";
        let parsed = parse_content(&markup(doc), None).unwrap();
        assert_eq!(parsed.title, "The Title");
        assert_eq!(parsed.body, doc);
    }

    #[test]
    fn markup_fragment_extraction() {
        let doc = r#"<html><body><div id="content"><p>Inner</p></div><div>other</div></body></html>"#;
        let parsed = parse_content(&markup(doc), Some("content")).unwrap();
        assert_eq!(parsed.body, "<p>Inner</p>");
    }

    #[test]
    fn markup_fragment_with_nested_same_tag() {
        let doc = r#"<div id="outer"><div>inner</div> tail</div><div>after</div>"#;
        let parsed = parse_content(&markup(doc), Some("outer")).unwrap();
        assert_eq!(parsed.body, "<div>inner</div> tail");
    }

    #[test]
    fn markup_missing_fragment_uses_whole_document() {
        let doc = "<p>Only this</p>";
        let parsed = parse_content(&markup(doc), Some("nope")).unwrap();
        assert_eq!(parsed.body, doc);
    }

    #[test]
    fn markup_excerpt_title_when_no_title_element() {
        let doc = "<body><p>Alpha beta gamma delta epsilon</p></body>";
        let parsed = parse_content(&markup(doc), None).unwrap();
        assert_eq!(parsed.title, "Alpha beta gamma");
    }

    #[test]
    fn markup_excerpt_scoped_to_fragment() {
        let doc = r#"<p>Outside words here</p><div id="content">One two three four</div>"#;
        let parsed = parse_content(&markup(doc), Some("content")).unwrap();
        assert_eq!(parsed.title, "One two three");
    }

    #[test]
    fn markup_self_closing_fragment_is_empty() {
        let doc = r#"<p>text</p><hr id="content"/>"#;
        let parsed = parse_content(&markup(doc), Some("content")).unwrap();
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn markup_unterminated_fragment_runs_to_end() {
        let doc = r#"<div id="content"><p>tail"#;
        let parsed = parse_content(&markup(doc), Some("content")).unwrap();
        assert_eq!(parsed.body, "<p>tail");
    }

    // ── Plain text ─────────────────────────────────────────────────

    #[test]
    fn plain_first_line_becomes_title() {
        let parsed = parse_content(&plain("Headline\nBody text here"), None).unwrap();
        assert_eq!(parsed.title, "Headline");
        assert_eq!(parsed.body, "<p>Body text here</p>");
    }

    #[test]
    fn plain_single_line_titles_from_excerpt() {
        let parsed = parse_content(&plain("just one single line"), None).unwrap();
        assert_eq!(parsed.title, "just one single");
        assert_eq!(parsed.body, "<p>just one single line</p>");
    }

    #[test]
    fn plain_blank_lines_become_paragraphs() {
        let parsed = parse_content(&plain("T\nfirst block\n\nsecond block"), None).unwrap();
        assert_eq!(parsed.body, "<p>first block</p><p>second block</p>");
    }

    #[test]
    fn plain_single_breaks_become_br() {
        let parsed = parse_content(&plain("T\nline one\nline two"), None).unwrap();
        assert_eq!(parsed.body, "<p>line one<br>line two</p>");
    }

    #[test]
    fn plain_link_tokens_become_hyperlinks() {
        let parsed =
            parse_content(&plain("T\nsee [docs](https://example.test/docs) now"), None).unwrap();
        assert_eq!(
            parsed.body,
            r#"<p>see <a href="https://example.test/docs">docs</a> now</p>"#
        );
    }

    #[test]
    fn plain_every_link_token_is_replaced() {
        let parsed =
            parse_content(&plain("T\n[a](u1) and [b](u2)"), None).unwrap();
        assert_eq!(
            parsed.body,
            r#"<p><a href="u1">a</a> and <a href="u2">b</a></p>"#
        );
    }

    #[test]
    fn plain_crlf_input() {
        let parsed = parse_content(&plain("Headline\r\nBody one\r\n\r\nBody two"), None).unwrap();
        assert_eq!(parsed.title, "Headline");
        assert_eq!(parsed.body, "<p>Body one</p><p>Body two</p>");
    }

    #[test]
    fn plain_empty_body() {
        let parsed = parse_content(&plain("   "), None).unwrap();
        assert_eq!(parsed.title, "");
        assert_eq!(parsed.body, "");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn plain_parsing_never_fails(body in ".{0,200}") {
                let parsed = parse_content(&plain(&body), None).unwrap();
                // Formatting only ever wraps non-empty bodies.
                prop_assert_eq!(
                    parsed.body.is_empty(),
                    !parsed.body.starts_with("<p>")
                );
            }

            #[test]
            fn single_line_titles_use_at_most_three_words(body in "[a-z ]{0,80}") {
                let parsed = parse_content(&plain(&body), None).unwrap();
                prop_assert!(parsed.title.unicode_words().count() <= 3);
            }
        }
    }
}
