use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use thiserror::Error;
use url::Url;

/// Element types that carry readable newsletter content.
const CONTENT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, td, div";

/// Phrases that mark a block as footer/legal/navigation boilerplate.
const SNIPPET_FILTER_KEYWORDS: &[&str] = &[
    "unsubscribe",
    "view in browser",
    "privacy policy",
    "forward this email",
    "sent to",
    "email address",
    "©",
    "copyright",
    "all rights reserved",
    "click here",
    "read more",
    "learn more",
    "view online",
    "preferences",
];

/// Minimum length for a text block to be considered relevant.
const MIN_SNIPPET_LENGTH: usize = 15;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTML content is empty")]
    EmptyInput,
    #[error("failed to parse HTML: {0}")]
    ParseFailure(String),
}

/// Extract readable plain text from newsletter HTML.
///
/// Hyperlinks are inlined as `[text](url)` markers, boilerplate blocks are
/// filtered out, and surviving blocks are deduplicated (first occurrence
/// wins) and joined with blank lines. An empty result is legitimate: it
/// means nothing survived filtering, not that extraction failed.
pub fn extract(html: &str) -> Result<String, ExtractError> {
    if html.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let document = Html::parse_document(html);

    let base_selector =
        Selector::parse("base").map_err(|e| ExtractError::ParseFailure(e.to_string()))?;
    let content_selector =
        Selector::parse(CONTENT_SELECTOR).map_err(|e| ExtractError::ParseFailure(e.to_string()))?;

    // Relative hrefs resolve against the first <base href> that is itself a
    // valid absolute URL. Without one, hrefs pass through verbatim.
    let base_url = document
        .select(&base_selector)
        .find_map(|el| el.value().attr("href"))
        .and_then(|href| Url::parse(href.trim()).ok());

    let mut blocks: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for element in document.select(&content_selector) {
        let mut raw = String::new();
        flatten_node(*element, base_url.as_ref(), &mut raw);
        let text = normalize_whitespace(&raw);

        if !keep_block(&text) {
            continue;
        }

        // Nested content tags (a div wrapping a p, say) produce the same
        // flattened text more than once; keep the first occurrence only.
        if seen.insert(text.clone()) {
            blocks.push(text);
        }
    }

    Ok(blocks.join("\n\n"))
}

/// Flatten a node's text content into `out`, rendering anchors as inline
/// `[text](url)` markers so they land exactly where they sat in the markup.
fn flatten_node(node: NodeRef<'_, Node>, base: Option<&Url>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push(' ');
                out.push_str(&text);
            }
            Node::Element(element) => {
                if matches!(element.name(), "script" | "style") {
                    continue;
                }
                if element.name() == "a" {
                    if let Some(href) = element.attr("href") {
                        render_anchor(child, href.trim(), base, out);
                        continue;
                    }
                }
                flatten_node(child, base, out);
            }
            _ => {}
        }
    }
}

fn render_anchor(node: NodeRef<'_, Node>, href: &str, base: Option<&Url>, out: &mut String) {
    let mut inner = String::new();
    flatten_node(node, base, &mut inner);
    let text = normalize_whitespace(&inner);

    // Fragments and script pseudo-URLs carry no destination worth keeping;
    // fall back to the anchor's own text, or nothing at all.
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        if !text.is_empty() {
            out.push(' ');
            out.push_str(&text);
        }
        return;
    }

    let display = if text.is_empty() { href } else { text.as_str() };
    let absolute = resolve_href(base, href);
    out.push_str(&format!(" [{}]({}) ", display, absolute));
}

fn resolve_href(base: Option<&Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn keep_block(text: &str) -> bool {
    if text.chars().count() < MIN_SNIPPET_LENGTH {
        return false;
    }

    let lower = text.to_lowercase();
    if SNIPPET_FILTER_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
    {
        return false;
    }

    // A block that is nothing but a URL (one or two tokens) is navigation
    // debris, not content.
    if (text.starts_with("http://") || text.starts_with("https://"))
        && text.split_whitespace().count() <= 2
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Link Inlining Tests ====================

    #[test]
    fn test_anchor_becomes_inline_marker() {
        let html = r#"<p><a href="https://x.com/a">Click</a> is a long sentence with real content worth fifty characters.</p>"#;
        let text = extract(html).unwrap();

        assert!(text.contains("[Click](https://x.com/a)"));
        assert!(text.contains("is a long sentence with real content"));
    }

    #[test]
    fn test_base_href_resolves_relative_links() {
        let html = r#"<html><head><base href="https://example.com/mail/"></head>
            <body><p>Read the <a href="briefing/today">full briefing</a> for the complete rundown.</p></body></html>"#;
        let text = extract(html).unwrap();

        assert!(text.contains("[full briefing](https://example.com/mail/briefing/today)"));
    }

    #[test]
    fn test_anchor_without_text_displays_href() {
        let html = r#"<p>The replay of the entire launch event is available here: <a href="https://example.com/replay"></a></p>"#;
        let text = extract(html).unwrap();

        assert!(text.contains("[https://example.com/replay](https://example.com/replay)"));
    }

    #[test]
    fn test_fragment_link_keeps_plain_text() {
        let html = r##"<p>Jump straight to the <a href="#section-2">second section</a> for the funding roundup this week.</p>"##;
        let text = extract(html).unwrap();

        assert!(text.contains("second section"));
        assert!(!text.contains("#section-2"));
        assert!(!text.contains("["));
    }

    #[test]
    fn test_javascript_link_without_text_is_removed() {
        let html = r#"<p>Tap the button to open your personalized dashboard today.<a href="javascript:void(0)"></a></p>"#;
        let text = extract(html).unwrap();

        assert!(text.contains("personalized dashboard"));
        assert!(!text.contains("javascript"));
    }

    #[test]
    fn test_block_of_only_link_markers_is_kept() {
        let html = r#"<p><a href="https://a.example/q3">Quarterly results beat analyst expectations</a></p>"#;
        let text = extract(html).unwrap();

        assert!(
            text.contains("[Quarterly results beat analyst expectations](https://a.example/q3)")
        );
    }

    // ==================== Filtering Tests ====================

    #[test]
    fn test_unsubscribe_block_is_filtered() {
        let html = r#"<div>
            <p>The merger was approved by regulators on Thursday afternoon.</p>
            <p>You can unsubscribe from this mailing list at any time.</p>
        </div>"#;
        let text = extract(html).unwrap();

        assert!(text.contains("merger was approved"));
        assert!(!text.to_lowercase().contains("unsubscribe"));
    }

    #[test]
    fn test_copyright_block_is_filtered() {
        let html = r#"<table><tr>
            <td>Shares of the chipmaker rose twelve percent after the announcement.</td>
            <td>Copyright 2026 Example Media, Inc.</td>
        </tr></table>"#;
        let text = extract(html).unwrap();

        assert!(text.contains("chipmaker rose"));
        assert!(!text.to_lowercase().contains("copyright"));
    }

    #[test]
    fn test_short_block_is_dropped() {
        let html = "<p>Hello there</p>";
        let text = extract(html).unwrap();

        assert!(text.is_empty());
    }

    #[test]
    fn test_bare_url_block_is_dropped() {
        let html = "<p>https://example.com/some/deep/path</p>";
        let text = extract(html).unwrap();

        assert!(text.is_empty());
    }

    #[test]
    fn test_url_inside_sentence_survives() {
        let html = "<p>The full dataset lives at https://example.com/data and updates nightly.</p>";
        let text = extract(html).unwrap();

        assert!(text.contains("https://example.com/data"));
    }

    // ==================== Structure Tests ====================

    #[test]
    fn test_nested_duplicates_keep_first_seen_order() {
        let html = r#"<div><p>The satellite constellation reached full coverage this month.</p></div>
            <p>A second story about battery chemistry breakthroughs in solid state cells.</p>"#;
        let text = extract(html).unwrap();

        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("satellite constellation"));
        assert!(blocks[1].contains("battery chemistry"));
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let html = "<p>Words   separated\n\t by   odd    whitespace still read cleanly.</p>";
        let text = extract(html).unwrap();

        assert_eq!(text, "Words separated by odd whitespace still read cleanly.");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<div><h1>Weekly Tech Digest for Subscribers</h1>
            <p>Our lead story covers the <a href="https://news.example/ai">new AI accelerator</a> announced Monday.</p>
            <p>You can unsubscribe at any time.</p></div>"#;

        let first = extract(html).unwrap();
        let second = extract(html).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        match extract("") {
            Err(ExtractError::EmptyInput) => {}
            other => panic!("expected EmptyInput, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_no_content_is_ok_and_empty() {
        let text = extract("<html><body></body></html>").unwrap();
        assert!(text.is_empty());
    }
}
