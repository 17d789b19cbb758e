//! Text cleaning and tokenizing.
//!
//! Every piece of text that reaches the vocabulary or the classifier goes
//! through [`clean_text`] first, so training and inference see the same
//! normalized token stream.

use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose text never shows up in a rendered page.
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Strip HTML tags and punctuation, lowercase, and trim.
pub fn clean_text(text: &str) -> String {
    let without_tags = HTML_TAG_RE.replace_all(text, "");
    let without_symbols = NON_WORD_RE.replace_all(&without_tags, "");
    without_symbols.to_lowercase().trim().to_string()
}

/// Split cleaned text into tokens on runs of whitespace.
pub fn tokenize(cleaned: &str) -> Vec<String> {
    if cleaned.is_empty() {
        return Vec::new();
    }
    WHITESPACE_RE
        .split(cleaned)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Extract the visible body text of an HTML document.
///
/// Approximates `document.body.innerText`: text nodes under `<body>` joined
/// by single spaces, skipping script-like elements. Falls back to the whole
/// document when there is no `<body>`.
pub fn page_text(html: &str) -> String {
    use scraper::{Html, Node, Selector};

    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}
