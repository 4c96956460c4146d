//! Turns raw HTML into a title, a plain-text body and a short excerpt.
//!
//! Extraction degrades instead of failing: Readability main-content
//! detection first, then the whole page minus navigation chrome, then the
//! page's meta description.

use std::sync::OnceLock;

use dom_smoothie::{Config as ReadabilityConfig, Readability};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::analysis::word_count;

pub const UNKNOWN_TITLE: &str = "Unbekannter Titel";
pub const EXCERPT_CHARS: usize = 300;

/// A structured candidate with fewer words than this triggers the page fallback.
const STRUCTURED_MIN_WORDS: usize = 50;
/// Below this the meta description is tried as a last resort.
const DESCRIPTION_MIN_WORDS: usize = 20;
const MAX_ELEMENTS_TO_PARSE: usize = 9000;

const PAGE_CHROME: &[&str] = &[
    "script", "style", "noscript", "template", "header", "footer", "nav", "form", "aside",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub text: String,
    pub excerpt: String,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn blank_lines_regex() -> &'static Regex {
    static BLANKS: OnceLock<Regex> = OnceLock::new();
    BLANKS.get_or_init(|| Regex::new(r"\n\s*\n\s*\n+").expect("blank line regex is valid"))
}

fn spaces_regex() -> &'static Regex {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    SPACES.get_or_init(|| Regex::new(r"[ \t]+").expect("space regex is valid"))
}

/// CR to LF, collapse horizontal whitespace runs and triple blank lines, trim.
pub fn clean_text(text: &str) -> String {
    let text = text.replace('\r', "\n");
    let text = spaces_regex().replace_all(&text, " ");
    let text = blank_lines_regex().replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Text nodes under `element`, one per line, skipping subtrees named in `skip`.
fn collect_text(element: ElementRef<'_>, skip: &[&str], out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                out.push(text.to_string());
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            if !skip.contains(&child.value().name()) {
                collect_text(child, skip, out);
            }
        }
    }
}

fn element_text(element: ElementRef<'_>, skip: &[&str]) -> String {
    let mut parts = Vec::new();
    collect_text(element, skip, &mut parts);
    clean_text(&parts.join("\n"))
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn document_title(document: &Html) -> Option<String> {
    let sel = selector("title")?;
    document
        .select(&sel)
        .map(|el| clean_text(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Runs Readability over the page and returns the article it settles on,
/// rendered as text without any navigation chrome it kept.
fn structured_body(html: &str, url: &str) -> Option<String> {
    let cfg = ReadabilityConfig {
        max_elements_to_parse: MAX_ELEMENTS_TO_PARSE,
        ..Default::default()
    };
    let document_url = Url::parse(url).is_ok().then_some(url);

    let mut readability = Readability::new(html, document_url, Some(cfg)).ok()?;
    let article = readability.parse().ok()?;

    let content = Html::parse_fragment(&article.content);
    let text = element_text(content.root_element(), PAGE_CHROME);
    (!text.is_empty()).then_some(text)
}

fn page_body(document: &Html) -> String {
    let Some(body) = selector("body").and_then(|sel| document.select(&sel).next()) else {
        return element_text(document.root_element(), PAGE_CHROME);
    };
    element_text(body, PAGE_CHROME)
}

fn excerpt_of(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

pub fn extract(html: &str, url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let mut text = structured_body(html, url).unwrap_or_default();
    let mut words = word_count(&text);

    if words < STRUCTURED_MIN_WORDS {
        let fallback = page_body(&document);
        let fallback_words = word_count(&fallback);
        if fallback_words > words {
            tracing::debug!(%url, words, fallback_words, "Using whole-page text");
            text = fallback;
            words = fallback_words;
        }
    }

    if words < DESCRIPTION_MIN_WORDS {
        let description = meta_content(&document, r#"meta[name="description"]"#)
            .or_else(|| meta_content(&document, r#"meta[property="og:description"]"#))
            .map(|d| clean_text(&d));
        if let Some(description) = description.filter(|d| word_count(d) > words) {
            tracing::debug!(%url, "Using meta description as article text");
            text = description;
        }
    }

    let title = meta_content(&document, r#"meta[property="og:title"]"#)
        .map(|t| clean_text(&t))
        .filter(|t| !t.is_empty())
        .or_else(|| document_title(&document))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    ExtractedPage {
        excerpt: excerpt_of(&text),
        title,
        text,
    }
}
