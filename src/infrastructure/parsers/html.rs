//! Document-order traversal helpers over `scraper`
//!
//! Vendor pages are navigated the way a human reads them: find an anchor
//! (heading, text node), then take the next table or text that follows it
//! anywhere in the document, not merely among siblings. These helpers walk
//! the parse tree in document order to support that.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Parse a CSS selector that is known to be valid at compile time
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

/// Element text with whitespace collapsed: segments trimmed, empties
/// dropped, joined by single spaces.
pub fn collapsed_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First heading among `tags` whose collapsed text matches `pattern`
pub fn find_heading<'a>(html: &'a Html, tags: &[&str], pattern: &Regex) -> Option<ElementRef<'a>> {
    for tag in tags {
        let sel = selector(tag);
        for el in html.select(&sel) {
            if pattern.is_match(&collapsed_text(&el)) {
                return Some(el);
            }
        }
    }
    None
}

/// First element with the given tag carrying the exact `id` attribute
pub fn element_by_id<'a>(html: &'a Html, tag: &str, id: &str) -> Option<ElementRef<'a>> {
    let sel = selector(tag);
    html.select(&sel).find(|el| el.value().attr("id") == Some(id))
}

/// First element of the given tag occurring after `after` in document order
pub fn element_after<'a>(html: &'a Html, after: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let target = after.id();
    let mut seen = false;
    for node in html.tree.root().descendants() {
        if node.id() == target {
            seen = true;
            continue;
        }
        if !seen {
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == tag {
                return Some(el);
            }
        }
    }
    None
}

/// Every element of the given tag occurring after `after` in document order
pub fn elements_after<'a>(html: &'a Html, after: &ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    let target = after.id();
    let mut seen = false;
    let mut out = Vec::new();
    for node in html.tree.root().descendants() {
        if node.id() == target {
            seen = true;
            continue;
        }
        if !seen {
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == tag {
                out.push(el);
            }
        }
    }
    out
}

/// Content of the first text node after `after` matching `pattern`
pub fn text_after(html: &Html, after: &ElementRef<'_>, pattern: &Regex) -> Option<String> {
    let target = after.id();
    let mut seen = false;
    for node in html.tree.root().descendants() {
        if node.id() == target {
            seen = true;
            continue;
        }
        if !seen {
            continue;
        }
        if let Some(text) = node.value().as_text() {
            let content: &str = &text.text;
            if pattern.is_match(content) {
                return Some(content.to_string());
            }
        }
    }
    None
}

/// First element of the given tag after the first text node matching
/// `anchor`
pub fn element_after_text<'a>(html: &'a Html, anchor: &Regex, tag: &str) -> Option<ElementRef<'a>> {
    let mut anchored = false;
    for node in html.tree.root().descendants() {
        if !anchored {
            if let Some(text) = node.value().as_text() {
                let content: &str = &text.text;
                if anchor.is_match(content) {
                    anchored = true;
                }
            }
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == tag {
                return Some(el);
            }
        }
    }
    None
}

/// Content of the first text node matching `pattern` after the first text
/// node matching `anchor`
pub fn text_after_text(html: &Html, anchor: &Regex, pattern: &Regex) -> Option<String> {
    let mut anchored = false;
    for node in html.tree.root().descendants() {
        if let Some(text) = node.value().as_text() {
            let content: &str = &text.text;
            if !anchored {
                if anchor.is_match(content) {
                    anchored = true;
                }
                continue;
            }
            if pattern.is_match(content) {
                return Some(content.to_string());
            }
        }
    }
    None
}

/// Elements following `el` among its siblings, in order
pub fn following_sibling_elements<'a>(el: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    let mut node = el.next_sibling();
    while let Some(current) = node {
        if let Some(element) = ElementRef::wrap(current) {
            out.push(element);
        }
        node = current.next_sibling();
    }
    out
}
