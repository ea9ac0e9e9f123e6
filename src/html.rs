//! `scraper`-backed HTML parsing into the owned [`crate::tree`] model.

use crate::tree::{Element, Node};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// The MediaWiki article body container.
static CONTENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#mw-content-text").expect("valid static selector"));

/// Parse a full page and return its content container as an owned tree.
///
/// Returns `None` when the page has no `div#mw-content-text`; callers treat
/// that as "no data", not as an error.
pub fn content_container(html: &str) -> Option<Element> {
    let document = Html::parse_document(html);
    let found = document.select(&CONTENT_SELECTOR).next().map(to_element);
    if found.is_none() {
        debug!(bytes = html.len(), "Page has no content container");
    }
    found
}

/// Convert a `scraper` element and its subtree. Comments, doctypes, and
/// processing instructions are dropped; text is kept verbatim.
pub fn to_element(el: ElementRef<'_>) -> Element {
    let value = el.value();
    let children = el
        .children()
        .filter_map(|child| {
            if let Some(child_el) = ElementRef::wrap(child) {
                Some(Node::Element(to_element(child_el)))
            } else {
                child
                    .value()
                    .as_text()
                    .map(|text| Node::Text((&**text).to_owned()))
            }
        })
        .collect();

    Element {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_container_is_none() {
        assert!(content_container("<html><body><p>hi</p></body></html>").is_none());
    }

    #[test]
    fn test_container_keeps_whitespace_and_attributes() {
        let html = r#"<html><body><div id="mw-content-text">
<div class="mw-parser-output"><p class="a b">Hi <b>there</b></p></div></div></body></html>"#;
        let container = content_container(html).expect("container");
        assert_eq!(container.tag, "div");
        assert!(matches!(container.nth_child(0), Some(Node::Text(t)) if t == "\n"));

        let root = container.nth_child(1).and_then(Node::as_element).expect("root");
        assert!(root.has_class("mw-parser-output"));
        let p = root.find_child(&["p"]).expect("paragraph");
        assert!(p.has_class("b"));
        assert_eq!(p.text(), "Hi there");
    }
}
