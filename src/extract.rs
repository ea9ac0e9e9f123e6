//! Entry discovery on the listing page.
//!
//! The listing body is a flat run of blocks: heading wrappers
//! (`<div class="mw-heading"><h3>December</h3></div>`), lead paragraphs, and
//! `<ul>` lists of people. [`Entries`] walks those blocks lazily as a two-state
//! machine: nothing is emitted until a heading opens the watched section, and
//! from then on every list item with an article link is yielded. An entry
//! repeated on the same page (same `name|link`) is yielded only once.

use crate::models::{Entry, PageClassification};
use crate::tree::{Element, Node};
use std::collections::HashSet;
use std::slice;
use tracing::trace;

const HEADING_TAGS: [&str; 3] = ["h2", "h3", "h4"];
const ARTICLE_PREFIX: &str = "/wiki/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    NotStarted,
    Started,
}

/// Lazy, finite, single-pass iterator over the entries of a listing page.
#[derive(Debug)]
pub struct Entries<'a> {
    classification: PageClassification,
    blocks: slice::Iter<'a, Node>,
    items: Option<slice::Iter<'a, Node>>,
    state: WalkState,
    yielded: HashSet<String>,
}

/// Walk the content container of a listing page.
///
/// The listing root is the container's second child node. If it is missing
/// or not an element the iterator is empty.
///
/// # Arguments
///
/// * `container` - The `div#mw-content-text` element of the listing page
/// * `classification` - Decides which heading text opens the watched section
///
/// # Returns
///
/// A lazy iterator of entries in document order, each `name|link` once.
pub fn entries(container: &Element, classification: PageClassification) -> Entries<'_> {
    let blocks = container
        .nth_child(1)
        .and_then(Node::as_element)
        .map(|root| root.children.iter())
        .unwrap_or_default();

    Entries {
        classification,
        blocks,
        items: None,
        state: WalkState::NotStarted,
        yielded: HashSet::new(),
    }
}

impl Iterator for Entries<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            if let Some(items) = self.items.as_mut() {
                for item in items.filter_map(Node::as_element).filter(|el| el.is("li")) {
                    let Some(entry) = entry_from_item(item) else {
                        continue;
                    };
                    if self.yielded.insert(entry.dedup_key()) {
                        return Some(entry);
                    }
                    trace!(key = %entry.dedup_key(), "Repeated entry on page");
                }
                self.items = None;
            }

            let block = self.blocks.by_ref().find_map(Node::as_element)?;

            if let Some(heading) = block.find_child(&HEADING_TAGS) {
                let text = heading.text();
                let text = text.trim();
                if self.state == WalkState::NotStarted && self.classification.starts_section(text)
                {
                    trace!(heading = %text, "Watched section starts");
                    self.state = WalkState::Started;
                }
                continue;
            }

            if self.state == WalkState::NotStarted || !block.is("ul") {
                continue;
            }

            self.items = Some(block.children.iter());
        }
    }
}

/// First linked article of a list item, if it names a person.
fn entry_from_item(item: &Element) -> Option<Entry> {
    let link = item.find_descendant(|el| {
        el.is("a") && el.get_attr("href").is_some_and(|href| !href.is_empty())
    })?;
    let href = link.get_attr("href")?;
    let name = link.text();
    let name = name.trim();

    if name.is_empty() || !is_article_link(href) {
        return None;
    }
    Some(Entry::new(name, href))
}

/// `/wiki/<Title>` with a non-empty title outside any namespace.
pub fn is_article_link(href: &str) -> bool {
    match href.strip_prefix(ARTICLE_PREFIX) {
        Some(title) => !title.is_empty() && !title.contains(':'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::content_container;

    const CURRENT: PageClassification = PageClassification {
        month: None,
        year: Some(2025),
        is_current: true,
    };
    const ARCHIVED: PageClassification = PageClassification {
        month: None,
        year: Some(2019),
        is_current: false,
    };

    fn page(body: &str) -> Element {
        let html = format!(
            "<html><body><div id=\"mw-content-text\">\n<div class=\"mw-parser-output\">{body}</div></div></body></html>"
        );
        content_container(&html).expect("container")
    }

    fn heading(text: &str) -> String {
        format!("<div class=\"mw-heading mw-heading3\"><h3 id=\"{text}\">{text}</h3></div>")
    }

    fn names(container: &Element, c: PageClassification) -> Vec<String> {
        entries(container, c).map(|e| e.name).collect()
    }

    #[test]
    fn test_december_scenario_yields_single_entry() {
        let c = page(&format!(
            "{}<ul><li><a href=\"/wiki/Jane_Doe\">Jane Doe</a>, 88, American writer.</li></ul>",
            heading("December")
        ));
        let found: Vec<Entry> = entries(&c, CURRENT).collect();
        assert_eq!(found, vec![Entry::new("Jane Doe", "/wiki/Jane_Doe")]);
        assert_eq!(found[0].dedup_key(), "Jane Doe|/wiki/Jane_Doe");
    }

    #[test]
    fn test_content_before_first_section_is_skipped() {
        let c = page(&format!(
            "<p>Lead</p><ul><li><a href=\"/wiki/Lead_Person\">Lead Person</a></li></ul>{}<ul><li><a href=\"/wiki/A\">A</a></li></ul>",
            heading("November")
        ));
        assert_eq!(names(&c, CURRENT), ["A"]);
    }

    #[test]
    fn test_current_page_ignores_day_headings() {
        let c = page(&format!(
            "{}<ul><li><a href=\"/wiki/A\">A</a></li></ul>",
            heading("12")
        ));
        assert!(names(&c, CURRENT).is_empty());
    }

    #[test]
    fn test_archived_page_starts_on_day_headings_only() {
        let month_first = page(&format!(
            "{}<ul><li><a href=\"/wiki/A\">A</a></li></ul>{}<ul><li><a href=\"/wiki/B\">B</a></li></ul>",
            heading("December"),
            heading("3")
        ));
        assert_eq!(names(&month_first, ARCHIVED), ["B"]);
    }

    #[test]
    fn test_started_never_resets_after_later_headings() {
        let c = page(&format!(
            "{}<ul><li><a href=\"/wiki/A\">A</a></li></ul>{}<ul><li><a href=\"/wiki/B\">B</a></li></ul>{}<ul><li><a href=\"/wiki/C\">C</a></li></ul>",
            heading("December"),
            heading("References"),
            heading("November")
        ));
        assert_eq!(names(&c, CURRENT), ["A", "B", "C"]);
    }

    #[test]
    fn test_h4_inside_wrapper_starts_the_walk() {
        let c = page(
            "<div class=\"mw-heading mw-heading4\"><h4 id=\"December\">December</h4></div>\
             <ul><li><a href=\"/wiki/A\">A</a></li></ul>",
        );
        assert_eq!(names(&c, CURRENT), ["A"]);
    }

    #[test]
    fn test_bare_heading_child_does_not_start_the_walk() {
        let c = page("<h3 id=\"December\">December</h3><ul><li><a href=\"/wiki/A\">A</a></li></ul>");
        assert!(names(&c, CURRENT).is_empty());
    }

    #[test]
    fn test_repeated_entry_is_yielded_once() {
        let c = page(&format!(
            "{}<ul><li><a href=\"/wiki/A\">A</a></li></ul>{}<ul><li><a href=\"/wiki/A\">A</a></li>\
             <li><a href=\"/wiki/A\">A (writer)</a></li></ul>",
            heading("December"),
            heading("2")
        ));
        let found: Vec<Entry> = entries(&c, CURRENT).collect();
        assert_eq!(
            found,
            vec![Entry::new("A", "/wiki/A"), Entry::new("A (writer)", "/wiki/A")]
        );
    }

    #[test]
    fn test_rejects_namespaced_empty_and_external_links() {
        let c = page(&format!(
            "{}<ul>\
             <li><a href=\"/wiki/Category:Deaths\">Category</a></li>\
             <li><a href=\"/wiki/Empty_Name\">  </a></li>\
             <li><a href=\"https://example.com/wiki/X\">External</a></li>\
             <li><a href=\"/wiki/\">Bare</a></li>\
             <li>No link at all</li>\
             <li><a href=\"\">Blank</a> <a href=\"/wiki/Second_Link\">Second Link</a></li>\
             <li><a href=\"/wiki/Kept\"> Kept </a></li>\
             </ul>",
            heading("December")
        ));
        let found: Vec<Entry> = entries(&c, CURRENT).collect();
        assert_eq!(
            found,
            vec![
                Entry::new("Second Link", "/wiki/Second_Link"),
                Entry::new("Kept", "/wiki/Kept"),
            ]
        );
        assert!(found.iter().all(|e| !e.name.is_empty() && !e.link.contains(':')));
    }

    #[test]
    fn test_only_direct_list_items_of_lists_are_read() {
        let c = page(&format!(
            "{}<ol><li><a href=\"/wiki/Ordered\">Ordered</a></li></ol>\
             <ul><li><a href=\"/wiki/Outer\">Outer</a><ul><li><a href=\"/wiki/Inner\">Inner</a></li></ul></li></ul>",
            heading("December")
        ));
        assert_eq!(names(&c, CURRENT), ["Outer"]);
    }

    #[test]
    fn test_heading_wrapper_never_yields_entries() {
        let c = page(
            "<div class=\"mw-heading\"><h2>December</h2><ul><li><a href=\"/wiki/A\">A</a></li></ul></div>\
             <ul><li><a href=\"/wiki/B\">B</a></li></ul>",
        );
        assert_eq!(names(&c, CURRENT), ["B"]);
    }

    #[test]
    fn test_missing_or_text_root_yields_nothing() {
        let only_text = Element::new("div").text_node("\n").text_node("text");
        assert_eq!(entries(&only_text, CURRENT).count(), 0);

        let single_child = Element::new("div").child(Element::new("div"));
        assert_eq!(entries(&single_child, CURRENT).count(), 0);
    }

    #[test]
    fn test_iteration_is_lazy_and_single_pass() {
        let c = page(&format!(
            "{}<ul><li><a href=\"/wiki/A\">A</a></li><li><a href=\"/wiki/B\">B</a></li></ul>",
            heading("May")
        ));
        let mut it = entries(&c, CURRENT);
        assert_eq!(it.next().map(|e| e.name), Some("A".to_string()));
        assert_eq!(it.next().map(|e| e.name), Some("B".to_string()));
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_article_link_rules() {
        assert!(is_article_link("/wiki/Jane_Doe"));
        assert!(!is_article_link("/wiki/File:Photo.jpg"));
        assert!(!is_article_link("/wiki/"));
        assert!(!is_article_link("/w/index.php?title=X"));
        assert!(!is_article_link("#cite_note-1"));
    }
}
