//! Owned, parser-independent view of an HTML fragment.
//!
//! The entry walk and the paragraph sanitizer operate on this tree instead of
//! on `scraper` types directly, so both can be exercised with hand-built
//! fixtures and the HTML parser stays an implementation detail of
//! [`crate::html`].

/// A node in the content tree: either an element or a run of text.
///
/// Text nodes are kept (including whitespace-only ones) because positional
/// lookups such as "the second child of the container" count them, exactly
/// as a DOM walk would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    /// Borrow the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// An element with its tag name (lowercase), attributes, and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }

    /// The `index`-th child node, text nodes included.
    pub fn nth_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Direct element children in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First direct child whose tag is one of `tags` (non-recursive).
    pub fn find_child(&self, tags: &[&str]) -> Option<&Element> {
        self.child_elements().find(|el| tags.contains(&el.tag.as_str()))
    }

    /// First descendant (pre-order, excluding `self`) matching `pred`.
    pub fn find_descendant<P>(&self, pred: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool + Copy,
    {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with tag `tag`, in document order.
    pub fn descendants_named<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_named(tag, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.is(tag) {
                out.push(child);
            }
            child.collect_named(tag, out);
        }
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Copy of this element where every descendant `tag` element is replaced
    /// by its own children.
    pub fn unwrapped(&self, tag: &str) -> Element {
        Element {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: unwrap_children(&self.children, tag),
        }
    }

    /// Copy of this element with every descendant `tag` element removed,
    /// content included.
    pub fn pruned(&self, tag: &str) -> Element {
        Element {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: self
                .children
                .iter()
                .filter_map(|node| match node {
                    Node::Element(el) if el.is(tag) => None,
                    Node::Element(el) => Some(Node::Element(el.pruned(tag))),
                    Node::Text(t) => Some(Node::Text(t.clone())),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, el: Element) -> Self {
        self.children.push(Node::Element(el));
        self
    }

    pub fn text_node(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }
}

fn unwrap_children(children: &[Node], tag: &str) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    for node in children {
        match node {
            Node::Element(el) if el.is(tag) => out.extend(unwrap_children(&el.children, tag)),
            Node::Element(el) => out.push(Node::Element(el.unwrapped(tag))),
            Node::Text(t) => out.push(Node::Text(t.clone())),
        }
    }
    out
}
