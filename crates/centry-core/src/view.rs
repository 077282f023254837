//! # View Module
//!
//! The renderable output tree for Centry pages.
//!
//! Components produce `View` values; the app layer serializes them to
//! HTML at exactly one point (`View::to_html`). Views are pure data:
//! building and serializing a view never fails, so every fallible step
//! of page production lives in component render calls where the error
//! boundary can intercept it.

use std::fmt::Write as _;

// =============================================================================
// VIEW TREE
// =============================================================================

/// A node in the output tree.
///
/// Text content is escaped during serialization, never at construction,
/// so equality comparisons in tests see the author's original strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// An element with tag, attributes, and children.
    Element(Element),
    /// A text node (escaped on serialization).
    Text(String),
    /// A sequence of sibling nodes with no wrapper of its own.
    Fragment(Vec<View>),
}

impl View {
    /// Create a text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        View::Text(content.into())
    }

    /// The empty view: a fragment with no children, serializing to "".
    #[must_use]
    pub fn empty() -> Self {
        View::Fragment(Vec::new())
    }

    /// Collect sibling views into a fragment.
    #[must_use]
    pub fn fragment(children: Vec<View>) -> Self {
        View::Fragment(children)
    }

    /// True if this view serializes to the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            View::Element(_) => false,
            View::Text(t) => t.is_empty(),
            View::Fragment(children) => children.iter().all(View::is_empty),
        }
    }

    /// Serialize the tree to compact HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            View::Text(t) => out.push_str(&escape_text(t)),
            View::Fragment(children) => {
                for child in children {
                    child.write_html(out);
                }
            }
            View::Element(el) => el.write_html(out),
        }
    }
}

impl From<Element> for View {
    fn from(el: Element) -> Self {
        View::Element(el)
    }
}

// =============================================================================
// ELEMENTS
// =============================================================================

/// Tags serialized without a closing pair.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// An element node. Built through the chaining API of [`el`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<View>,
}

/// Start building an element: `el("div").class("card").child(...)`.
#[must_use]
pub fn el(tag: impl Into<String>) -> Element {
    Element {
        tag: tag.into(),
        attrs: Vec::new(),
        children: Vec::new(),
    }
}

impl Element {
    /// Add an attribute. Later values for the same name win on output
    /// order only; no dedup is attempted.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Shorthand for the `class` attribute.
    #[must_use]
    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    /// Append a child node.
    #[must_use]
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(View::text(content))
    }

    /// Append every view in the iterator as a child.
    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = View>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// The element's tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            // Attribute names come from code, values may carry user data.
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
        out.push('>');

        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

// =============================================================================
// ESCAPING
// =============================================================================

/// Escape text content for placement between tags.
#[must_use]
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value (double-quoted position).
#[must_use]
pub fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
