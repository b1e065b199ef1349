//! Parsed document snapshots
//!
//! A snapshot captures everything the page swap needs from a fetched
//! document: the serialized head and body markup plus the title. Snapshots
//! are immutable once built; staleness is handled by evicting them from the
//! cache, never by patching.

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// Head/body/title capture of one parsed HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    /// Inner HTML of the `<head>` element
    pub head: String,
    /// Inner HTML of the `<body>` element
    pub body: String,
    /// Text of the `<title>` element, trimmed
    pub title: String,
}

impl DocumentSnapshot {
    /// Parse an HTML document into a snapshot.
    ///
    /// html5ever error-corrects, so this never fails: a document with no
    /// head or body yields empty strings for those parts.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .one(StrTendril::from(html));

        let head = find_element(&dom.document, "head");
        let body = find_element(&dom.document, "body");
        let title = head
            .as_ref()
            .and_then(|h| find_element(h, "title"))
            .map(|t| collect_text(&t).trim().to_string())
            .unwrap_or_default();

        Self {
            head: head.map(|h| inner_html(&h)).unwrap_or_default(),
            body: body.map(|b| inner_html(&b)).unwrap_or_default(),
            title,
        }
    }

    /// Approximate memory footprint of the snapshot in bytes
    pub fn size_bytes(&self) -> usize {
        self.head.len() + self.body.len() + self.title.len()
    }
}

/// Depth-first search for the first element with the given tag name
fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { ref name, .. } = child.data {
            if name.local.as_ref().eq_ignore_ascii_case(tag) {
                return Some(child.clone());
            }
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

/// Concatenate all text descendants of a node
fn collect_text(handle: &Handle) -> String {
    let mut out = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { ref contents } = child.data {
            out.push_str(&contents.borrow());
        }
        out.push_str(&collect_text(child));
    }
    out
}

/// Serialize the children of a node back to HTML
fn inner_html(handle: &Handle) -> String {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    let serializable = SerializableHandle::from(handle.clone());
    if serialize(&mut buf, &serializable, opts).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
