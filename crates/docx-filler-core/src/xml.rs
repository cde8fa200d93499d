//! Arena-backed mutable XML tree for the document content part.
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]. Every node
//! keeps an explicit parent pointer and an ordered child list, so inserting a
//! cloned sibling or detaching a node never depends on object identity.
//! Detached nodes stay in the arena until the tree is dropped.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{FillError, Result};

/// Index of a node inside an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element with its qualified name and attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            self_closing: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    /// Declarations, comments, CDATA, processing instructions and doctypes,
    /// written back exactly as read.
    Verbatim(Event<'static>),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlTree {
    pub const ROOT: NodeId = NodeId(0);

    /// An empty tree holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse a complete XML document.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut tree = Self::new();
        let mut reader = Reader::from_str(xml);
        let mut stack = vec![Self::ROOT];

        loop {
            let parent = stack.last().copied().unwrap_or(Self::ROOT);
            match reader.read_event()? {
                Event::Start(e) => {
                    let element = element_from_start(&e, false)?;
                    let id = tree.push(NodeKind::Element(element));
                    tree.append_child(parent, id)?;
                    stack.push(id);
                }
                Event::Empty(e) => {
                    let element = element_from_start(&e, true)?;
                    let id = tree.push(NodeKind::Element(element));
                    tree.append_child(parent, id)?;
                }
                Event::End(e) => {
                    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                    let open = stack.pop().filter(|id| *id != Self::ROOT);
                    let matches = open
                        .and_then(|id| tree.element(id))
                        .is_some_and(|el| el.name == name);
                    if !matches {
                        return Err(FillError::MalformedMarkup(format!(
                            "unexpected closing tag </{}>",
                            name
                        )));
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape()?.into_owned();
                    let id = tree.push(NodeKind::Text(text));
                    tree.append_child(parent, id)?;
                }
                Event::Eof => break,
                other => {
                    let id = tree.push(NodeKind::Verbatim(other.into_owned()));
                    tree.append_child(parent, id)?;
                }
            }
        }

        if stack.len() != 1 {
            return Err(FillError::MalformedMarkup(format!(
                "{} element(s) left unclosed",
                stack.len() - 1
            )));
        }
        if tree.document_element().is_none() {
            return Err(FillError::MalformedMarkup("no root element".to_string()));
        }
        Ok(tree)
    }

    /// Serialize the whole tree back to markup.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        for &child in self.children(Self::ROOT) {
            self.write_node(&mut writer, child)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Document => {
                for &child in &node.children {
                    self.write_node(writer, child)?;
                }
            }
            NodeKind::Element(element) => {
                let mut start = BytesStart::new(element.name.as_str());
                for (key, value) in &element.attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if node.children.is_empty() && element.self_closing {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
                }
            }
            NodeKind::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
            }
            NodeKind::Verbatim(event) => {
                writer.write_event(event.clone())?;
            }
        }
        Ok(())
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// The single top-level element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.name == name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Direct child elements with the given qualified name, in order.
    pub fn child_elements_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element_named(child, name))
            .collect()
    }

    /// All nodes below `id` in document order, `id` itself excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let NodeKind::Text(t) = self.kind(id) {
            text.push_str(t);
        }
        for desc in self.descendants(id) {
            if let NodeKind::Text(t) = self.kind(desc) {
                text.push_str(t);
            }
        }
        text
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        if let Some(element) = self.element_mut(id) {
            element.self_closing = false;
        }
        if !text.is_empty() {
            let text_node = self.push(NodeKind::Text(text.to_string()));
            self.append_child(id, text_node)?;
        }
        Ok(())
    }

    /// Copy `id` and its whole subtree. The copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let copy = self.push(kind);
        for child in self.nodes[id.0].children.clone() {
            let child_copy = self.deep_clone(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Copy `id` without its children. The copy is detached.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        self.push(kind)
    }

    /// Append `node` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, node)
    }

    /// Insert `node` among the children of `parent` at `index`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<()> {
        if node == Self::ROOT || node == parent {
            return Err(FillError::MalformedMarkup(
                "cannot insert a node into itself".to_string(),
            ));
        }
        self.detach(node);
        if let Some(element) = self.element_mut(parent) {
            element.self_closing = false;
        }
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    /// Insert `node` as the next sibling of `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent(anchor).ok_or_else(|| {
            FillError::MalformedMarkup("cannot insert a sibling of a detached node".to_string())
        })?;
        self.detach(node);
        let position = self
            .children(parent)
            .iter()
            .position(|&child| child == anchor)
            .ok_or_else(|| FillError::MalformedMarkup("parent does not list node".to_string()))?;
        self.insert_child(parent, position + 1, node)
    }

    /// Remove `id` from its parent. A no-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }
}

fn element_from_start(start: &BytesStart<'_>, self_closing: bool) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        self_closing,
    })
}
