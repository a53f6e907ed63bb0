//! Minimal retained document tree.
//!
//! Map containers render into element nodes and popups project their
//! content into detached ones. Only what those surfaces need is modelled:
//! tags, attributes, text and parent/child links.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    children: Vec<DomNode>,
    parent: Weak<RefCell<NodeData>>,
}

/// Shared reference to a document node
#[derive(Clone)]
pub struct DomNode(Rc<RefCell<NodeData>>);

impl DomNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(content.into()))
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            kind,
            children: Vec::new(),
            parent: Weak::new(),
        })))
    }

    /// Tag name, `None` for text nodes
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Text(_))
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Sets an attribute. Text nodes ignore attributes.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.0.borrow_mut().kind {
            attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.0.borrow_mut().kind {
            attributes.remove(name);
        }
    }

    pub fn attribute_names(&self) -> Vec<String> {
        match &self.0.borrow().kind {
            NodeKind::Element { attributes, .. } => attributes.keys().cloned().collect(),
            NodeKind::Text(_) => Vec::new(),
        }
    }

    /// Whether the space separated `class` attribute contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Replaces the content of a text node
    pub fn set_text(&self, content: impl Into<String>) {
        if let NodeKind::Text(text) = &mut self.0.borrow_mut().kind {
            *text = content.into();
        }
    }

    /// Appends `child`, moving it out of its current parent first
    pub fn append_child(&self, child: &DomNode) {
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Removes `child` if it is a direct child of this node
    /// Inserts `child` right before `reference`. Appends when `reference`
    /// is not a child of this node.
    pub fn insert_before(&self, child: &DomNode, reference: &DomNode) {
        if child.ptr_eq(reference) {
            return;
        }
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        let mut data = self.0.borrow_mut();
        let index = data
            .children
            .iter()
            .position(|c| c.ptr_eq(reference))
            .unwrap_or(data.children.len());
        data.children.insert(index, child.clone());
    }

    pub fn remove_child(&self, child: &DomNode) -> bool {
        let removed = {
            let mut data = self.0.borrow_mut();
            match data.children.iter().position(|c| c.ptr_eq(child)) {
                Some(index) => {
                    data.children.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            child.0.borrow_mut().parent = Weak::new();
        }
        removed
    }

    /// Takes this node out of its parent, if it has one
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    pub fn parent(&self) -> Option<DomNode> {
        self.0.borrow().parent.upgrade().map(DomNode)
    }

    pub fn next_sibling(&self) -> Option<DomNode> {
        let parent = self.parent()?;
        let data = parent.0.borrow();
        let index = data.children.iter().position(|c| c.ptr_eq(self))?;
        data.children.get(index + 1).cloned()
    }

    pub fn children(&self) -> Vec<DomNode> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let data = self.0.borrow();
        match &data.kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element { .. } => data.children.iter().map(DomNode::text_content).collect(),
        }
    }

    /// First descendant (depth first, self included) matching `predicate`
    pub fn find(&self, predicate: &dyn Fn(&DomNode) -> bool) -> Option<DomNode> {
        if predicate(self) {
            return Some(self.clone());
        }
        self.children()
            .iter()
            .find_map(|child| child.find(predicate))
    }

    /// First descendant carrying `name="value"`
    pub fn query_attribute(&self, name: &str, value: &str) -> Option<DomNode> {
        self.find(&|node| node.attribute(name).as_deref() == Some(value))
    }

    /// First descendant with `class` in its class list
    pub fn query_class(&self, class: &str) -> Option<DomNode> {
        self.find(&|node| node.has_class(class))
    }

    pub fn ptr_eq(&self, other: &DomNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        match &data.kind {
            NodeKind::Text(text) => write!(f, "{:?}", text),
            NodeKind::Element { tag, attributes } => f
                .debug_struct("DomNode")
                .field("tag", tag)
                .field("attributes", attributes)
                .field("children", &data.children)
                .finish(),
        }
    }
}
