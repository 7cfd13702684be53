//! Element and text nodes.
//!
//! Handles are cheap `Rc` clones. Parent links are weak, so removing a
//! subtree from the tree leaves its collection to the last strong handle.
//! Structural and attribute writes go through the owning [`Document`]'s
//! mutation queue.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::{Document, DocumentInner, Frame, FrameError};
use crate::geometry::BoundingBox;
use crate::mutation::MutationRecord;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Inline style subset the engine reads for visibility decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
}

impl Default for InlineStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
        }
    }
}

impl InlineStyle {
    /// Serialized form used as the `oldValue` of style mutation records.
    pub fn to_css(&self) -> String {
        format!(
            "display:{};visibility:{};opacity:{}",
            self.display, self.visibility, self.opacity
        )
    }
}

pub(crate) struct ElementNode {
    pub(crate) id: u64,
    pub(crate) tag: String,
    pub(crate) attributes: RefCell<BTreeMap<String, String>>,
    pub(crate) style: RefCell<InlineStyle>,
    pub(crate) bounds: Cell<BoundingBox>,
    pub(crate) disabled: Cell<bool>,
    pub(crate) checked: Cell<Option<bool>>,
    pub(crate) children: RefCell<Vec<Node>>,
    pub(crate) parent: RefCell<Weak<ElementNode>>,
    pub(crate) document: Weak<DocumentInner>,
    pub(crate) frame: RefCell<Option<Frame>>,
}

pub(crate) struct TextData {
    pub(crate) id: u64,
    pub(crate) text: RefCell<String>,
    pub(crate) parent: RefCell<Weak<ElementNode>>,
    pub(crate) document: Weak<DocumentInner>,
}

/// Handle to an element node.
#[derive(Clone)]
pub struct Element {
    pub(crate) node: Rc<ElementNode>,
}

/// Handle to a text node.
#[derive(Clone)]
pub struct TextNode {
    pub(crate) node: Rc<TextData>,
}

/// Either kind of child node.
#[derive(Clone)]
pub enum Node {
    Element(Element),
    Text(TextNode),
}

/// Non-owning element handle; upgrading fails once the element is gone.
#[derive(Clone, Default)]
pub struct WeakElement {
    node: Weak<ElementNode>,
}

impl WeakElement {
    pub fn upgrade(&self) -> Option<Element> {
        self.node.upgrade().map(|node| Element { node })
    }
}

impl Element {
    pub(crate) fn from_node(node: Rc<ElementNode>) -> Self {
        Element { node }
    }

    pub(crate) fn downgrade_node(&self) -> Weak<ElementNode> {
        Rc::downgrade(&self.node)
    }

    pub(crate) fn set_frame(&self, frame: Frame) {
        *self.node.frame.borrow_mut() = Some(frame);
    }

    pub(crate) fn create(tag: &str, document: Weak<DocumentInner>) -> Self {
        Element {
            node: Rc::new(ElementNode {
                id: next_node_id(),
                tag: tag.to_ascii_lowercase(),
                attributes: RefCell::new(BTreeMap::new()),
                style: RefCell::new(InlineStyle::default()),
                bounds: Cell::new(BoundingBox::default()),
                disabled: Cell::new(false),
                checked: Cell::new(None),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                document,
                frame: RefCell::new(None),
            }),
        }
    }

    /// Host-unique node identity; never reused within a process.
    pub fn node_id(&self) -> u64 {
        self.node.id
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.node.tag
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            node: Rc::downgrade(&self.node),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.node.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.node.attributes.borrow().contains_key(name)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let old = self
            .node
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self.record(MutationRecord::attributes(self.clone(), name, old));
    }

    pub fn remove_attribute(&self, name: &str) {
        let old = self.node.attributes.borrow_mut().remove(name);
        if old.is_some() {
            self.record(MutationRecord::attributes(self.clone(), name, old));
        }
    }

    pub fn style(&self) -> InlineStyle {
        self.node.style.borrow().clone()
    }

    pub fn set_display(&self, value: &str) {
        self.mutate_style(|style| style.display = value.to_string());
    }

    pub fn set_visibility(&self, value: &str) {
        self.mutate_style(|style| style.visibility = value.to_string());
    }

    pub fn set_opacity(&self, value: f64) {
        self.mutate_style(|style| style.opacity = value);
    }

    fn mutate_style(&self, apply: impl FnOnce(&mut InlineStyle)) {
        let old = self.node.style.borrow().to_css();
        apply(&mut self.node.style.borrow_mut());
        self.record(MutationRecord::attributes(self.clone(), "style", Some(old)));
    }

    /// Rendered bounding box, local to the owning document.
    pub fn bounds(&self) -> BoundingBox {
        self.node.bounds.get()
    }

    /// Layout input; geometry changes do not produce mutation records.
    pub fn set_bounds(&self, bounds: BoundingBox) {
        self.node.bounds.set(bounds);
    }

    pub fn is_disabled(&self) -> bool {
        self.node.disabled.get()
    }

    pub fn set_disabled(&self, disabled: bool) {
        if self.node.disabled.get() == disabled {
            return;
        }
        let old = (!disabled).then(String::new);
        self.node.disabled.set(disabled);
        self.record(MutationRecord::attributes(self.clone(), "disabled", old));
    }

    pub fn checked(&self) -> Option<bool> {
        self.node.checked.get()
    }

    /// Input state, not an attribute; no mutation record.
    pub fn set_checked(&self, checked: bool) {
        self.node.checked.set(Some(checked));
    }

    pub fn parent(&self) -> Option<Element> {
        self.node.parent.borrow().upgrade().map(|node| Element { node })
    }

    pub fn children(&self) -> Vec<Node> {
        self.node.children.borrow().clone()
    }

    pub fn child_elements(&self) -> Vec<Element> {
        self.node
            .children
            .borrow()
            .iter()
            .filter_map(Node::as_element)
            .cloned()
            .collect()
    }

    /// Concatenated text of all descendant text nodes, in tree order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in self.node.children.borrow().iter() {
            match child {
                Node::Text(text) => out.push_str(&text.text()),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Append a child, detaching it from any previous parent first. A
    /// reparent therefore yields a removal record on the old parent and an
    /// addition record on the new one within the same batch.
    pub fn append_child(&self, child: &Node) {
        if let Some(old_parent) = child.parent() {
            old_parent.detach(child);
        }
        child.set_parent(Some(self));
        self.node.children.borrow_mut().push(child.clone());
        self.record(MutationRecord::child_list(
            self.clone(),
            vec![child.clone()],
            Vec::new(),
        ));
    }

    pub fn remove_child(&self, child: &Node) {
        self.detach(child);
    }

    fn detach(&self, child: &Node) {
        let position = {
            let children = self.node.children.borrow();
            children.iter().position(|c| c.id() == child.id())
        };
        if let Some(position) = position {
            self.node.children.borrow_mut().remove(position);
            child.set_parent(None);
            self.record(MutationRecord::child_list(
                self.clone(),
                Vec::new(),
                vec![child.clone()],
            ));
        }
    }

    pub fn owner_document(&self) -> Option<Document> {
        self.node.document.upgrade().map(Document::from_inner)
    }

    /// True while the element's ancestor chain reaches its document body.
    pub fn is_attached(&self) -> bool {
        let Some(document) = self.owner_document() else {
            return false;
        };
        let root = document.body();
        let mut current = self.clone();
        loop {
            if current.ptr_eq(&root) {
                return true;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn focus(&self) {
        if let Some(document) = self.node.document.upgrade() {
            *document.focused.borrow_mut() = Rc::downgrade(&self.node);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.node.document.upgrade().is_some_and(|document| {
            document
                .focused
                .borrow()
                .upgrade()
                .is_some_and(|focused| Rc::ptr_eq(&focused, &self.node))
        })
    }

    /// Best-effort frame content access. Cross-origin frames deny access;
    /// a frame with no attached content behaves the same way.
    pub fn content_document(&self) -> Result<Document, FrameError> {
        match &*self.node.frame.borrow() {
            Some(frame) if frame.cross_origin => Err(FrameError::CrossOrigin {
                src: self.attribute("src").unwrap_or_default(),
            }),
            Some(frame) => Ok(frame.document.clone()),
            None => Err(FrameError::Unavailable),
        }
    }

    fn record(&self, record: MutationRecord) {
        if let Some(document) = self.node.document.upgrade() {
            document.enqueue(record);
        }
    }
}

impl TextNode {
    pub(crate) fn create(text: &str, document: Weak<DocumentInner>) -> Self {
        TextNode {
            node: Rc::new(TextData {
                id: next_node_id(),
                text: RefCell::new(text.to_string()),
                parent: RefCell::new(Weak::new()),
                document,
            }),
        }
    }

    pub fn node_id(&self) -> u64 {
        self.node.id
    }

    pub fn text(&self) -> String {
        self.node.text.borrow().clone()
    }

    /// Text churn is reported against the parent element so consumers
    /// rescan the affected subtree.
    pub fn set_text(&self, text: &str) {
        *self.node.text.borrow_mut() = text.to_string();
        if let (Some(parent), Some(document)) = (
            self.node.parent.borrow().upgrade(),
            self.node.document.upgrade(),
        ) {
            let parent = Element { node: parent };
            document.enqueue(MutationRecord::child_list(
                parent,
                vec![Node::Text(self.clone())],
                Vec::new(),
            ));
        }
    }
}

impl Node {
    pub fn id(&self) -> u64 {
        match self {
            Node::Element(element) => element.node_id(),
            Node::Text(text) => text.node_id(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    fn parent(&self) -> Option<Element> {
        let weak = match self {
            Node::Element(element) => element.node.parent.borrow().clone(),
            Node::Text(text) => text.node.parent.borrow().clone(),
        };
        weak.upgrade().map(|node| Element { node })
    }

    fn set_parent(&self, parent: Option<&Element>) {
        let weak = parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.node));
        match self {
            Node::Element(element) => *element.node.parent.borrow_mut() = weak,
            Node::Text(text) => *text.node.parent.borrow_mut() = weak,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<TextNode> for Node {
    fn from(text: TextNode) -> Self {
        Node::Text(text)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{}>", self.tag(), self.node_id())
    }
}

impl fmt::Debug for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#text({:?})", self.text())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => element.fmt(f),
            Node::Text(text) => text.fmt(f),
        }
    }
}
