//! Document: tree root, focus, scroll, frames, and the mutation queue.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use thiserror::Error;
use tracing::debug;

use crate::geometry::Viewport;
use crate::mutation::{MutationRecord, MutationSubscription};
use crate::node::{Element, ElementNode, TextNode};

/// Frame content access failures.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("cross-origin frame content is not accessible: {src}")]
    CrossOrigin { src: String },

    #[error("frame has no content document")]
    Unavailable,

    #[error("element <{tag}> is not a frame")]
    NotAFrame { tag: String },
}

/// Content attached behind an iframe element.
pub(crate) struct Frame {
    pub(crate) document: Document,
    pub(crate) cross_origin: bool,
}

pub(crate) struct DocumentInner {
    root: Element,
    viewport: Cell<Viewport>,
    scroll: Cell<(f64, f64)>,
    pub(crate) focused: RefCell<Weak<ElementNode>>,
    subscribers: RefCell<Vec<Weak<RefCell<Vec<MutationRecord>>>>>,
    host: RefCell<Weak<ElementNode>>,
}

impl DocumentInner {
    /// Fan a record out to every live subscriber; dead ones are dropped.
    pub(crate) fn enqueue(&self, record: MutationRecord) {
        self.subscribers.borrow_mut().retain(|subscriber| {
            if let Some(queue) = subscriber.upgrade() {
                queue.borrow_mut().push(record.clone());
                true
            } else {
                false
            }
        });
    }
}

/// A single live document: one body tree, one focus, one scroll position.
/// Cloning the handle shares the same document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<DocumentInner>| DocumentInner {
            root: Element::create("body", weak.clone()),
            viewport: Cell::new(Viewport::default()),
            scroll: Cell::new((0.0, 0.0)),
            focused: RefCell::new(Weak::new()),
            subscribers: RefCell::new(Vec::new()),
            host: RefCell::new(Weak::new()),
        });
        Document { inner }
    }

    pub(crate) fn from_inner(inner: Rc<DocumentInner>) -> Self {
        Document { inner }
    }

    pub fn body(&self) -> Element {
        self.inner.root.clone()
    }

    pub fn create_element(&self, tag: &str) -> Element {
        Element::create(tag, Rc::downgrade(&self.inner))
    }

    pub fn create_text(&self, text: &str) -> TextNode {
        TextNode::create(text, Rc::downgrade(&self.inner))
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.viewport.set(viewport);
    }

    pub fn scroll_x(&self) -> f64 {
        self.inner.scroll.get().0
    }

    pub fn scroll_y(&self) -> f64 {
        self.inner.scroll.get().1
    }

    pub fn set_scroll(&self, x: f64, y: f64) {
        self.inner.scroll.set((x, y));
    }

    pub fn focused_element(&self) -> Option<Element> {
        self.inner.focused.borrow().upgrade().map(Element::from_node)
    }

    /// Subscribe to the mutation stream. Each subscription sees every
    /// record enqueued after this call, drained in batches.
    pub fn observe(&self) -> MutationSubscription {
        let queue = Rc::new(RefCell::new(Vec::new()));
        self.inner.subscribers.borrow_mut().push(Rc::downgrade(&queue));
        debug!("mutation subscription registered");
        MutationSubscription::new(queue)
    }

    /// Attach content behind an iframe element. Cross-origin content stays
    /// attached but denies access through `Element::content_document`.
    pub fn attach_frame(
        &self,
        iframe: &Element,
        content: Document,
        cross_origin: bool,
    ) -> Result<(), FrameError> {
        if iframe.tag() != "iframe" {
            return Err(FrameError::NotAFrame {
                tag: iframe.tag().to_string(),
            });
        }
        *content.inner.host.borrow_mut() = iframe.downgrade_node();
        debug!(iframe = iframe.node_id(), cross_origin, "frame attached");
        iframe.set_frame(Frame {
            document: content,
            cross_origin,
        });
        Ok(())
    }

    /// The iframe element hosting this document, when it is frame content.
    pub fn host_frame(&self) -> Option<Element> {
        self.inner.host.borrow().upgrade().map(Element::from_node)
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;
    use crate::node::Node;

    #[test]
    fn test_append_and_remove_produce_child_list_records() {
        let doc = Document::new();
        let sub = doc.observe();
        let div = doc.create_element("div");
        doc.body().append_child(&div.clone().into());

        let batch = sub.take_batch();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].kind, MutationKind::ChildList);
        assert_eq!(batch[0].added.len(), 1);
        assert!(batch[0].target.ptr_eq(&doc.body()));

        doc.body().remove_child(&div.into());
        let batch = sub.take_batch();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].removed.len(), 1);
    }

    #[test]
    fn test_reparent_yields_remove_plus_add_in_one_batch() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");
        doc.body().append_child(&a.clone().into());
        doc.body().append_child(&b.clone().into());
        a.append_child(&child.clone().into());

        let sub = doc.observe();
        b.append_child(&child.clone().into());

        let batch = sub.take_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].removed.len(), 1);
        assert!(batch[0].target.ptr_eq(&a));
        assert_eq!(batch[1].added.len(), 1);
        assert!(batch[1].target.ptr_eq(&b));
        assert!(child.parent().is_some_and(|p| p.ptr_eq(&b)));
    }

    #[test]
    fn test_attribute_record_carries_old_value() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.body().append_child(&div.clone().into());
        div.set_attribute("class", "collapsed");

        let sub = doc.observe();
        div.set_attribute("class", "expanded");

        let batch = sub.take_batch();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].kind, MutationKind::Attributes);
        assert_eq!(batch[0].attribute_name.as_deref(), Some("class"));
        assert_eq!(batch[0].old_value.as_deref(), Some("collapsed"));
    }

    #[test]
    fn test_cross_origin_frame_denies_access() {
        let doc = Document::new();
        let iframe = doc.create_element("iframe");
        iframe.set_attribute("src", "https://ads.example/frame");
        doc.body().append_child(&iframe.clone().into());
        doc.attach_frame(&iframe, Document::new(), true)
            .expect("attach should succeed");

        match iframe.content_document() {
            Err(FrameError::CrossOrigin { src }) => {
                assert_eq!(src, "https://ads.example/frame");
            }
            other => panic!("expected cross-origin denial, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_same_origin_frame_exposes_content_and_host() {
        let doc = Document::new();
        let iframe = doc.create_element("iframe");
        doc.body().append_child(&iframe.clone().into());
        let inner = Document::new();
        doc.attach_frame(&iframe, inner.clone(), false)
            .expect("attach should succeed");

        let content = iframe.content_document().expect("same-origin access");
        assert!(content.ptr_eq(&inner));
        assert!(content.host_frame().is_some_and(|host| host.ptr_eq(&iframe)));
    }

    #[test]
    fn test_attach_frame_rejects_non_iframe() {
        let doc = Document::new();
        let div = doc.create_element("div");
        assert!(matches!(
            doc.attach_frame(&div, Document::new(), false),
            Err(FrameError::NotAFrame { .. })
        ));
    }

    #[test]
    fn test_focus_tracking() {
        let doc = Document::new();
        let input = doc.create_element("input");
        doc.body().append_child(&input.clone().into());
        assert!(doc.focused_element().is_none());

        input.focus();
        assert!(input.is_focused());
        assert!(doc.focused_element().is_some_and(|e| e.ptr_eq(&input)));
    }

    #[test]
    fn test_detached_subtree_is_collectable() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.body().append_child(&div.clone().into());
        let weak = div.downgrade();

        doc.body().remove_child(&Node::Element(div));
        assert!(weak.upgrade().is_none(), "no strong handles should remain");
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let doc = Document::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        div.append_child(&doc.create_text("Hello ").into());
        span.append_child(&doc.create_text("world").into());
        div.append_child(&span.into());
        assert_eq!(div.text_content(), "Hello world");
    }
}
