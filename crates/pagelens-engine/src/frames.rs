//! Cross-frame coordinate transformation.
//!
//! Frame content reports geometry local to its own document. The registry
//! snapshots each accessible iframe's page-relative, scroll-adjusted
//! offset at walk time and translates frame-local rects into
//! main-document space. A missing offset degrades to untransformed
//! coordinates with a warning; it never fails a pass.

use std::collections::HashMap;

use tracing::warn;

use pagelens_dom::{BoundingBox, Document, Element};

/// Registered (x, y) translation for one iframe.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameOffset {
    pub x: f64,
    pub y: f64,
}

/// Per-session registry of iframe offsets, keyed by host node identity.
/// Cleared on every full re-analysis.
#[derive(Default)]
pub struct FrameRegistry {
    offsets: HashMap<u64, FrameOffset>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    /// Snapshot an iframe's offset: its viewport rect plus the owning
    /// document's scroll, composed with the hosting frame's offset when
    /// the iframe is itself nested.
    pub fn register(&mut self, iframe: &Element, main: &Document) {
        let bounds = iframe.bounds();
        let mut offset = FrameOffset {
            x: bounds.x,
            y: bounds.y,
        };
        if let Some(owner) = iframe.owner_document() {
            offset.x += owner.scroll_x();
            offset.y += owner.scroll_y();
            if !owner.ptr_eq(main) {
                if let Some(outer) = Self::find_parent_iframe(iframe, main) {
                    let parent = self.offset_of(&outer).unwrap_or_else(|| {
                        warn!(
                            frame = outer.node_id(),
                            "hosting frame has no registered offset"
                        );
                        FrameOffset::default()
                    });
                    offset.x += parent.x;
                    offset.y += parent.y;
                }
            }
        }
        self.offsets.insert(iframe.node_id(), offset);
    }

    pub fn offset_of(&self, iframe: &Element) -> Option<FrameOffset> {
        self.offsets.get(&iframe.node_id()).copied()
    }

    /// Translate a frame-local rect into main-document space. An
    /// unregistered frame passes coordinates through unchanged.
    pub fn transform(&self, rect: BoundingBox, iframe: &Element) -> BoundingBox {
        match self.offset_of(iframe) {
            Some(offset) => rect.translated(offset.x, offset.y),
            None => {
                warn!(
                    frame = iframe.node_id(),
                    "no registered offset for frame, leaving coordinates unchanged"
                );
                rect
            }
        }
    }

    /// Whether the element belongs to a different document than `main`.
    pub fn needs_transform(element: &Element, main: &Document) -> bool {
        element
            .owner_document()
            .is_some_and(|doc| !doc.ptr_eq(main))
    }

    /// Resolve the iframe hosting an element's document. Returns `None`
    /// for main-document elements and for orphaned frame content.
    pub fn find_parent_iframe(element: &Element, main: &Document) -> Option<Element> {
        let doc = element.owner_document()?;
        if doc.ptr_eq(main) {
            return None;
        }
        doc.host_frame()
    }
}

/// An element's rect in main-document coordinates, hidden-flagged when
/// the element is not visible.
pub(crate) fn page_rect(
    element: &Element,
    visible: bool,
    frames: &FrameRegistry,
    main: &Document,
) -> crate::item::ItemRect {
    let mut bounds = element.bounds();
    if FrameRegistry::needs_transform(element, main) {
        if let Some(host) = FrameRegistry::find_parent_iframe(element, main) {
            bounds = frames.transform(bounds, &host);
        }
    }
    crate::item::ItemRect::from_box(bounds, !visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_content(main: &Document, x: f64, y: f64) -> (Element, Document) {
        let iframe = main.create_element("iframe");
        iframe.set_bounds(BoundingBox::new(x, y, 400.0, 300.0));
        main.body().append_child(&iframe.clone().into());
        let content = Document::new();
        main.attach_frame(&iframe, content.clone(), false)
            .expect("attach");
        (iframe, content)
    }

    #[test]
    fn test_transform_adds_registered_offset() {
        let main = Document::new();
        let (iframe, content) = frame_with_content(&main, 100.0, 50.0);

        let mut frames = FrameRegistry::new();
        frames.register(&iframe, &main);

        let inner = content.create_element("button");
        inner.set_bounds(BoundingBox::new(10.0, 20.0, 80.0, 30.0));
        content.body().append_child(&inner.clone().into());

        let rect = frames.transform(inner.bounds(), &iframe);
        assert_eq!(rect.x, 110.0);
        assert_eq!(rect.y, 70.0);
    }

    #[test]
    fn test_register_is_scroll_adjusted() {
        let main = Document::new();
        main.set_scroll(0.0, 600.0);
        let (iframe, _) = frame_with_content(&main, 100.0, 50.0);

        let mut frames = FrameRegistry::new();
        frames.register(&iframe, &main);
        let offset = frames.offset_of(&iframe).expect("registered");
        assert_eq!(offset.y, 650.0);
    }

    #[test]
    fn test_missing_offset_passes_through() {
        let main = Document::new();
        let (iframe, _) = frame_with_content(&main, 100.0, 50.0);

        let frames = FrameRegistry::new();
        let rect = frames.transform(BoundingBox::new(1.0, 2.0, 3.0, 4.0), &iframe);
        assert_eq!(rect.x, 1.0);
        assert_eq!(rect.y, 2.0);
    }

    #[test]
    fn test_needs_transform_and_parent_lookup() {
        let main = Document::new();
        let (iframe, content) = frame_with_content(&main, 0.0, 0.0);

        let local = main.create_element("div");
        main.body().append_child(&local.clone().into());
        assert!(!FrameRegistry::needs_transform(&local, &main));
        assert!(FrameRegistry::find_parent_iframe(&local, &main).is_none());

        let framed = content.create_element("div");
        content.body().append_child(&framed.clone().into());
        assert!(FrameRegistry::needs_transform(&framed, &main));
        assert!(FrameRegistry::find_parent_iframe(&framed, &main)
            .is_some_and(|host| host.ptr_eq(&iframe)));
    }

    #[test]
    fn test_nested_frames_compose_offsets() {
        let main = Document::new();
        let (outer, outer_doc) = frame_with_content(&main, 100.0, 100.0);

        let inner = outer_doc.create_element("iframe");
        inner.set_bounds(BoundingBox::new(10.0, 20.0, 200.0, 150.0));
        outer_doc.body().append_child(&inner.clone().into());
        let inner_doc = Document::new();
        outer_doc
            .attach_frame(&inner, inner_doc, false)
            .expect("attach");

        let mut frames = FrameRegistry::new();
        frames.register(&outer, &main);
        frames.register(&inner, &main);

        let offset = frames.offset_of(&inner).expect("registered");
        assert_eq!(offset.x, 110.0);
        assert_eq!(offset.y, 120.0);
    }
}
