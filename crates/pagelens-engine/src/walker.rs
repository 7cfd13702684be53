//! Bounded tree walk producing content items.
//!
//! The walk is a synchronous, run-to-completion DFS guarded three ways:
//! an already-assigned owner id makes re-entry idempotent, blocklisted
//! tags and `display:none` subtrees are skipped outright, and a global
//! visited counter enforces the session's hard node cap.

use tracing::debug;

use pagelens_dom::{Document, Element};

use crate::classify::{classify, Classification};
use crate::config::EngineConfig;
use crate::frames::FrameRegistry;
use crate::item::{ContentItem, ElementId, ElementMeta, ItemKind, ItemRect};
use crate::normalize::{clean_text, non_trivial_token};
use crate::state::CrawlState;

/// Tags whose subtrees carry no extractable content.
const BLOCKED_TAGS: [&str; 12] = [
    "script", "style", "noscript", "template", "svg", "canvas", "object", "embed", "head",
    "meta", "link", "title",
];

/// Tags probed during shallow rescans of moved/portal subtrees.
pub(crate) const INTERACTIVE_TAGS: [&str; 5] = ["a", "button", "input", "textarea", "select"];

/// Context propagated down the walk.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WalkContext {
    pub parent: Option<ElementId>,
    /// Inside an anchor: its descendant text is already captured on the
    /// link item and must not re-appear as separate text items.
    pub in_link: bool,
    /// Same, for buttons.
    pub in_button: bool,
}

pub(crate) struct Walker<'a> {
    pub state: &'a mut CrawlState,
    pub frames: &'a mut FrameRegistry,
    pub config: &'a EngineConfig,
    pub main: &'a Document,
}

impl Walker<'_> {
    pub(crate) fn walk(&mut self, element: &Element, ctx: WalkContext) {
        if self.state.id_of(element).is_some() {
            return;
        }
        if BLOCKED_TAGS.contains(&element.tag()) {
            return;
        }
        // The only hard exclusion; everything else is recorded hidden.
        if element.style().display == "none" {
            return;
        }
        if !self.state.admit() {
            return;
        }

        let id = self.state.assign_id(element);
        let cls = classify(element);
        let rect = self.page_rect(element, &cls);
        self.state.record_meta(
            id,
            ElementMeta {
                tag: element.tag().to_string(),
                role: cls.role.clone(),
                rect,
                parent: ctx.parent,
            },
        );

        if element.tag() == "iframe" {
            self.enter_frame(element, id, ctx, &cls, rect);
            return;
        }

        self.capture(element, id, ctx, &cls, rect);

        let child_ctx = WalkContext {
            parent: Some(id),
            in_link: ctx.in_link || element.tag() == "a",
            in_button: ctx.in_button || is_buttonish(element),
        };
        for child in element.child_elements() {
            self.walk(&child, child_ctx);
        }
    }

    /// Identify and capture one element without descending. Used by
    /// shallow rescans of moved/portal subtrees.
    pub(crate) fn capture_single(&mut self, element: &Element) -> bool {
        if self.state.id_of(element).is_some() {
            return false;
        }
        if element.style().display == "none" {
            return false;
        }
        if !self.state.admit() {
            return false;
        }
        let ctx = context_for(element, self.state);
        let id = self.state.assign_id(element);
        let cls = classify(element);
        let rect = self.page_rect(element, &cls);
        self.state.record_meta(
            id,
            ElementMeta {
                tag: element.tag().to_string(),
                role: cls.role.clone(),
                rect,
                parent: ctx.parent,
            },
        );
        self.capture(element, id, ctx, &cls, rect);
        true
    }

    /// Element rect in main-document coordinates.
    fn page_rect(&self, element: &Element, cls: &Classification) -> ItemRect {
        crate::frames::page_rect(element, cls.visible, self.frames, self.main)
    }

    /// Emit items for one element per its tag rule; returns the number of
    /// items produced.
    fn capture(
        &mut self,
        element: &Element,
        id: ElementId,
        ctx: WalkContext,
        cls: &Classification,
        rect: ItemRect,
    ) -> usize {
        let max_len = self.config.max_text_len;
        match element.tag() {
            "img" => {
                self.emit(
                    element,
                    id,
                    ctx.parent,
                    cls,
                    rect,
                    ItemKind::Image {
                        alt: element.attribute("alt"),
                        title: element.attribute("title"),
                        src: element.attribute("src"),
                    },
                );
                1
            }
            "a" => {
                let text = clean_text(&element.text_content(), max_len);
                let href = element.attribute("href");
                if href.is_none() && text.is_empty() {
                    return 0;
                }
                self.emit(element, id, ctx.parent, cls, rect, ItemKind::Link { href, text });
                1
            }
            _ if is_buttonish(element) => {
                let mut label = clean_text(&element.text_content(), max_len);
                if label.is_empty() {
                    label = "(no label)".to_string();
                }
                self.emit(element, id, ctx.parent, cls, rect, ItemKind::Button { label });
                1
            }
            "input" => {
                let input_type = element
                    .attribute("type")
                    .unwrap_or_else(|| "text".to_string());
                let label = field_label(element, &input_type);
                self.emit(
                    element,
                    id,
                    ctx.parent,
                    cls,
                    rect,
                    ItemKind::Input {
                        input_type,
                        label,
                        placeholder: element.attribute("placeholder"),
                    },
                );
                1
            }
            "textarea" => {
                let label = field_label(element, "textarea");
                self.emit(
                    element,
                    id,
                    ctx.parent,
                    cls,
                    rect,
                    ItemKind::Textarea {
                        label,
                        placeholder: element.attribute("placeholder"),
                    },
                );
                1
            }
            "select" => {
                let label = field_label(element, "select");
                self.emit(element, id, ctx.parent, cls, rect, ItemKind::Select { label });
                1
            }
            _ => self.capture_text(element, id, ctx, cls, rect),
        }
    }

    /// Direct text-node children become text items; an otherwise-empty
    /// leaf with a non-trivial class/id becomes a container item.
    fn capture_text(
        &mut self,
        element: &Element,
        id: ElementId,
        ctx: WalkContext,
        cls: &Classification,
        rect: ItemRect,
    ) -> usize {
        let mut emitted = 0;
        if !(ctx.in_link || ctx.in_button) {
            for child in element.children() {
                if let Some(text) = child.as_text() {
                    let text = clean_text(&text.text(), self.config.max_text_len);
                    if !text.is_empty() {
                        self.emit(element, id, ctx.parent, cls, rect, ItemKind::Text { text });
                        emitted += 1;
                    }
                }
            }
        }
        if emitted == 0 && element.child_elements().is_empty() && has_identity(element) {
            self.emit(element, id, ctx.parent, cls, rect, ItemKind::Container);
            emitted += 1;
        }
        emitted
    }

    fn enter_frame(
        &mut self,
        iframe: &Element,
        id: ElementId,
        ctx: WalkContext,
        cls: &Classification,
        rect: ItemRect,
    ) {
        match iframe.content_document() {
            Ok(content) => {
                self.frames.register(iframe, self.main);
                let body = content.body();
                self.walk(
                    &body,
                    WalkContext {
                        parent: Some(id),
                        in_link: false,
                        in_button: false,
                    },
                );
            }
            Err(err) => {
                debug!(
                    frame = iframe.node_id(),
                    error = %err,
                    "frame content inaccessible, emitting placeholder"
                );
                self.emit(
                    iframe,
                    id,
                    ctx.parent,
                    cls,
                    rect,
                    ItemKind::Iframe {
                        src: iframe.attribute("src"),
                    },
                );
            }
        }
    }

    fn emit(
        &mut self,
        element: &Element,
        owner: ElementId,
        parent: Option<ElementId>,
        cls: &Classification,
        rect: ItemRect,
        kind: ItemKind,
    ) {
        let item = ContentItem {
            id: self.state.next_item_id(),
            owner,
            parent,
            tag: element.tag().to_string(),
            role: cls.role.clone(),
            rect,
            kind,
            is_clickable: cls.is_clickable,
            is_inputtable: cls.is_inputtable,
            is_disabled: cls.is_disabled,
            is_checked: cls.is_checked,
            is_focused: cls.is_focused,
        };
        self.state.push_item(item);
    }
}

pub(crate) fn is_buttonish(element: &Element) -> bool {
    element.tag() == "button" || element.attribute("role").as_deref() == Some("button")
}

/// Reconstruct walk context for a subtree re-entry from the element's
/// ancestors.
pub(crate) fn context_for(element: &Element, state: &CrawlState) -> WalkContext {
    let mut ctx = WalkContext::default();
    let mut current = element.parent();
    while let Some(ancestor) = current {
        if ctx.parent.is_none() {
            ctx.parent = state.id_of(&ancestor);
        }
        if ancestor.tag() == "a" {
            ctx.in_link = true;
        }
        if is_buttonish(&ancestor) {
            ctx.in_button = true;
        }
        current = ancestor.parent();
    }
    ctx
}

fn has_identity(element: &Element) -> bool {
    element
        .attribute("class")
        .as_deref()
        .and_then(non_trivial_token)
        .is_some()
        || element
            .attribute("id")
            .as_deref()
            .and_then(non_trivial_token)
            .is_some()
}

/// aria-label → name → placeholder → bracketed type.
fn field_label(element: &Element, kind: &str) -> String {
    element
        .attribute("aria-label")
        .or_else(|| element.attribute("name"))
        .or_else(|| element.attribute("placeholder"))
        .unwrap_or_else(|| format!("[{}]", kind))
}
