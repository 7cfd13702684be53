//! Per-session crawl state: id issuance, weak element table, items.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use pagelens_dom::{Element, WeakElement};

use crate::item::{ContentItem, ElementId, ElementMeta, ItemId};
use crate::ID_ATTR;

/// Session arena for one analysis. A full analysis starts from a fresh
/// state; incremental passes reuse the live one. Element handles are weak
/// so the table never extends element lifetime.
pub struct CrawlState {
    next_element_id: ElementId,
    next_item_id: ItemId,
    /// Host node identity → owner id.
    ids: HashMap<u64, ElementId>,
    /// Owner id → weak element handle.
    handles: HashMap<ElementId, WeakElement>,
    meta: HashMap<ElementId, ElementMeta>,
    pub(crate) items: Vec<ContentItem>,
    visited: usize,
    node_cap: usize,
    exhausted: bool,
}

impl CrawlState {
    pub fn new(node_cap: usize) -> Self {
        Self {
            next_element_id: 1,
            next_item_id: 1,
            ids: HashMap::new(),
            handles: HashMap::new(),
            meta: HashMap::new(),
            items: Vec::new(),
            visited: 0,
            node_cap,
            exhausted: false,
        }
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn budget_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Count one node against the budget. Once the cap is hit, recursion
    /// stops everywhere: every further admit fails for the session.
    pub(crate) fn admit(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if self.visited >= self.node_cap {
            self.exhausted = true;
            warn!(cap = self.node_cap, "node budget exhausted, truncating crawl");
            return false;
        }
        self.visited += 1;
        true
    }

    pub fn id_of(&self, element: &Element) -> Option<ElementId> {
        self.ids.get(&element.node_id()).copied()
    }

    /// Issue an owner id and tag the element with the persistent
    /// identifier attribute so identity survives re-renders.
    pub(crate) fn assign_id(&mut self, element: &Element) -> ElementId {
        let id = self.next_element_id;
        self.next_element_id += 1;
        self.ids.insert(element.node_id(), id);
        self.handles.insert(id, element.downgrade());
        element.set_attribute(ID_ATTR, &id.to_string());
        id
    }

    pub(crate) fn record_meta(&mut self, id: ElementId, meta: ElementMeta) {
        self.meta.insert(id, meta);
    }

    pub fn meta(&self, id: ElementId) -> Option<&ElementMeta> {
        self.meta.get(&id)
    }

    /// Upgrade an owner id back to a live element, when it still exists.
    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.handles.get(&id).and_then(WeakElement::upgrade)
    }

    pub(crate) fn next_item_id(&mut self) -> ItemId {
        let id = self.next_item_id;
        self.next_item_id += 1;
        id
    }

    pub(crate) fn push_item(&mut self, item: ContentItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Index marking where a delta begins; items appended past it belong
    /// to the current incremental pass.
    pub(crate) fn delta_mark(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn take_from(&mut self, mark: usize) -> Vec<ContentItem> {
        self.items.split_off(mark)
    }

    /// Drop id-table entries whose element has been collected. Metadata is
    /// retained so items that referenced them keep their structural
    /// context.
    pub(crate) fn sweep(&mut self) {
        let dead: HashSet<ElementId> = self
            .handles
            .iter()
            .filter(|(_, handle)| handle.upgrade().is_none())
            .map(|(id, _)| *id)
            .collect();
        if dead.is_empty() {
            return;
        }
        self.ids.retain(|_, owner| !dead.contains(owner));
        self.handles.retain(|id, _| !dead.contains(id));
        debug!(count = dead.len(), "swept dead element entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelens_dom::{Document, Node};

    #[test]
    fn test_ids_are_unique_and_stable() {
        let doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let mut state = CrawlState::new(100);

        let id_a = state.assign_id(&a);
        let id_b = state.assign_id(&b);
        assert_ne!(id_a, id_b);
        assert_eq!(state.id_of(&a), Some(id_a));
        assert_eq!(a.attribute(ID_ATTR).as_deref(), Some(id_a.to_string().as_str()));
    }

    #[test]
    fn test_admit_enforces_hard_cap() {
        let mut state = CrawlState::new(2);
        assert!(state.admit());
        assert!(state.admit());
        assert!(!state.admit(), "third admit must fail");
        assert!(!state.admit(), "and every one after it");
        assert!(state.budget_exhausted());
        assert_eq!(state.visited(), 2);
    }

    #[test]
    fn test_sweep_drops_collected_elements() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.body().append_child(&el.clone().into());
        let mut state = CrawlState::new(100);
        let id = state.assign_id(&el);

        doc.body().remove_child(&Node::Element(el));
        state.sweep();
        assert!(state.element(id).is_none());
    }

    #[test]
    fn test_sweep_keeps_live_elements() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.body().append_child(&el.clone().into());
        let mut state = CrawlState::new(100);
        let id = state.assign_id(&el);

        state.sweep();
        assert!(state.element(id).is_some_and(|e| e.ptr_eq(&el)));
    }
}
