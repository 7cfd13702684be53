//! Mutation records and subscriptions.

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::{Element, Node};

/// What kind of change a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
}

/// One observed change. Added/removed handles are strong so a consumer can
/// still inspect nodes that left the tree before the batch was drained.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: Element,
    pub added: Vec<Node>,
    pub removed: Vec<Node>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(target: Element, added: Vec<Node>, removed: Vec<Node>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub(crate) fn attributes(target: Element, name: &str, old_value: Option<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }
}

/// Drain-style subscription to a document's mutation stream. Dropping the
/// subscription disconnects it.
pub struct MutationSubscription {
    queue: Rc<RefCell<Vec<MutationRecord>>>,
}

impl MutationSubscription {
    pub(crate) fn new(queue: Rc<RefCell<Vec<MutationRecord>>>) -> Self {
        Self { queue }
    }

    /// Everything observed since the last call, as one batch.
    pub fn take_batch(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }
}
