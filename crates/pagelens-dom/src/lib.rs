//! In-memory live document tree for the Pagelens engine.
//!
//! This crate is the host-side tree abstraction the extraction engine
//! consumes: child enumeration, tag/attribute reads, inline style and
//! computed-visibility inputs, bounding geometry, text content, focus
//! state, frame (iframe) attachment with cross-origin denial, and a
//! mutation-subscription primitive delivering batches of records.
//!
//! The tree is single-threaded by design. Handles are cheap `Rc` clones;
//! parent links are weak so detached subtrees become collectable as soon
//! as the last strong handle (including handles held by still-undrained
//! mutation records) goes away.

mod document;
mod geometry;
mod mutation;
mod node;

pub use document::{Document, FrameError};
pub use geometry::{BoundingBox, Viewport};
pub use mutation::{MutationKind, MutationRecord, MutationSubscription};
pub use node::{Element, InlineStyle, Node, TextNode, WeakElement};
