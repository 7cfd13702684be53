//! Incremental DOM content extraction and change tracking.
//!
//! Pagelens converts a live, mutating document tree into a stable,
//! deduplicated, visually ordered collection of semantic content items,
//! and keeps that collection synchronized as the page mutates without
//! re-scanning the whole tree on every change.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  walk   ┌────────────┐  dedup + sort  ┌──────────────┐
//! │  Document  │ ──────► │ CrawlState │ ─────────────► │ AnalysisResult│
//! └────────────┘         └────────────┘                └──────────────┘
//!       │ mutations                ▲
//!       ▼                          │ incremental scan
//! ┌────────────┐  classify  ┌────────────┐
//! │  Observer  │ ─────────► │ BatchDiff  │   moved / portal / regular
//! └────────────┘            └────────────┘
//! ```
//!
//! A full [`Engine::analyze`] pass walks the tree under a hard node
//! budget, classifies each element (visibility, structural role,
//! actionability), normalizes coordinates across same-origin frames,
//! deduplicates visually identical items, and returns them in visual
//! order. [`Engine::start_observing`] then keeps the collection live: a
//! debounced incremental pass classifies each settled mutation burst into
//! moved, portal-changed and regular roots, rescans only the affected
//! subtrees, and emits the resulting delta.

mod analyzer;
mod classify;
mod config;
mod dedup;
mod diff;
mod engine;
mod frames;
mod item;
mod normalize;
mod observer;
mod scanner;
mod state;
mod walker;

pub use analyzer::AnalysisResult;
pub use classify::{classify, structural_role, Classification};
pub use config::EngineConfig;
pub use diff::{
    classify_batch, BatchDiff, DisclosurePredicate, MarkerDisclosure, PredicateError,
};
pub use engine::Engine;
pub use frames::{FrameOffset, FrameRegistry};
pub use item::{ContentItem, ElementId, ElementMeta, ItemId, ItemKind, ItemRect, PageStats};
pub use normalize::clean_text;
pub use observer::DeltaCallback;
pub use state::CrawlState;

/// Attribute used to tag identified elements so identity survives
/// re-renders independently of the in-memory table.
pub const ID_ATTR: &str = "data-pagelens-id";
