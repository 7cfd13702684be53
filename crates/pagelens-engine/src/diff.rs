//! Mutation batch classification.
//!
//! A settled batch is split into three disjoint element sets: **moved**
//! (reparented within the batch, or known elements with class/id/style
//! churn), **portal** (disclosure-looking transitions plus their known
//! descendants), and **regular** (everything newly added or mutated that
//! the other two did not claim). Moved/portal content is mostly already
//! identified, so the scanner probes it shallowly instead of re-walking.

use std::collections::HashSet;

use regex::RegexSet;
use thiserror::Error;
use tracing::debug;

use pagelens_dom::{Element, MutationKind, MutationRecord, Node};

use crate::state::CrawlState;

/// Decides whether an attribute transition looks like a show/hide toggle.
/// Page conventions vary, so the heuristic is swappable without touching
/// the differ's control flow.
pub trait DisclosurePredicate {
    /// `known_element` is true when the session already identified the
    /// target element.
    fn is_disclosure(
        &self,
        attribute: &str,
        old: Option<&str>,
        new: Option<&str>,
        known_element: bool,
    ) -> bool;
}

/// Errors building a disclosure predicate.
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("invalid disclosure marker pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Default heuristic: the new class value gains a disclosure marker the
/// old one lacked, or a known container's id is rewritten wholesale.
pub struct MarkerDisclosure {
    markers: RegexSet,
}

impl MarkerDisclosure {
    pub const DEFAULT_MARKERS: [&'static str; 5] =
        ["expanded", "open", "show", "visible", "active"];

    pub fn with_markers<I, S>(patterns: I) -> Result<Self, PredicateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            markers: RegexSet::new(patterns)?,
        })
    }
}

impl Default for MarkerDisclosure {
    fn default() -> Self {
        // The default marker literals are always valid patterns.
        Self::with_markers(Self::DEFAULT_MARKERS).unwrap_or_else(|_| Self {
            markers: RegexSet::empty(),
        })
    }
}

impl DisclosurePredicate for MarkerDisclosure {
    fn is_disclosure(
        &self,
        attribute: &str,
        old: Option<&str>,
        new: Option<&str>,
        known_element: bool,
    ) -> bool {
        match attribute {
            "class" => {
                let old_matches = self.markers.matches(old.unwrap_or(""));
                self.markers
                    .matches(new.unwrap_or(""))
                    .iter()
                    .any(|idx| !old_matches.matched(idx))
            }
            // Opaque container-id churn on an element we already know.
            "id" => {
                known_element
                    && old.is_some_and(|o| !o.is_empty())
                    && new.is_some_and(|n| !n.is_empty())
                    && old != new
            }
            _ => false,
        }
    }
}

/// Disjoint classification of one settled mutation batch.
pub struct BatchDiff {
    pub moved: Vec<Element>,
    pub portal: Vec<Element>,
    pub regular: Vec<Element>,
}

/// Classify one settled batch against the session's known elements.
pub fn classify_batch(
    batch: &[MutationRecord],
    state: &CrawlState,
    predicate: &dyn DisclosurePredicate,
) -> BatchDiff {
    let mut diff = BatchDiff {
        moved: Vec::new(),
        portal: Vec::new(),
        regular: Vec::new(),
    };
    let mut claimed: HashSet<u64> = HashSet::new();

    let mut removed_ids: HashSet<u64> = HashSet::new();
    for record in batch.iter().filter(|r| r.kind == MutationKind::ChildList) {
        for node in &record.removed {
            removed_ids.insert(node.id());
        }
    }

    // Portal claims come first: a disclosure can reveal a previously
    // skipped subtree, so the element's known descendants are claimed too.
    for record in batch.iter().filter(|r| r.kind == MutationKind::Attributes) {
        let Some(name) = record.attribute_name.as_deref() else {
            continue;
        };
        let target = &record.target;
        let new = target.attribute(name);
        let known = state.id_of(target).is_some();
        if predicate.is_disclosure(name, record.old_value.as_deref(), new.as_deref(), known)
            && claimed.insert(target.node_id())
        {
            diff.portal.push(target.clone());
            collect_known_descendants(target, state, &mut claimed, &mut diff.portal);
        }
    }

    // Moved: present in both removed and added sets of the same batch,
    // or known elements whose class/id/style changed.
    for record in batch {
        match record.kind {
            MutationKind::ChildList => {
                for node in &record.added {
                    let Some(element) = node.as_element() else {
                        continue;
                    };
                    if removed_ids.contains(&element.node_id())
                        && claimed.insert(element.node_id())
                    {
                        diff.moved.push(element.clone());
                    }
                }
            }
            MutationKind::Attributes => {
                let target = &record.target;
                let name = record.attribute_name.as_deref().unwrap_or("");
                if matches!(name, "class" | "id" | "style")
                    && state.id_of(target).is_some()
                    && claimed.insert(target.node_id())
                {
                    diff.moved.push(target.clone());
                }
            }
        }
    }

    // Regular: whatever is left.
    for record in batch {
        match record.kind {
            MutationKind::ChildList => {
                let mut text_changed = false;
                for node in &record.added {
                    match node {
                        Node::Element(element) => {
                            if claimed.insert(element.node_id()) {
                                diff.regular.push(element.clone());
                            }
                        }
                        Node::Text(_) => text_changed = true,
                    }
                }
                if text_changed && claimed.insert(record.target.node_id()) {
                    diff.regular.push(record.target.clone());
                }
            }
            MutationKind::Attributes => {
                if claimed.insert(record.target.node_id()) {
                    diff.regular.push(record.target.clone());
                }
            }
        }
    }

    debug!(
        moved = diff.moved.len(),
        portal = diff.portal.len(),
        regular = diff.regular.len(),
        "mutation batch classified"
    );
    diff
}

fn collect_known_descendants(
    root: &Element,
    state: &CrawlState,
    claimed: &mut HashSet<u64>,
    out: &mut Vec<Element>,
) {
    for child in root.child_elements() {
        if state.id_of(&child).is_some() && claimed.insert(child.node_id()) {
            out.push(child.clone());
        }
        collect_known_descendants(&child, state, claimed, out);
    }
}
