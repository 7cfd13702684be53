//! Incremental rescans of affected subtrees.
//!
//! Regular roots re-enter the tree walker: the existing-id guard makes
//! the cost proportional to genuinely new nodes. Moved/portal roots get a
//! shallow probe for interactive elements that were never identified;
//! relocated subtrees mostly contain already-known content, so a full
//! re-walk would be wasted work. On top of both, previously hidden items
//! whose element has become visible re-enter the delta with refreshed
//! coordinates.

use std::collections::HashSet;

use pagelens_dom::{Document, Element};

use crate::classify::classify;
use crate::config::EngineConfig;
use crate::dedup::dedup_visible;
use crate::diff::BatchDiff;
use crate::frames::{page_rect, FrameRegistry};
use crate::item::{ContentItem, ItemId};
use crate::state::CrawlState;
use crate::walker::{context_for, Walker, INTERACTIVE_TAGS};

pub(crate) fn incremental_scan(
    diff: &BatchDiff,
    state: &mut CrawlState,
    frames: &mut FrameRegistry,
    config: &EngineConfig,
    main: &Document,
) -> Vec<ContentItem> {
    let mark = state.delta_mark();

    {
        let mut walker = Walker {
            state: &mut *state,
            frames: &mut *frames,
            config,
            main,
        };
        for root in &diff.regular {
            if !root.is_attached() {
                continue;
            }
            let ctx = context_for(root, walker.state);
            walker.walk(root, ctx);
        }
        for root in diff.moved.iter().chain(diff.portal.iter()) {
            if !root.is_attached() {
                continue;
            }
            shallow_rescan(root, &mut walker);
        }
    }

    let revived = reconcile_visibility(state, frames, main, mark);

    let fresh = state.take_from(mark);
    let revived_ids: HashSet<ItemId> = revived.iter().map(|item| item.id).collect();
    let mut union = revived;
    union.extend(fresh);
    let delta = dedup_visible(union, config.dedup_grid);

    // Merge surviving new items back into the live state. Revived items
    // were updated in place and are already there.
    for item in &delta {
        if !revived_ids.contains(&item.id) {
            state.push_item(item.clone());
        }
    }
    delta
}

/// Probe a relocated/disclosed subtree for interactive elements lacking
/// an owner id; known content is deliberately not re-walked.
fn shallow_rescan(root: &Element, walker: &mut Walker<'_>) {
    let mut pending = vec![root.clone()];
    while let Some(element) = pending.pop() {
        if INTERACTIVE_TAGS.contains(&element.tag()) {
            walker.capture_single(&element);
        }
        for child in element.child_elements() {
            pending.push(child);
        }
    }
}

/// Visibility reconciliation: hidden items whose backing element is now
/// visible are re-emitted with refreshed coordinates, and the stored item
/// is updated in place.
fn reconcile_visibility(
    state: &mut CrawlState,
    frames: &FrameRegistry,
    main: &Document,
    mark: usize,
) -> Vec<ContentItem> {
    let mut revived = Vec::new();
    for index in 0..mark {
        let (owner, hidden) = {
            let item = &state.items[index];
            (item.owner, item.rect.hidden)
        };
        if !hidden {
            continue;
        }
        let Some(element) = state.element(owner) else {
            continue;
        };
        if !element.is_attached() || element.style().display == "none" {
            continue;
        }
        let cls = classify(&element);
        if !cls.visible {
            continue;
        }
        let rect = page_rect(&element, true, frames, main);
        let item = &mut state.items[index];
        item.rect = rect;
        revived.push(item.clone());
    }
    revived
}
