//! Dynamic observation: debounced incremental passes over mutation bursts.
//!
//! Two-state machine: idle until a qualifying batch arrives, then pending
//! with a debounce deadline that every further batch pushes out. When a
//! burst finally settles, the staged records run through the differ and
//! the incremental scanner, and the resulting delta is emitted to the
//! registered callback. The machine is driven by `pump(now)`; time comes
//! in from the host so the whole thing is deterministic under test.

use std::time::{Duration, Instant};

use tracing::debug;

use pagelens_dom::{Document, MutationRecord, MutationSubscription};

use crate::config::EngineConfig;
use crate::diff::{classify_batch, DisclosurePredicate};
use crate::frames::FrameRegistry;
use crate::item::ContentItem;
use crate::scanner::incremental_scan;
use crate::state::CrawlState;
use crate::ID_ATTR;

/// Consumer of settled deltas. Emission is fire-and-forget: a slow
/// consumer cannot backpressure the engine.
pub type DeltaCallback = Box<dyn FnMut(&[ContentItem])>;

enum Phase {
    Idle,
    Pending { deadline: Instant },
}

pub(crate) struct DynamicObserver {
    subscription: MutationSubscription,
    staged: Vec<MutationRecord>,
    phase: Phase,
    debounce: Duration,
    predicate: Box<dyn DisclosurePredicate>,
    callback: DeltaCallback,
}

impl DynamicObserver {
    pub(crate) fn new(
        subscription: MutationSubscription,
        debounce: Duration,
        predicate: Box<dyn DisclosurePredicate>,
        callback: DeltaCallback,
    ) -> Self {
        Self {
            subscription,
            staged: Vec::new(),
            phase: Phase::Idle,
            debounce,
            predicate,
            callback,
        }
    }

    /// Drain the subscription and advance the state machine. Returns true
    /// when a settled pass ran.
    pub(crate) fn pump(
        &mut self,
        now: Instant,
        state: &mut CrawlState,
        frames: &mut FrameRegistry,
        config: &EngineConfig,
        main: &Document,
    ) -> bool {
        let qualifying: Vec<MutationRecord> = self
            .subscription
            .take_batch()
            .into_iter()
            .filter(is_qualifying)
            .collect();
        if !qualifying.is_empty() {
            self.staged.extend(qualifying);
            // Arm, or re-arm: a burst must go quiet for a full window.
            self.phase = Phase::Pending {
                deadline: now + self.debounce,
            };
            debug!(staged = self.staged.len(), "mutations staged, debounce armed");
        }

        match self.phase {
            Phase::Pending { deadline } if now >= deadline => {
                self.settle(state, frames, config, main);
                true
            }
            _ => false,
        }
    }

    fn settle(
        &mut self,
        state: &mut CrawlState,
        frames: &mut FrameRegistry,
        config: &EngineConfig,
        main: &Document,
    ) {
        let staged = std::mem::take(&mut self.staged);
        self.phase = Phase::Idle;

        let diff = classify_batch(&staged, state, self.predicate.as_ref());
        let delta = incremental_scan(&diff, state, frames, config, main);
        state.sweep();

        if !delta.is_empty() {
            debug!(items = delta.len(), "settled pass produced delta");
            (self.callback)(&delta);
        }
    }
}

/// The engine's own identifier-attribute writes do not qualify as page
/// mutations; everything else does.
fn is_qualifying(record: &MutationRecord) -> bool {
    record.attribute_name.as_deref() != Some(ID_ATTR)
}
