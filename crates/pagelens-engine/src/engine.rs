//! Consumer facade: full analysis plus dynamic observation.

use std::cell::{Cell, RefCell};
use std::time::Instant;

use tracing::debug;

use pagelens_dom::Document;

use crate::analyzer::{run_full_analysis, AnalysisResult};
use crate::config::EngineConfig;
use crate::diff::{DisclosurePredicate, MarkerDisclosure};
use crate::frames::FrameRegistry;
use crate::item::ContentItem;
use crate::observer::DynamicObserver;
use crate::state::CrawlState;

/// One extraction session over one live document.
///
/// All state is in-memory and per document; a full `analyze` discards the
/// prior session state wholesale. The engine is single-threaded: share it
/// via `Rc` when a delta callback needs to call back into it.
pub struct Engine {
    config: EngineConfig,
    document: Document,
    state: RefCell<CrawlState>,
    frames: RefCell<FrameRegistry>,
    observer: RefCell<Option<DynamicObserver>>,
    stop_requested: Cell<bool>,
}

impl Engine {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EngineConfig::default())
    }

    pub fn with_config(document: Document, config: EngineConfig) -> Self {
        Self {
            state: RefCell::new(CrawlState::new(config.node_cap)),
            frames: RefCell::new(FrameRegistry::new()),
            observer: RefCell::new(None),
            stop_requested: Cell::new(false),
            config,
            document,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Synchronous full pass. Fresh crawl state, cleared frame offsets;
    /// never fails. A truncated crawl is visible through `visited`.
    pub fn analyze(&self) -> AnalysisResult {
        let mut state = CrawlState::new(self.config.node_cap);
        let mut frames = FrameRegistry::new();
        let result = run_full_analysis(&self.document, &self.config, &mut state, &mut frames);
        *self.state.borrow_mut() = state;
        *self.frames.borrow_mut() = frames;
        result
    }

    /// Begin observing mutations with the default disclosure heuristic.
    /// Replaces any observation already in progress.
    pub fn start_observing(&self, on_delta: impl FnMut(&[ContentItem]) + 'static) {
        self.start_observing_with(Box::new(MarkerDisclosure::default()), on_delta);
    }

    /// Begin observing with a custom disclosure predicate.
    pub fn start_observing_with(
        &self,
        predicate: Box<dyn DisclosurePredicate>,
        on_delta: impl FnMut(&[ContentItem]) + 'static,
    ) {
        self.stop_requested.set(false);
        let subscription = self.document.observe();
        *self.observer.borrow_mut() = Some(DynamicObserver::new(
            subscription,
            self.config.debounce,
            predicate,
            Box::new(on_delta),
        ));
        debug!("dynamic observation started");
    }

    /// Disconnect observation and clear any pending debounce. Idempotent,
    /// and safe to call from inside the delta callback: a re-entrant stop
    /// is deferred until the dispatch unwinds.
    pub fn stop_observing(&self) {
        self.stop_requested.set(true);
        if let Ok(mut slot) = self.observer.try_borrow_mut() {
            *slot = None;
            self.stop_requested.set(false);
        }
    }

    pub fn is_observing(&self) -> bool {
        self.observer.borrow().is_some()
    }

    /// Drive the debounce state machine. The host's timer loop calls this
    /// with the current time; tests pass synthetic instants.
    pub fn pump(&self, now: Instant) {
        {
            let mut slot = self.observer.borrow_mut();
            if let Some(observer) = slot.as_mut() {
                let mut state = self.state.borrow_mut();
                let mut frames = self.frames.borrow_mut();
                observer.pump(now, &mut state, &mut frames, &self.config, &self.document);
            }
        }
        if self.stop_requested.get() {
            *self.observer.borrow_mut() = None;
            self.stop_requested.set(false);
        }
    }
}
