//! Full-document analysis pass.

use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use pagelens_dom::Document;

use crate::config::EngineConfig;
use crate::dedup::dedup_visible;
use crate::frames::FrameRegistry;
use crate::item::{ContentItem, PageStats};
use crate::state::CrawlState;
use crate::walker::{WalkContext, Walker};

/// Result of one full pass: deduplicated items in visual order, plus
/// enough accounting to detect a truncated crawl.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub items: Vec<ContentItem>,
    /// Elements visited; equal to the node cap when the crawl truncated.
    pub visited: usize,
    pub elapsed_ms: u64,
    pub stats: PageStats,
}

impl AnalysisResult {
    /// Indexed, visually ordered, one-line-per-item listing of the
    /// visible items, for the command matcher and the UI panel.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for (index, item) in self.items.iter().filter(|i| !i.rect.hidden).enumerate() {
            let _ = writeln!(
                out,
                "[{}] <{}> {:?} ({},{}) {}",
                index,
                item.tag,
                item.kind.primary_text(),
                item.rect.left,
                item.rect.top,
                item.kind.type_name(),
            );
        }
        out
    }
}

/// Walk the whole document into `state`, then dedup and sort visually.
/// Never fails; incompleteness is visible through `visited`.
pub(crate) fn run_full_analysis(
    document: &Document,
    config: &EngineConfig,
    state: &mut CrawlState,
    frames: &mut FrameRegistry,
) -> AnalysisResult {
    let started = Instant::now();
    frames.clear();

    {
        let mut walker = Walker {
            state: &mut *state,
            frames: &mut *frames,
            config,
            main: document,
        };
        walker.walk(&document.body(), WalkContext::default());
    }

    let mut items = state.items().to_vec();
    items.sort_by_key(|item| (item.rect.top, item.rect.left));
    let items = dedup_visible(items, config.dedup_grid);

    let stats = PageStats::tally(&items);
    info!(
        total = stats.total,
        visible = stats.visible,
        hidden = stats.hidden,
        visited = state.visited(),
        "full analysis complete"
    );

    AnalysisResult {
        items,
        visited: state.visited(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        stats,
    }
}
