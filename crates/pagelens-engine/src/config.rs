//! Engine configuration.

use std::time::Duration;

/// Tunables for a crawl session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on elements visited per session. Exceeding it truncates
    /// recursion; the truncation is visible through `visited`.
    pub node_cap: usize,
    /// Debounce window: a mutation burst must stay quiet this long before
    /// a settled incremental pass runs.
    pub debounce: Duration,
    /// Extracted text is truncated to this many characters.
    pub max_text_len: usize,
    /// Dedup position grid in pixels; coordinates are rounded to the
    /// nearest multiple before keying.
    pub dedup_grid: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_cap: 2000,
            debounce: Duration::from_millis(500),
            max_text_len: 200,
            dedup_grid: 10,
        }
    }
}

impl EngineConfig {
    /// Set the per-session node budget.
    pub fn node_cap(mut self, cap: usize) -> Self {
        self.node_cap = cap;
        self
    }

    /// Set the debounce window.
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the text truncation length.
    pub fn max_text_len(mut self, len: usize) -> Self {
        self.max_text_len = len;
        self
    }

    /// Set the dedup position grid in pixels.
    pub fn dedup_grid(mut self, grid: i32) -> Self {
        self.dedup_grid = grid;
        self
    }
}
