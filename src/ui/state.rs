use chrono::{DateTime, Local};

use crate::constants::PAGE_SIZE;
use crate::models::{MetricSample, SystemInfo};
use crate::monitor::MetricHistory;
use crate::tabs::{Tab, TabOutput};

use super::sanitize::sanitize;
use super::theme::Theme;

/// Shown in the content pane until the first result for a tab arrives.
pub const LOADING_TEXT: &str = "Loading...";
/// Shown when a command printed nothing.
pub const NO_OUTPUT_TEXT: &str = "(no output)";

/// A command run the app loop should start.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub tab: usize,
    pub generation: u64,
    pub argv: Vec<String>,
}

/// A finished run, tagged with the selection it was started for.
#[derive(Debug)]
pub struct RunResult {
    pub tab: usize,
    pub generation: u64,
    pub output: TabOutput,
    pub finished_at: DateTime<Local>,
}

/// Central application state - the single source of truth.
pub struct AppState {
    pub tabs: Vec<Tab>,
    pub active: usize,
    /// Bumped on every tab selection; results from older selections are stale.
    pub generation: u64,

    /// Sanitized text of the content pane.
    pub content: String,
    pub scroll: usize,
    /// Rows available to the content pane, updated on every draw.
    pub view_height: usize,

    // ── Status line (shown in the footer) ──────────────────────
    pub status: String,
    pub tick_count: u64,

    pub history: MetricHistory,
    pub system: SystemInfo,

    pub theme: Theme,
}

impl AppState {
    /// State with `tabs` (non-empty) and the first tab selected.
    ///
    /// Returns the run request for that tab, if it is enabled.
    pub fn new(tabs: Vec<Tab>, theme: Theme) -> (Self, Option<RunRequest>) {
        let mut state = Self {
            tabs,
            active: 0,
            generation: 0,
            content: String::new(),
            scroll: 0,
            view_height: 0,
            status: String::new(),
            tick_count: 0,
            history: MetricHistory::default(),
            system: SystemInfo::default(),
            theme,
        };
        let request = state.select(0);
        (state, request)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    /// Select tab `index` and reset the pane.
    ///
    /// A disabled tab shows its hint and yields no request.
    pub fn select(&mut self, index: usize) -> Option<RunRequest> {
        let tab = self.tabs.get(index)?;
        self.active = index;
        self.generation += 1;
        self.scroll = 0;
        match tab.argv() {
            Some(argv) => {
                let argv = argv.to_vec();
                self.content = LOADING_TEXT.to_string();
                self.status.clear();
                Some(RunRequest {
                    tab: index,
                    generation: self.generation,
                    argv,
                })
            }
            None => {
                self.content = tab.disabled_reason().unwrap_or_default().to_string();
                self.status = "disabled".to_string();
                None
            }
        }
    }

    pub fn next_tab(&mut self) -> Option<RunRequest> {
        if self.tabs.is_empty() {
            return None;
        }
        self.select((self.active + 1) % self.tabs.len())
    }

    pub fn prev_tab(&mut self) -> Option<RunRequest> {
        if self.tabs.is_empty() {
            return None;
        }
        let len = self.tabs.len();
        self.select((self.active + len - 1) % len)
    }

    /// Request a re-run of the active tab without resetting the pane.
    pub fn refresh_request(&self) -> Option<RunRequest> {
        let argv = self.active_tab()?.argv()?.to_vec();
        Some(RunRequest {
            tab: self.active,
            generation: self.generation,
            argv,
        })
    }

    /// Whether `result` belongs to the current selection.
    pub fn is_current(&self, tab: usize, generation: u64) -> bool {
        tab == self.active && generation == self.generation
    }

    /// Apply a finished run. Stale results are dropped; returns whether the
    /// result was applied.
    pub fn apply_result(&mut self, result: RunResult) -> bool {
        if !self.is_current(result.tab, result.generation) {
            return false;
        }
        let text = sanitize(&result.output.text);
        let text = text.trim();
        self.content = if text.is_empty() {
            NO_OUTPUT_TEXT.to_string()
        } else {
            text.to_string()
        };
        self.status = match &result.output.error {
            Some(e) => format!("error: {}", e),
            None => format!("updated {}", result.finished_at.format("%H:%M:%S")),
        };
        self.clamp_scroll();
        true
    }

    /// Record a sampling round.
    pub fn apply_metrics(&mut self, sample: &MetricSample, system: SystemInfo) {
        self.history.append(sample);
        self.system = system;
    }

    /// Cycle to the next built-in theme.
    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next_builtin();
    }

    pub fn tick_spinner(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    // ── Scrolling ────────────────────────────────────────────

    pub fn content_lines(&self) -> usize {
        self.content.lines().count()
    }

    fn max_scroll(&self) -> usize {
        self.content_lines().saturating_sub(self.view_height.max(1))
    }

    pub fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = (self.scroll + 1).min(self.max_scroll());
    }

    pub fn page_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(self.page_size());
    }

    pub fn page_down(&mut self) {
        self.scroll = (self.scroll + self.page_size()).min(self.max_scroll());
    }

    pub fn scroll_home(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_end(&mut self) {
        self.scroll = self.max_scroll();
    }

    /// A page is the visible pane, or `PAGE_SIZE` before the first draw.
    fn page_size(&self) -> usize {
        if self.view_height > 0 {
            self.view_height
        } else {
            PAGE_SIZE
        }
    }

    /// Update the pane height after a resize and keep the offset in range.
    pub fn set_view_height(&mut self, rows: usize) {
        self.view_height = rows;
        self.clamp_scroll();
    }
}
