//! Application struct and event loop.
//!
//! Owns the terminal, the state and the sampler context.
//! Blocking work runs on tokio tasks; results come back over channels that
//! are drained once per loop iteration, so only the loop mutates state.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::*;
use crate::models::{MetricSample, SystemInfo};
use crate::monitor::{Sampler, SystemHost};
use crate::tabs::{default_specs, run_tab_command, validate_all, Platform};
use crate::ui::{self, AppState, RunRequest, RunResult, Theme};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    CycleTheme,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Map a key press to an action. Releases and unbound keys map to `None`.
pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,

        // Tab navigation
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Action::NextTab,
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => Action::PrevTab,

        KeyCode::Char('t') => Action::CycleTheme,

        // Scrolling
        KeyCode::Up | KeyCode::Char('k') => Action::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') => Action::ScrollDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        _ => return None,
    };
    Some(action)
}

/// A finished sampling round. The sampler travels with it so the loop
/// stays the only owner between rounds.
struct MetricsReport {
    sampler: Sampler,
    sample: MetricSample,
    system: SystemInfo,
}

/// Main application struct.
///
/// Owns the state and the sampler context along with the result channels.
pub struct App {
    state: AppState,

    /// `None` while a sampling round is in flight.
    sampler: Option<Sampler>,
    metrics_interval: Duration,
    last_metrics: Option<Instant>,

    /// Selection the latest tab run was started for.
    run_in_flight: Option<(usize, u64)>,
    /// Task of the latest tab run; aborting it kills the child.
    run_task: Option<AbortHandle>,
    last_run: Option<Instant>,
    pending_run: Option<RunRequest>,

    last_spinner: Instant,

    // Channels
    run_tx: mpsc::UnboundedSender<RunResult>,
    run_rx: mpsc::UnboundedReceiver<RunResult>,
    metrics_tx: mpsc::UnboundedSender<MetricsReport>,
    metrics_rx: mpsc::UnboundedReceiver<MetricsReport>,
}

impl App {
    /// Create a new App: validate tabs, resolve the theme, open channels.
    pub fn new(config: &Config) -> Self {
        let host = SystemHost;
        let specs = if config.tabs.is_empty() {
            default_specs(Platform::current(), &host)
        } else {
            config.tabs.clone()
        };
        let tabs = validate_all(specs, &host, config.global_refresh);
        let enabled = tabs.iter().filter(|t| t.is_enabled()).count();
        info!(tabs = tabs.len(), enabled, source = ?config.source, "tabs validated");

        let theme = Theme::resolve(&config.theme);
        let (state, pending_run) = AppState::new(tabs, theme);

        let (run_tx, run_rx) = mpsc::unbounded_channel::<RunResult>();
        let (metrics_tx, metrics_rx) = mpsc::unbounded_channel::<MetricsReport>();

        Self {
            state,
            sampler: Some(Sampler::new()),
            metrics_interval: config.global_refresh,
            last_metrics: None,
            run_in_flight: None,
            run_task: None,
            last_run: None,
            pending_run,
            last_spinner: Instant::now(),
            run_tx,
            run_rx,
            metrics_tx,
            metrics_rx,
        }
    }

    /// Run the main event loop. Returns when the user quits.
    pub async fn run(&mut self) -> Result<()> {
        // Terminal init
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        // Cleanup, even when the loop failed
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        if let Some(request) = self.pending_run.take() {
            self.dispatch_run(request);
        }

        loop {
            let size = terminal.size()?;
            self.state.set_view_height(ui::content_rows(size.height));
            terminal.draw(|frame| ui::render(frame, &self.state))?;

            self.drain_run_results();
            self.drain_metrics();

            if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
                if let Event::Key(key) = event::read()? {
                    if let Some(action) = action_for(key) {
                        if self.handle_action(action) {
                            info!("quit requested");
                            return Ok(());
                        }
                    }
                }
            }

            self.tick_spinner();
            self.tick_metrics();
            self.tick_tab_refresh();
        }
    }

    // ── Input ────────────────────────────────────────────────────

    /// Apply `action`; returns `true` when the app should quit.
    fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextTab => {
                let request = self.state.next_tab();
                self.on_selection(request);
            }
            Action::PrevTab => {
                let request = self.state.prev_tab();
                self.on_selection(request);
            }
            Action::CycleTheme => {
                self.state.cycle_theme();
                debug!(theme = %self.state.theme.name, "theme changed");
            }
            Action::ScrollUp => self.state.scroll_up(),
            Action::ScrollDown => self.state.scroll_down(),
            Action::PageUp => self.state.page_up(),
            Action::PageDown => self.state.page_down(),
            Action::Home => self.state.scroll_home(),
            Action::End => self.state.scroll_end(),
        }
        false
    }

    fn on_selection(&mut self, request: Option<RunRequest>) {
        match request {
            Some(request) => self.dispatch_run(request),
            None => {
                self.cancel_run();
                self.last_run = None;
            }
        }
    }

    /// Abort the latest tab run, if it is still going.
    fn cancel_run(&mut self) {
        if let Some(task) = self.run_task.take() {
            task.abort();
        }
        self.run_in_flight = None;
    }

    // ── Dispatch ─────────────────────────────────────────────────

    fn dispatch_run(&mut self, request: RunRequest) {
        self.cancel_run();
        self.run_in_flight = Some((request.tab, request.generation));
        self.last_run = Some(Instant::now());
        debug!(tab = request.tab, argv = ?request.argv, "running tab command");

        let tx = self.run_tx.clone();
        let task = tokio::spawn(async move {
            let output = run_tab_command(
                &request.argv,
                Duration::from_millis(TAB_COMMAND_TIMEOUT_MS),
            )
            .await;
            let _ = tx.send(RunResult {
                tab: request.tab,
                generation: request.generation,
                output,
                finished_at: Local::now(),
            });
        });
        self.run_task = Some(task.abort_handle());
    }

    fn dispatch_metrics(&mut self) {
        let Some(mut sampler) = self.sampler.take() else {
            return;
        };
        self.last_metrics = Some(Instant::now());

        let tx = self.metrics_tx.clone();
        tokio::spawn(async move {
            let report = tokio::task::spawn_blocking(move || {
                let (sample, system) = sampler.sample_with_system(&SystemHost);
                MetricsReport {
                    sampler,
                    sample,
                    system,
                }
            })
            .await;
            let report = report.unwrap_or_else(|e| {
                warn!(error = %e, "sampling task failed, resetting sampler");
                MetricsReport {
                    sampler: Sampler::new(),
                    sample: MetricSample::default(),
                    system: SystemInfo::default(),
                }
            });
            let _ = tx.send(report);
        });
    }

    // ── Channel draining ─────────────────────────────────────────

    fn drain_run_results(&mut self) {
        while let Ok(result) = self.run_rx.try_recv() {
            if self.run_in_flight == Some((result.tab, result.generation)) {
                self.run_in_flight = None;
                self.run_task = None;
            }
            if !self.state.apply_result(result) {
                debug!("discarded result for an inactive tab");
            }
        }
    }

    fn drain_metrics(&mut self) {
        while let Ok(report) = self.metrics_rx.try_recv() {
            if report.sample.is_empty() {
                debug!("no metrics available this round");
            }
            self.state.apply_metrics(&report.sample, report.system);
            self.sampler = Some(report.sampler);
        }
    }

    // ── Timers ───────────────────────────────────────────────────

    fn tick_spinner(&mut self) {
        if self.last_spinner.elapsed() >= Duration::from_millis(SPINNER_INTERVAL_MS) {
            self.state.tick_spinner();
            self.last_spinner = Instant::now();
        }
    }

    fn tick_metrics(&mut self) {
        let due = self
            .last_metrics
            .map_or(true, |at| at.elapsed() >= self.metrics_interval);
        if due {
            self.dispatch_metrics();
        }
    }

    fn tick_tab_refresh(&mut self) {
        let Some(tab) = self.state.active_tab() else {
            return;
        };
        let due = self.last_run.map_or(true, |at| at.elapsed() >= tab.refresh);
        let busy = self.run_in_flight == Some((self.state.active, self.state.generation));
        if !due || busy {
            return;
        }
        if let Some(request) = self.state.refresh_request() {
            self.dispatch_run(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn quit_keys() {
        for code in [KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc] {
            assert_eq!(action_for(key(code)), Some(Action::Quit));
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for(ctrl_c), Some(Action::Quit));
        assert_eq!(action_for(key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn tab_keys() {
        for code in [KeyCode::Right, KeyCode::Char('l'), KeyCode::Tab] {
            assert_eq!(action_for(key(code)), Some(Action::NextTab));
        }
        for code in [KeyCode::Left, KeyCode::Char('h'), KeyCode::BackTab] {
            assert_eq!(action_for(key(code)), Some(Action::PrevTab));
        }
        let shift_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(action_for(shift_tab), Some(Action::PrevTab));
    }

    #[test]
    fn scroll_and_theme_keys() {
        assert_eq!(action_for(key(KeyCode::Char('t'))), Some(Action::CycleTheme));
        assert_eq!(action_for(key(KeyCode::Up)), Some(Action::ScrollUp));
        assert_eq!(action_for(key(KeyCode::Char('k'))), Some(Action::ScrollUp));
        assert_eq!(action_for(key(KeyCode::Down)), Some(Action::ScrollDown));
        assert_eq!(action_for(key(KeyCode::Char('j'))), Some(Action::ScrollDown));
        assert_eq!(action_for(key(KeyCode::PageUp)), Some(Action::PageUp));
        assert_eq!(action_for(key(KeyCode::PageDown)), Some(Action::PageDown));
        assert_eq!(action_for(key(KeyCode::Home)), Some(Action::Home));
        assert_eq!(action_for(key(KeyCode::End)), Some(Action::End));
    }

    #[test]
    fn unbound_and_released_keys() {
        assert_eq!(action_for(key(KeyCode::Char('x'))), None);
        assert_eq!(action_for(key(KeyCode::F(1))), None);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(action_for(release), None);
    }

    #[test]
    fn new_app_uses_configured_tabs() {
        let mut config = Config::default();
        config.tabs = vec![crate::tabs::TabSpec::new("hello", &["echo", "hi"])];
        let app = App::new(&config);
        assert_eq!(app.state.tabs.len(), 1);
        assert!(app.state.tabs[0].is_enabled());
        assert_eq!(
            app.pending_run.as_ref().map(|r| r.argv.clone()),
            Some(vec!["echo".to_string(), "hi".to_string()])
        );
    }

    #[test]
    fn disabled_selection_clears_refresh() {
        let mut config = Config::default();
        config.tabs = vec![
            crate::tabs::TabSpec::new("hello", &["echo", "hi"]),
            crate::tabs::TabSpec::new("gone", &["perfmon-missing-tool"]),
        ];
        let mut app = App::new(&config);
        app.last_run = Some(Instant::now());
        assert!(!app.handle_action(Action::NextTab));
        assert_eq!(app.state.status, "disabled");
        assert!(app.last_run.is_none() && app.run_in_flight.is_none());
        assert!(app.handle_action(Action::Quit));
    }

    #[cfg(unix)]
    #[test]
    fn reselection_aborts_previous_run() {
        let mut config = Config::default();
        config.tabs = vec![
            crate::tabs::TabSpec::new("slow", &["sleep", "5"]),
            crate::tabs::TabSpec::new("slower", &["sleep", "6"]),
        ];
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let mut app = App::new(&config);
            let request = app.pending_run.take().unwrap();
            app.dispatch_run(request);
            let first = app.run_task.clone().unwrap();

            app.handle_action(Action::NextTab);
            let second = app.run_task.clone().unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;

            assert!(first.is_finished());
            assert!(!second.is_finished());
            assert!(app.run_rx.try_recv().is_err());
            assert_eq!(app.run_in_flight, Some((1, app.state.generation)));

            app.cancel_run();
            assert!(app.run_task.is_none() && app.run_in_flight.is_none());
        });
    }
}
