//! Renderer module: split into focused submodules.
//!
//! - `header`: Tab bar, metrics summary, system info lines, content title
//! - `content`: Scrollable command output pane
//! - `status_bar`: Footer with spinner, status line and keybinds
//! - `helpers`: Shared rendering utilities

mod content;
mod header;
pub mod helpers;
mod status_bar;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use super::state::AppState;
use crate::constants::FIXED_ROWS;

/// Rows left for the content pane's inner area in a terminal `height` rows
/// tall.
pub fn content_rows(height: u16) -> usize {
    height.saturating_sub(FIXED_ROWS) as usize
}

/// Top-level render function.
pub fn render(frame: &mut Frame, state: &AppState) {
    let size = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Metrics summary
            Constraint::Length(1), // Snapshot
            Constraint::Length(1), // Disk
            Constraint::Length(1), // Net
            Constraint::Length(1), // Content title
            Constraint::Min(2),    // Content pane (bordered)
            Constraint::Length(1), // Footer
        ])
        .split(size);

    header::render_tab_bar(frame, rows[0], state);
    header::render_summary(frame, rows[1], state);
    let info: [(&str, Rect); 3] = [
        (&state.system.snapshot, rows[2]),
        (&state.system.disk, rows[3]),
        (&state.system.net, rows[4]),
    ];
    for (text, area) in info {
        header::render_info_line(frame, area, state, text);
    }
    header::render_content_title(frame, rows[5], state);
    content::render_content(frame, rows[6], state);
    status_bar::render_status_bar(frame, rows[7], state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricSample, SystemInfo};
    use crate::tabs::{Tab, TabStatus};
    use crate::ui::theme::Theme;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn tab(title: &str) -> Tab {
        Tab {
            title: title.to_string(),
            refresh: Duration::from_secs(5),
            status: TabStatus::Enabled {
                argv: vec![title.to_string()],
            },
        }
    }

    fn draw(state: &AppState, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn content_rows_subtract_fixed_rows() {
        assert_eq!(content_rows(40), 31);
        assert_eq!(content_rows(5), 0);
    }

    #[test]
    fn full_frame() {
        let (mut state, _) = AppState::new(vec![tab("uptime"), tab("vmstat")], Theme::ocean());
        state.apply_metrics(
            &MetricSample {
                cpu_pct: Some(50.0),
                ..Default::default()
            },
            SystemInfo {
                snapshot: "Snapshot: CPU 50%".to_string(),
                disk: "Disk: / 50G used 20G (42%)".to_string(),
                net: String::new(),
            },
        );

        let rows = draw(&state, 80, 14);
        assert!(rows[0].contains("uptime") && rows[0].contains("vmstat"));
        assert!(rows[1].contains("CPU = 50%"));
        assert!(rows[2].contains("Snapshot: CPU 50%"));
        assert!(rows[3].contains("Disk: / 50G"));
        assert_eq!(rows[4].trim(), "");
        assert!(rows[5].contains("uptime"));
        assert!(rows[7].contains("Loading..."));
        assert!(rows[13].contains("q:quit"));
    }

    #[test]
    fn narrow_frame_shows_overflow_marker() {
        let tabs = (0..10).map(|i| tab(&format!("tab-{}", i))).collect();
        let (state, _) = AppState::new(tabs, Theme::ocean());
        let rows = draw(&state, 30, 12);
        assert!(rows[0].contains("tab-0"));
        assert!(rows[0].contains('…'));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let (state, _) = AppState::new(vec![tab("uptime")], Theme::day());
        draw(&state, 1, 1);
        draw(&state, 10, 3);
    }
}
