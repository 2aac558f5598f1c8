//! Header rows: tab bar, metrics summary, system info lines, content title.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::constants::OVERFLOW_MARKER;
use crate::ui::sparkline::summary_line;
use crate::ui::state::AppState;
use crate::ui::tabbar::{cell_label, layout_titles, TabCell};

use super::helpers::padded;

pub fn render_tab_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let t = &state.theme;
    let titles: Vec<&str> = state.tabs.iter().map(|tab| tab.title.as_str()).collect();

    let spans: Vec<Span> = layout_titles(&titles, state.active, area.width as usize)
        .map(|layout| layout.cells())
        .unwrap_or_default()
        .into_iter()
        .map(|cell| match cell {
            TabCell::Overflow => Span::styled(padded(OVERFLOW_MARKER), t.overflow_style()),
            TabCell::Tab(i) => {
                let tab = &state.tabs[i];
                let style = if i == state.active {
                    t.tab_active_style()
                } else if tab.is_enabled() {
                    t.tab_inactive_style()
                } else {
                    t.tab_disabled_style()
                };
                Span::styled(padded(&cell_label(&tab.title)), style)
            }
        })
        .collect();

    let bar = Paragraph::new(Line::from(spans)).style(t.header_style());
    frame.render_widget(bar, area);
}

pub fn render_summary(frame: &mut Frame, area: Rect, state: &AppState) {
    let t = &state.theme;
    let summary = Paragraph::new(padded(&summary_line(&state.history))).style(t.summary_style());
    frame.render_widget(summary, area);
}

/// One system info row. Blank text keeps the row.
pub fn render_info_line(frame: &mut Frame, area: Rect, state: &AppState, text: &str) {
    let t = &state.theme;
    let line = Paragraph::new(padded(text.trim_end())).style(t.info_style());
    frame.render_widget(line, area);
}

pub fn render_content_title(frame: &mut Frame, area: Rect, state: &AppState) {
    let t = &state.theme;
    let title = state
        .active_tab()
        .map(|tab| cell_label(&tab.title))
        .unwrap_or_default();
    let line = Paragraph::new(padded(&title)).style(t.summary_style());
    frame.render_widget(line, area);
}
