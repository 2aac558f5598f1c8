//! Bordered, scrollable pane with the active tab's output.

use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::ansi::to_lines;
use crate::ui::state::AppState;

use super::helpers::render_scrollbar_bordered;

pub fn render_content(frame: &mut Frame, area: Rect, state: &AppState) {
    let t = &state.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(t.border_style())
        .style(t.content_style());
    let inner_height = area.height.saturating_sub(2) as usize;

    let lines: Vec<_> = to_lines(&state.content, t.content_style())
        .into_iter()
        .skip(state.scroll)
        .take(inner_height)
        .collect();

    let pane = Paragraph::new(lines).block(block);
    frame.render_widget(pane, area);

    render_scrollbar_bordered(frame, area, state.content_lines(), state.scroll);
}
