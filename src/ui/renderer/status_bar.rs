//! Footer at the bottom of the screen.

use ratatui::{layout::Rect, widgets::Paragraph, Frame};

use crate::ui::state::AppState;
use crate::utils::spinner_char;

use super::helpers::padded;

const KEY_HELP: &str = "q:quit  tab/shift+tab:next/prev  up/down/pgup/pgdn:scroll  t:theme";

/// `<spinner>  <status>  |  <help>`, dropping the status part when empty.
pub fn footer_text(spinner: &str, status: &str) -> String {
    if status.is_empty() {
        format!("{}  {}", spinner, KEY_HELP)
    } else {
        format!("{}  {}  |  {}", spinner, status, KEY_HELP)
    }
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let t = &state.theme;
    let text = footer_text(spinner_char(state.tick_count), &state.status);
    let footer = Paragraph::new(padded(&text)).style(t.footer_style());
    frame.render_widget(footer, area);
}
