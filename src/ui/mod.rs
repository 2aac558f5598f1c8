mod ansi;
mod renderer;
pub mod sanitize;
pub mod sparkline;
mod state;
pub mod tabbar;
pub mod theme;

pub use renderer::{content_rows, render};
pub use state::{AppState, RunRequest, RunResult};
pub use theme::Theme;
