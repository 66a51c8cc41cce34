//! TUI widget modules

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub mod breakdown_popup;
pub mod comparisons;
pub mod entries;
pub mod entry_form;
pub mod header;
pub mod progress_bars;
pub mod shortcuts;
pub mod statistics;

pub use breakdown_popup::*;
pub use comparisons::*;
pub use entries::*;
pub use entry_form::*;
pub use header::*;
pub use progress_bars::*;
pub use shortcuts::*;
pub use statistics::*;

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
