use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Gauge},
    Frame,
};

use crate::AppState;

pub struct ProgressBarsWidget;

impl ProgressBarsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let target_percentage = state.target_percentage();
        let target_gauge = Gauge::default()
            .block(Block::bordered().title(format!(
                "GHG Target ({} kg CO₂e)",
                state.config.ghg_target_kg
            )))
            .gauge_style(if target_percentage > 80.0 {
                Style::default().fg(Color::Red)
            } else if target_percentage > 60.0 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            })
            .percent(target_percentage.clamp(0.0, 100.0) as u16)
            .label(format!("{:.1}%", target_percentage));

        frame.render_widget(target_gauge, chunks[0]);

        let real_share = state.tracker.real_data_share();
        let source_gauge = Gauge::default()
            .block(Block::bordered().title("Spend with AWS data"))
            .gauge_style(Style::default().fg(Color::Blue))
            .percent(real_share.clamp(0.0, 100.0) as u16)
            .label(format!("{:.0}%", real_share));

        frame.render_widget(source_gauge, chunks[1]);
    }
}
