use cloud_carbon_monitor::{format_currency, format_emissions};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Row, Table},
    Frame,
};

use crate::AppState;

pub struct EntriesWidget;

impl EntriesWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        // Borders and the header row take three lines
        let limit = area.height.saturating_sub(3) as usize;

        let rows: Vec<Row> = state
            .tracker
            .recent_entries(limit)
            .map(|tracked| {
                let entry = tracked.entry();
                let emissions_color = if tracked.result().is_real_data() {
                    Color::Green
                } else {
                    Color::Yellow
                };
                Row::new(vec![
                    entry.timestamp().format("%Y-%m-%d %H:%M").to_string(),
                    entry.organization().to_string(),
                    entry.provider().short_name().to_string(),
                    entry.service_category().name().to_string(),
                    format_currency(entry.monthly_spend(), state.currency()),
                    format_emissions(tracked.result(), state.unit()),
                ])
                .style(Style::default().fg(emissions_color))
            })
            .collect();

        let header = Row::new(vec![
            "Recorded",
            "Organization",
            "Provider",
            "Service",
            "Spend",
            "Emissions",
        ])
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let table = Table::new(
            rows,
            [
                Constraint::Length(16),
                Constraint::Percentage(20),
                Constraint::Length(8),
                Constraint::Percentage(15),
                Constraint::Percentage(15),
                Constraint::Min(20),
            ],
        )
        .header(header)
        .block(
            Block::bordered().title(format!("Recent Entries ({})", state.tracker.entry_count())),
        );

        frame.render_widget(table, area);
    }
}
