use cloud_carbon_monitor::format_number;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::AppState;

/// What the running total is equivalent to.
pub struct ComparisonsWidget;

impl ComparisonsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let text = if state.tracker.is_empty() {
            vec![
                Line::from(vec![Span::styled(
                    "No usage entries recorded",
                    Style::default().fg(Color::Red),
                )]),
                Line::from(" "),
                Line::from(vec![
                    Span::styled("Press ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        "n",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(" to add one", Style::default().fg(Color::Gray)),
                ]),
            ]
        } else {
            let comparisons = state.tracker.comparisons();
            vec![
                Self::line("Domestic flights", format_number(comparisons.domestic_flights())),
                Self::line(
                    "International flights",
                    format!("{:.1}", comparisons.international_flights()),
                ),
                Self::line(
                    "Smartphone years",
                    format!("{:.1}", comparisons.smartphone_years()),
                ),
                Self::line("Phone charges", format_number(comparisons.phone_charges())),
                Self::line("Miles driven", format_number(comparisons.miles_driven())),
                Self::line(
                    "Gallons of gasoline",
                    format!("{:.1}", comparisons.gasoline_gallons()),
                ),
            ]
        };

        let comparisons = Paragraph::new(text)
            .block(Block::bordered().title("Equivalent To"))
            .alignment(Alignment::Left);

        frame.render_widget(comparisons, area);
    }

    fn line(label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{}: ", label), Style::default().fg(Color::White)),
            Span::styled(
                value,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    }
}
