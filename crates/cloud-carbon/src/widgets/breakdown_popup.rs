use cloud_carbon_monitor::{format_currency, format_mass, EmissionsTotals};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::AppState;

/// Emissions split by provider, service category or organization.
pub struct BreakdownPopupWidget;

impl BreakdownPopupWidget {
    pub fn render_providers(frame: &mut Frame, area: Rect, state: &AppState) {
        let rows = state
            .tracker
            .provider_breakdown()
            .into_iter()
            .map(|(provider, totals)| (provider.name().to_string(), totals))
            .collect();
        Self::render(frame, area, state, "Emissions by Provider", "p", rows);
    }

    pub fn render_categories(frame: &mut Frame, area: Rect, state: &AppState) {
        let rows = state
            .tracker
            .category_breakdown()
            .into_iter()
            .map(|(category, totals)| (category.name().to_string(), totals))
            .collect();
        Self::render(frame, area, state, "Emissions by Service", "c", rows);
    }

    pub fn render_organizations(frame: &mut Frame, area: Rect, state: &AppState) {
        let rows = state.tracker.organization_breakdown().into_iter().collect();
        Self::render(frame, area, state, "Emissions by Organization", "o", rows);
    }

    fn render(
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        title: &str,
        key: &str,
        rows: Vec<(String, EmissionsTotals)>,
    ) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let text = Self::breakdown_text(state, rows, key);
        let popup = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(title.to_string())
                    .title_alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(popup, popup_area);
    }

    fn breakdown_text(
        state: &AppState,
        mut rows: Vec<(String, EmissionsTotals)>,
        key: &str,
    ) -> Vec<Line<'static>> {
        let total_tons = state.tracker.total_emissions_tons();
        rows.sort_by(|a, b| {
            b.1.co2e_tons()
                .total_cmp(&a.1.co2e_tons())
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut text = Vec::new();
        if rows.is_empty() {
            text.push(Line::from(vec![Span::styled(
                "No usage entries recorded",
                Style::default().fg(Color::Red),
            )]));
        }

        for (name, totals) in rows {
            let share = totals.share_of(total_tons);
            text.push(Line::from(vec![Span::styled(
                name,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )]));
            text.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{:.1}%", share),
                    Style::default().fg(if share > 50.0 {
                        Color::Red
                    } else {
                        Color::Yellow
                    }),
                ),
                Span::styled(
                    format!(
                        "  {}  {}  ({} entries)",
                        format_mass(totals.co2e_tons(), state.unit()),
                        format_currency(totals.spend(), state.currency()),
                        totals.entries()
                    ),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }

        text.extend(vec![
            Line::from(" "),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    key.to_string(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to close", Style::default().fg(Color::Gray)),
            ]),
        ]);

        text
    }
}
