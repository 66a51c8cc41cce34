use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::form::FormField;
use crate::AppState;

pub struct EntryFormWidget;

impl EntryFormWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let form = &state.form;
        let mut text = Vec::new();

        for field in FormField::ALL {
            let focused = form.focused() == field;
            let marker = if focused { "> " } else { "  " };
            let value = if form.is_text_field(field) {
                let cursor = if focused { "_" } else { "" };
                format!("{}{}", form.value(field), cursor)
            } else {
                format!("< {} >", form.value(field))
            };

            text.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{:<14}", field.label()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    value,
                    if focused {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                ),
            ]));
        }

        text.push(Line::from(" "));
        if let Some(error) = form.error() {
            text.push(Line::from(vec![Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )]));
        }
        text.push(Line::from(vec![Span::styled(
            "Tab next field, ←/→ change, Enter save, Esc cancel",
            Style::default().fg(Color::Gray),
        )]));

        let popup = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title("New Usage Entry")
                    .title_alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(popup, popup_area);
    }
}
