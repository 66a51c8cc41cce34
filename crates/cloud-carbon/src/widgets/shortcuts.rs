use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::AppState;

const SHORTCUTS: [(&str, &str); 7] = [
    ("q", "quit"),
    ("r", "refresh"),
    ("u", "unit"),
    ("n", "new entry"),
    ("p", "providers"),
    ("c", "categories"),
    ("o", "organizations"),
];

pub struct ShortcutsWidget;

impl ShortcutsWidget {
    pub fn render(frame: &mut Frame, area: Rect, _state: &AppState) {
        let key_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(Color::Gray);

        let mut spans = vec![Span::styled("Press ", text_style)];
        for (i, (key, action)) in SHORTCUTS.iter().enumerate() {
            let separator = if i + 1 < SHORTCUTS.len() { ", " } else { "" };
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::styled(format!(" {}{}", action, separator), text_style));
        }

        let shortcuts = Paragraph::new(vec![Line::from(spans)]).alignment(Alignment::Center);

        frame.render_widget(shortcuts, area);
    }
}
