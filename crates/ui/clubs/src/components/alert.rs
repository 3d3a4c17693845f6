use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::{
    action::Action,
    components::Component,
    tui::{EventResponse, Frame},
};

use super::popup::{centered_rect_fixed, draw_popup_frame};

/// Modal alert with a title and a message.
/// Enter / Esc emit `Action::ClosePopup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPopup {
    title: String,
    message: String,
    min_width: u16,
    min_height: u16,
}

impl AlertPopup {
    pub fn new<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            min_width: 60,
            min_height: 7,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Component for AlertPopup {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let action = match key.code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::ClosePopup),
            _ => None,
        };
        Ok(action.map(EventResponse::Stop))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if area.width < 5 || area.height < 5 {
            return Ok(());
        }

        let extra = self.message.lines().count().saturating_sub(1) as u16;
        let dialog = centered_rect_fixed(area, self.min_width, self.min_height + extra);
        let inner = draw_popup_frame(f, dialog, &self.title);

        let mut lines: Vec<Line> = self
            .message
            .lines()
            .map(|l| Line::from(Span::raw(l.to_string())))
            .collect();

        if inner.height >= 3 {
            lines.push(Line::raw(""));
        }
        lines.push(
            Line::from(vec![
                Span::styled("Enter", Style::default().fg(Color::White)),
                Span::raw(": OK"),
            ])
            .fg(Color::DarkGray),
        );

        let para = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        f.render_widget(para, inner);
        Ok(())
    }
}
