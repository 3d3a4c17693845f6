use crossterm::event::{Event as CrosstermEvent, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::border,
    widgets::{Block, Paragraph},
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::tui::Frame;

/// Single-line labelled input box.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    label: &'static str,
    input: Input,
    masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    /// Draw `•` instead of the characters.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input = Input::new(value.into());
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.input.handle_event(&CrosstermEvent::Key(key));
    }

    pub fn draw(&self, f: &mut Frame<'_>, area: Rect, focused: bool) {
        // 2 for the borders, 1 for the cursor
        let width = area.width.max(3) - 3;
        let scroll = self.input.visual_scroll(width as usize);

        let (title_style, border_style) = if focused {
            (
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Cyan),
            )
        } else {
            (Style::default().fg(Color::Gray), Style::default().fg(Color::DarkGray))
        };

        let text = if self.masked {
            self.input.value().chars().map(|_| '•').collect()
        } else {
            self.input.value().to_string()
        };
        let paragraph = Paragraph::new(text).scroll((0, scroll as u16)).block(
            Block::bordered()
                .title(self.label)
                .title_style(title_style)
                .border_set(border::ROUNDED)
                .border_style(border_style),
        );
        f.render_widget(paragraph, area);

        if focused {
            let x = self.input.visual_cursor().max(scroll) - scroll + 1;
            f.set_cursor_position((area.x + x as u16, area.y + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn typing_and_backspace_edit_the_value() {
        let mut field = TextField::new("Name");
        for c in "hikers".chars() {
            field.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        field.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(field.value(), "hiker");
        field.clear();
        assert_eq!(field.value(), "");
    }
}
