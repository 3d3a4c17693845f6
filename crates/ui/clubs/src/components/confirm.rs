use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::{
    action::{Action, PopupResult},
    components::Component,
    tui::{EventResponse, Frame},
};

use super::popup::{centered_rect_fixed, draw_popup_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Ok,
    Cancel,
}

/// Yes/no question.
///
/// - Left/Right or Tab: switch button
/// - Enter: emit `PopupResult` for the selected button
/// - Esc: emit `PopupResult::Cancelled`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPopup {
    title: String,
    question: String,
    selected: Choice,
}

impl ConfirmPopup {
    pub fn new<T: Into<String>, Q: Into<String>>(title: T, question: Q) -> Self {
        Self {
            title: title.into(),
            question: question.into(),
            selected: Choice::Cancel,
        }
    }

    fn confirm_action(&self) -> Action {
        match self.selected {
            Choice::Ok => Action::PopupResult(PopupResult::Confirmed),
            Choice::Cancel => Action::PopupResult(PopupResult::Cancelled),
        }
    }

    fn toggle_selection(&mut self) {
        self.selected = match self.selected {
            Choice::Ok => Choice::Cancel,
            Choice::Cancel => Choice::Ok,
        };
    }
}

impl Component for ConfirmPopup {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let action = match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.toggle_selection();
                Some(Action::Render)
            }
            KeyCode::Char('y') => Some(Action::PopupResult(PopupResult::Confirmed)),
            KeyCode::Char('n') | KeyCode::Esc => Some(Action::PopupResult(PopupResult::Cancelled)),
            KeyCode::Enter => Some(self.confirm_action()),
            _ => None,
        };
        Ok(action.map(EventResponse::Stop))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        if area.width < 5 || area.height < 5 {
            return Ok(());
        }
        let dialog = centered_rect_fixed(area, 50, 8);
        let inner = draw_popup_frame(f, dialog, &self.title);
        let [question, buttons] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

        f.render_widget(
            Paragraph::new(self.question.as_str()).wrap(Wrap { trim: true }),
            question,
        );

        let button = |label: &'static str, active: bool| {
            if active {
                Span::styled(
                    format!(" {label} "),
                    Style::default().fg(Color::Black).bg(Color::White).bold(),
                )
            } else {
                Span::raw(format!(" {label} "))
            }
        };
        let line = Line::from(vec![
            button("OK", self.selected == Choice::Ok),
            Span::raw("   "),
            button("Cancel", self.selected == Choice::Cancel),
        ])
        .centered();
        f.render_widget(Paragraph::new(line), buttons);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(popup: &mut ConfirmPopup, code: KeyCode) -> Option<Action> {
        popup
            .handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
            .map(|r| match r {
                EventResponse::Stop(a) | EventResponse::Continue(a) => a,
            })
    }

    #[test]
    fn defaults_to_cancel() {
        let mut popup = ConfirmPopup::new("Delete", "Really delete?");
        assert_eq!(
            press(&mut popup, KeyCode::Enter),
            Some(Action::PopupResult(PopupResult::Cancelled))
        );
    }

    #[test]
    fn switching_then_enter_confirms() {
        let mut popup = ConfirmPopup::new("Delete", "Really delete?");
        press(&mut popup, KeyCode::Left);
        assert_eq!(
            press(&mut popup, KeyCode::Enter),
            Some(Action::PopupResult(PopupResult::Confirmed))
        );
    }
}
