use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Stylize},
    text::{Line, Text},
    widgets::Paragraph,
};

use crate::{
    action::{Action, FormKind},
    components::Component,
    tui::{EventResponse, Frame},
};

use super::popup::{centered_rect_fixed, draw_popup_frame};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Blocking overlay shown while a submission is in flight. Swallows every
/// key except Esc, which abandons the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyOverlay {
    form: FormKind,
    frame: usize,
}

impl BusyOverlay {
    pub fn new(form: FormKind) -> Self {
        Self { form, frame: 0 }
    }

    pub fn form(&self) -> FormKind {
        self.form
    }
}

impl Component for BusyOverlay {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        let action = match key.code {
            KeyCode::Esc => Action::AbandonSubmission(self.form),
            _ => Action::Render,
        };
        Ok(Some(EventResponse::Stop(action)))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if action == Action::Tick {
            self.frame = (self.frame + 1) % SPINNER.len();
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let dialog = centered_rect_fixed(area, 36, 5);
        let inner = draw_popup_frame(f, dialog, "Sending");
        let text = Text::from(vec![
            Line::from(format!("{} please wait", SPINNER[self.frame])).centered(),
            Line::from("Esc: cancel").fg(Color::DarkGray).centered(),
        ]);
        f.render_widget(Paragraph::new(text), inner);
        Ok(())
    }
}
