use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Stylize},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use club_core::forms::Credentials;

use super::{Page, Route};
use crate::{action::Action, components::field::TextField, tui::Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Email,
    Password,
}

pub struct LoginPage {
    email: TextField,
    password: TextField,
    focus: Focus,
    error: Option<String>,
    pending: bool,
}

impl LoginPage {
    pub fn new() -> Self {
        Self {
            email: TextField::new("Email"),
            password: TextField::new("Password").masked(),
            focus: Focus::Email,
            error: None,
            pending: false,
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.value().trim().to_string(),
            password: self.password.value().to_string(),
        }
    }

    fn sign_in(&mut self) -> Option<Action> {
        if self.pending {
            return None;
        }
        let credentials = self.credentials();
        if let Err(err) = credentials.validate() {
            self.error = Some(err.to_string());
            return Some(Action::Render);
        }
        self.error = None;
        self.pending = true;
        Some(Action::SignIn(credentials))
    }
}

impl Default for LoginPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for LoginPage {
    fn route(&self) -> Route {
        Route::Login
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Focus::Email => Focus::Password,
                    Focus::Password => Focus::Email,
                };
                Some(Action::Render)
            }
            KeyCode::Enter if self.focus == Focus::Email => {
                self.focus = Focus::Password;
                Some(Action::Render)
            }
            KeyCode::Enter => self.sign_in(),
            KeyCode::Esc => Some(Action::Quit),
            _ => {
                match self.focus {
                    Focus::Email => self.email.handle_key(key),
                    Focus::Password => self.password.handle_key(key),
                }
                Some(Action::Render)
            }
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Action::SignInFailed(reason) = action {
            self.pending = false;
            self.password.clear();
            self.error = Some(reason);
            return Ok(Some(Action::Render));
        }
        Ok(None)
    }

    fn hints(&self) -> &'static str {
        "Tab: switch field   Enter: sign in   Esc: quit"
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default().borders(Borders::ALL).title(" Sign in ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let [column] = Layout::horizontal([Constraint::Length(45)])
            .flex(Flex::Center)
            .areas(inner);
        let [email, password, status] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .flex(Flex::Center)
        .areas(column);

        self.email.draw(f, email, self.focus == Focus::Email);
        self.password
            .draw(f, password, self.focus == Focus::Password);

        let status_line = match (&self.error, self.pending) {
            (Some(error), _) => Line::from(error.clone()).fg(Color::Red),
            (None, true) => Line::from("Signing in...").fg(Color::DarkGray),
            (None, false) => Line::default(),
        };
        f.render_widget(Paragraph::new(status_line), status);
        Ok(())
    }
}
