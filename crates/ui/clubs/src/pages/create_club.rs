use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::{info, warn};

use club_core::{
    forms::{self, ClubDetails, INTEREST_DETAIL_STEP, INTEREST_STEP, MAX_MEMBERS, REGION_STEP},
    store::{ClubSummary, KeyValueStore, RecentClubs},
    Ack, InterestCatalog, SubmissionError, SubmitOutcome, WizardPhase,
};

use super::{
    wizard::{WizardEvent, WizardScreen},
    Context, Page, Route,
};
use crate::{
    action::{Action, FormKind},
    components::field::TextField,
    tui::Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Name,
    Description,
    Capacity,
    Choices,
    Submit,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Name,
        Focus::Description,
        Focus::Capacity,
        Focus::Choices,
        Focus::Submit,
    ];

    fn shift(self, forward: bool) -> Self {
        let len = Self::ORDER.len();
        let at = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward { (at + 1) % len } else { (at + len - 1) % len };
        Self::ORDER[next]
    }
}

/// Club name, description and capacity typed by hand; interest, tags and
/// region picked through the wizard. Everything goes out as one POST to
/// `clubs`.
pub struct CreateClubPage {
    catalog: Arc<InterestCatalog>,
    store: Arc<dyn KeyValueStore>,
    name: TextField,
    description: TextField,
    capacity: TextField,
    focus: Focus,
    screen: WizardScreen,
    error: Option<String>,
}

impl CreateClubPage {
    pub fn new(ctx: &Context) -> Self {
        Self {
            catalog: ctx.catalog.clone(),
            store: ctx.store.clone(),
            name: TextField::new("Club name"),
            description: TextField::new("Description"),
            capacity: TextField::new("Capacity").with_value(MAX_MEMBERS.to_string()),
            focus: Focus::Name,
            screen: WizardScreen::new(forms::create_club_wizard(&ctx.catalog)),
            error: None,
        }
    }

    fn details(&self) -> ClubDetails {
        ClubDetails {
            club_name: self.name.value().to_string(),
            description: self.description.value().trim().to_string(),
            max_member: self.capacity.value().trim().parse().unwrap_or(0),
        }
    }

    fn open_choices(&mut self) {
        self.error = None;
        self.screen
            .restart(forms::create_club_wizard(&self.catalog));
    }

    fn submit(&mut self) -> Option<Action> {
        if self.screen.phase() != &WizardPhase::Completed {
            self.error = Some("Pick an interest and a region first.".into());
            return Some(Action::Render);
        }
        let details = self.details();
        if let Err(err) = details.validate() {
            self.error = Some(err.to_string());
            return Some(Action::Render);
        }
        let ticket = match self.screen.begin_submit() {
            Ok(ticket) => ticket,
            Err(err) => {
                warn!(%err, "club not submitted");
                return None;
            }
        };
        match details.attach(ticket.payload().clone(), &self.catalog) {
            Ok(payload) => {
                self.error = None;
                Some(Action::Submit {
                    form: FormKind::CreateClub,
                    ticket: ticket.id(),
                    payload,
                })
            }
            Err(err) => {
                // release the busy guard so the form stays usable
                self.screen
                    .finish_submit(ticket.id(), Err(SubmissionError::new(err.to_string())));
                self.error = Some(format!("Could not prepare the club: {err}"));
                Some(Action::Render)
            }
        }
    }

    fn remember(&self, ack: &Ack) {
        let Some(data) = ack.data.clone() else {
            return;
        };
        match serde_json::from_value::<ClubSummary>(data) {
            Ok(club) => {
                if let Err(err) = RecentClubs::new(self.store.as_ref()).record(club) {
                    warn!(%err, "could not remember the new club");
                }
            }
            Err(err) => warn!(%err, "club response is not a club summary"),
        }
    }

    fn field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            Focus::Name => Some(&mut self.name),
            Focus::Description => Some(&mut self.description),
            Focus::Capacity => Some(&mut self.capacity),
            Focus::Choices | Focus::Submit => None,
        }
    }

    fn choice_lines(&self) -> Vec<Line<'static>> {
        let payload = match self.screen.phase() {
            WizardPhase::Completed => self.screen.controller().finalize().ok(),
            _ => None,
        };
        let Some(payload) = payload else {
            return vec![Line::from("Interest and region not chosen yet").fg(Color::DarkGray)];
        };
        let interest = payload
            .items(INTEREST_STEP)
            .and_then(|i| i.first())
            .map(|id| self.catalog.title_of(id).unwrap_or(id.as_str()).to_string())
            .unwrap_or_default();
        let tags = payload
            .items(INTEREST_DETAIL_STEP)
            .map(|d| d.join(", "))
            .unwrap_or_default();
        let region = payload
            .items(REGION_STEP)
            .and_then(|r| r.first())
            .map(|id| {
                self.catalog
                    .region_items()
                    .into_iter()
                    .find(|r| &r.id == id)
                    .map(|r| r.title)
                    .unwrap_or_else(|| id.clone())
            })
            .unwrap_or_default();

        let mut lines = vec![Line::from(vec![
            Span::raw("Interest: ").fg(Color::DarkGray),
            Span::raw(interest),
        ])];
        if !tags.is_empty() {
            lines.push(Line::from(vec![Span::raw("Tags: ").fg(Color::DarkGray), Span::raw(tags)]));
        }
        lines.push(Line::from(vec![
            Span::raw("Region: ").fg(Color::DarkGray),
            Span::raw(region),
        ]));
        lines
    }
}

impl Page for CreateClubPage {
    fn route(&self) -> Route {
        Route::CreateClub
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.screen.is_open() {
            let action = match self.screen.handle_key(key) {
                WizardEvent::Nothing => None,
                WizardEvent::Truncated(warning) => Some(Action::Alert {
                    title: "Create club".into(),
                    message: warning.to_string(),
                }),
                _ => Some(Action::Render),
            };
            return Ok(action);
        }

        let action = match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.shift(true);
                Some(Action::Render)
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.shift(false);
                Some(Action::Render)
            }
            KeyCode::Esc => Some(Action::Navigate(Route::Recent)),
            KeyCode::Enter => match self.focus {
                Focus::Choices => {
                    self.open_choices();
                    Some(Action::Render)
                }
                Focus::Submit => self.submit(),
                _ => {
                    self.focus = self.focus.shift(true);
                    Some(Action::Render)
                }
            },
            _ => match self.field_mut() {
                Some(field) => {
                    field.handle_key(key);
                    Some(Action::Render)
                }
                None => None,
            },
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let action = match action {
            Action::Submitted {
                form: FormKind::CreateClub,
                ticket,
                result,
            } => match self.screen.finish_submit(ticket, result) {
                SubmitOutcome::Accepted(ack) => {
                    info!(club = self.name.value(), "club created");
                    self.remember(&ack);
                    Some(Action::Navigate(Route::Recent))
                }
                SubmitOutcome::Failed(err) => Some(Action::Alert {
                    title: "Create club".into(),
                    message: format!("The club was not created: {err}"),
                }),
                SubmitOutcome::Discarded => None,
            },
            Action::AbandonSubmission(FormKind::CreateClub) => {
                self.screen.cancel();
                self.error = Some("Submission cancelled. Choose interest and region again.".into());
                Some(Action::Render)
            }
            _ => None,
        };
        Ok(action)
    }

    fn hints(&self) -> &'static str {
        if self.screen.is_open() {
            return "";
        }
        match self.focus {
            Focus::Choices => "Enter: choose interest and region   Tab: next   Esc: leave",
            Focus::Submit => "Enter: create club   Tab: next   Esc: leave",
            _ => "Tab: next   Shift-Tab: previous   Esc: leave",
        }
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default().borders(Borders::ALL).title(" Create a club ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let [name, description, capacity, choices, submit, error] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(inner);

        let open = self.screen.is_open();
        self.name.draw(f, name, !open && self.focus == Focus::Name);
        self.description
            .draw(f, description, !open && self.focus == Focus::Description);
        self.capacity
            .draw(f, capacity, !open && self.focus == Focus::Capacity);

        let choices_style = if self.focus == Focus::Choices {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        f.render_widget(
            Paragraph::new(self.choice_lines()).block(
                Block::bordered()
                    .title("Interest & region")
                    .border_style(choices_style),
            ),
            choices,
        );

        let button = if self.focus == Focus::Submit {
            Span::styled(
                " Create club ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(" Create club ")
        };
        f.render_widget(Paragraph::new(Line::from(button).centered()), submit);

        if let Some(message) = &self.error {
            f.render_widget(
                Paragraph::new(message.as_str())
                    .fg(Color::Red)
                    .wrap(Wrap { trim: true }),
                error,
            );
        }

        self.screen.draw(f, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_core::{
        store::{MemoryStore, RECENT_CLUBS_KEY},
        Session,
    };
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use crate::config::Config;

    fn page() -> (CreateClubPage, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context {
            config: Config::default(),
            session: Session::new(),
            store: store.clone(),
            catalog: Arc::new(InterestCatalog::embedded().unwrap()),
        };
        (CreateClubPage::new(&ctx), store)
    }

    fn press(page: &mut CreateClubPage, code: KeyCode) -> Option<Action> {
        page.handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn type_text(page: &mut CreateClubPage, text: &str) {
        for c in text.chars() {
            press(page, KeyCode::Char(c));
        }
    }

    /// Fill the name, then pick the first option on every wizard step.
    fn fill(page: &mut CreateClubPage) {
        type_text(page, "Weekend Hikers");
        page.focus = Focus::Choices;
        press(page, KeyCode::Enter);
        for _ in 0..3 {
            if !page.screen.is_open() {
                break;
            }
            press(page, KeyCode::Char(' '));
            press(page, KeyCode::Enter);
        }
        assert_eq!(page.screen.phase(), &WizardPhase::Completed);
        page.focus = Focus::Submit;
    }

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(Focus::Name.shift(false), Focus::Submit);
        assert_eq!(Focus::Submit.shift(true), Focus::Name);
        assert_eq!(Focus::Capacity.shift(true), Focus::Choices);
    }

    #[test]
    fn submit_requires_wizard_choices() {
        let (mut page, _) = page();
        type_text(&mut page, "Weekend Hikers");
        page.focus = Focus::Submit;
        assert_eq!(press(&mut page, KeyCode::Enter), Some(Action::Render));
        assert!(page.error.is_some());
    }

    #[test]
    fn invalid_capacity_blocks_submission() {
        let (mut page, _) = page();
        fill(&mut page);
        page.capacity = TextField::new("Capacity").with_value("10");
        assert_eq!(press(&mut page, KeyCode::Enter), Some(Action::Render));
        assert_eq!(
            page.error.as_deref(),
            Some("Capacity must be between 25 and 300 (got 10).")
        );
    }

    #[test]
    fn payload_carries_typed_fields() {
        let (mut page, _) = page();
        fill(&mut page);
        match press(&mut page, KeyCode::Enter) {
            Some(Action::Submit { form, payload, .. }) => {
                assert_eq!(form, FormKind::CreateClub);
                assert_eq!(payload.extra("clubName"), Some(&serde_json::json!("Weekend Hikers")));
                assert_eq!(payload.extra("maxMember"), Some(&serde_json::json!(300)));
                assert!(payload.items(REGION_STEP).is_some());
            }
            other => panic!("expected a submission, got {other:?}"),
        }
    }

    #[test]
    fn accepted_club_is_remembered() {
        let (mut page, store) = page();
        fill(&mut page);
        let Some(Action::Submit { ticket, .. }) = press(&mut page, KeyCode::Enter) else {
            panic!("expected a submission");
        };
        let data = serde_json::json!({ "id": 9, "clubTitle": "Weekend Hikers" });
        let next = page
            .update(Action::Submitted {
                form: FormKind::CreateClub,
                ticket,
                result: Ok(Ack { data: Some(data) }),
            })
            .unwrap();
        assert_eq!(next, Some(Action::Navigate(Route::Recent)));
        assert!(store.get(RECENT_CLUBS_KEY).unwrap().is_some());
        let recent = RecentClubs::new(store.as_ref()).load();
        assert_eq!(recent[0].id, 9);
    }
}
