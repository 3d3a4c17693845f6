use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Stylize},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tracing::{info, warn};

use club_core::{
    forms::{self, FAVORITES_STEP},
    ConstraintError, InterestCatalog, StepId, SubmitOutcome, WizardPhase,
};

use super::{
    wizard::{WizardEvent, WizardScreen},
    Context, Page, Route,
};
use crate::{
    action::{Action, FormKind},
    tui::Frame,
};

/// Pick up to `favorites_max` interests and send them to `users/favorites`.
pub struct FavoritesPage {
    catalog: Arc<InterestCatalog>,
    max: usize,
    screen: WizardScreen,
}

impl FavoritesPage {
    pub fn new(ctx: &Context) -> Self {
        let max = ctx.config.favorites_max;
        Self {
            screen: WizardScreen::new(forms::favorites_wizard(&ctx.catalog, max)),
            catalog: ctx.catalog.clone(),
            max,
        }
    }

    fn restart(&mut self) {
        self.screen
            .restart(forms::favorites_wizard(&self.catalog, self.max));
    }

    fn submit(&mut self) -> Option<Action> {
        match self.screen.begin_submit() {
            Ok(ticket) => Some(Action::Submit {
                form: FormKind::Favorites,
                ticket: ticket.id(),
                payload: ticket.payload().clone(),
            }),
            Err(err) => {
                warn!(%err, "favorites not submitted");
                None
            }
        }
    }

    fn picked_titles(&self) -> Vec<String> {
        self.screen
            .controller()
            .state()
            .collected
            .get(&StepId::from(FAVORITES_STEP))
            .map(|r| {
                r.items
                    .iter()
                    .map(|id| self.catalog.title_of(id).unwrap_or(id.as_str()).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Page for FavoritesPage {
    fn route(&self) -> Route {
        Route::Favorites
    }

    fn on_enter(&mut self) -> Result<Option<Action>> {
        self.screen.start();
        Ok(Some(Action::Render))
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.screen.is_open() {
            let action = match self.screen.handle_key(key) {
                WizardEvent::Nothing => None,
                WizardEvent::Blocked(ConstraintError::TooFewSelected { .. }) => Some(Action::Alert {
                    title: "Favorites".into(),
                    message: "Please pick at least one interest.".into(),
                }),
                WizardEvent::Changed | WizardEvent::Blocked(_) | WizardEvent::Cancelled => {
                    Some(Action::Render)
                }
                WizardEvent::Truncated(_) => Some(Action::Alert {
                    title: "Favorites".into(),
                    message: format!("You can pick at most {} interests.", self.max),
                }),
                WizardEvent::Completed => self.submit(),
            };
            return Ok(action);
        }

        let phase = self.screen.phase().clone();
        let action = match (phase, key.code) {
            (WizardPhase::Completed, KeyCode::Enter) => self.submit(),
            (WizardPhase::Completed, KeyCode::Backspace) => {
                self.screen.handle_key(key);
                Some(Action::Render)
            }
            (_, KeyCode::Enter) => {
                self.restart();
                Some(Action::Render)
            }
            (_, KeyCode::Esc) => Some(Action::Navigate(Route::Recent)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let action = match action {
            Action::Submitted {
                form: FormKind::Favorites,
                ticket,
                result,
            } => match self.screen.finish_submit(ticket, result) {
                SubmitOutcome::Accepted(_) => {
                    info!("favorites saved");
                    Some(Action::Navigate(Route::Recent))
                }
                SubmitOutcome::Failed(err) => Some(Action::Alert {
                    title: "Favorites".into(),
                    message: format!("Could not save your interests ({}).\nClose this and press Enter to try again.", err.cause),
                }),
                SubmitOutcome::Discarded => None,
            },
            Action::AbandonSubmission(FormKind::Favorites) => {
                self.screen.cancel();
                Some(Action::Render)
            }
            _ => None,
        };
        Ok(action)
    }

    fn hints(&self) -> &'static str {
        match self.screen.phase() {
            WizardPhase::Completed => "Enter: send   Backspace: edit   Esc: leave",
            WizardPhase::StepActive(_) => "",
            _ => "Enter: start over   Esc: leave",
        }
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let lines = match self.screen.phase() {
            WizardPhase::Completed => {
                let mut lines = vec![Line::from("Ready to save these interests:").bold()];
                lines.extend(self.picked_titles().into_iter().map(|t| Line::from(format!("  - {t}"))));
                lines
            }
            WizardPhase::Cancelled => vec![Line::from("Nothing was saved.").fg(Color::DarkGray)],
            _ => vec![Line::from("Tell us what you like.").fg(Color::DarkGray)],
        };
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Favorites ")),
            area,
        );
        self.screen.draw(f, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_core::{store::MemoryStore, Ack, Session, SubmissionError};
    use crossterm::event::KeyModifiers;

    use crate::config::Config;

    fn ctx() -> Context {
        Context {
            config: Config::default(),
            session: Session::new(),
            store: Arc::new(MemoryStore::new()),
            catalog: Arc::new(InterestCatalog::embedded().unwrap()),
        }
    }

    fn press(page: &mut FavoritesPage, code: KeyCode) -> Option<Action> {
        page.handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn submitted(page: &mut FavoritesPage) -> u64 {
        page.on_enter().unwrap();
        press(page, KeyCode::Char(' '));
        match press(page, KeyCode::Enter) {
            Some(Action::Submit { form, ticket, payload }) => {
                assert_eq!(form, FormKind::Favorites);
                assert_eq!(payload.items(FAVORITES_STEP).map(<[_]>::len), Some(1));
                ticket
            }
            other => panic!("expected a submission, got {other:?}"),
        }
    }

    #[test]
    fn confirming_without_picks_is_blocked() {
        let mut page = FavoritesPage::new(&ctx());
        page.on_enter().unwrap();
        assert_eq!(
            press(&mut page, KeyCode::Enter),
            Some(Action::Alert {
                title: "Favorites".into(),
                message: "Please pick at least one interest.".into(),
            })
        );
        assert!(matches!(page.screen.phase(), WizardPhase::StepActive(_)));
    }

    #[test]
    fn accepted_submission_goes_to_recent() {
        let mut page = FavoritesPage::new(&ctx());
        let ticket = submitted(&mut page);
        let next = page
            .update(Action::Submitted {
                form: FormKind::Favorites,
                ticket,
                result: Ok(Ack::default()),
            })
            .unwrap();
        assert_eq!(next, Some(Action::Navigate(Route::Recent)));
    }

    #[test]
    fn failed_submission_can_be_retried() {
        let mut page = FavoritesPage::new(&ctx());
        let ticket = submitted(&mut page);
        let next = page
            .update(Action::Submitted {
                form: FormKind::Favorites,
                ticket,
                result: Err(SubmissionError::not_ok()),
            })
            .unwrap();
        assert!(matches!(next, Some(Action::Alert { .. })));
        assert!(matches!(press(&mut page, KeyCode::Enter), Some(Action::Submit { .. })));
    }

    #[test]
    fn abandoned_submission_result_is_ignored() {
        let mut page = FavoritesPage::new(&ctx());
        let ticket = submitted(&mut page);
        page.update(Action::AbandonSubmission(FormKind::Favorites))
            .unwrap();
        let next = page
            .update(Action::Submitted {
                form: FormKind::Favorites,
                ticket,
                result: Ok(Ack::default()),
            })
            .unwrap();
        assert_eq!(next, None);
        assert_eq!(page.screen.phase(), &WizardPhase::Cancelled);
    }
}
