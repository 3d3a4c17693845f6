//! Key handling and drawing shared by the wizard-driven pages.

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use tracing::{debug, error};

use club_core::{
    controller::SubmissionTicket, Ack, Confirmation, ConstraintError, SubmissionError,
    SubmitOutcome, WizardController, WizardError, WizardPhase,
};

use crate::{
    components::{
        popup::{centered_rect_fixed, draw_popup_frame, render_backdrop},
        selection::{StepFrame, StepInput, StepView},
    },
    tui::Frame,
};

/// What a key press did to the wizard, from the page's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    Nothing,
    Changed,
    /// The last step was confirmed.
    Completed,
    /// Confirmation was refused; the notice says why.
    Blocked(ConstraintError),
    /// A toggle went over the step's maximum and was undone.
    Truncated(ConstraintError),
    Cancelled,
}

pub struct WizardScreen {
    wizard: WizardController,
    view: StepView,
    notice: Option<ConstraintError>,
}

impl WizardScreen {
    pub fn new(wizard: WizardController) -> Self {
        Self {
            wizard,
            view: StepView::new(),
            notice: None,
        }
    }

    pub fn controller(&self) -> &WizardController {
        &self.wizard
    }

    /// Throw the current run away and start `wizard` instead.
    pub fn restart(&mut self, wizard: WizardController) {
        self.wizard = wizard;
        self.view.reset();
        self.notice = None;
        self.start();
    }

    pub fn start(&mut self) {
        if let Err(err) = self.wizard.start() {
            report(&err);
        }
    }

    pub fn is_open(&self) -> bool {
        self.wizard.modal().is_shown()
    }

    pub fn phase(&self) -> &WizardPhase {
        self.wizard.phase()
    }

    pub fn cancel(&mut self) {
        self.wizard.cancel();
        self.notice = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> WizardEvent {
        let offered = self.wizard.offered();
        let Some(input) = self.view.handle_key(key, offered.len()) else {
            return WizardEvent::Nothing;
        };

        let result = match input {
            StepInput::Moved => Ok(WizardEvent::Changed),
            StepInput::Toggle(index) => match offered.get(index) {
                Some(item) => self.wizard.toggle(&item.id).map(|warning| match warning {
                    Some(w) => {
                        self.notice = Some(w.clone());
                        WizardEvent::Truncated(w)
                    }
                    None => {
                        self.notice = None;
                        WizardEvent::Changed
                    }
                }),
                None => Ok(WizardEvent::Nothing),
            },
            StepInput::Confirm => self.wizard.confirm().map(|confirmation| match confirmation {
                Confirmation::Advanced(step) => {
                    debug!(%step, "next step");
                    self.view.reset();
                    self.notice = None;
                    WizardEvent::Changed
                }
                Confirmation::Completed => {
                    self.notice = None;
                    WizardEvent::Completed
                }
                Confirmation::Blocked(problem) => {
                    self.notice = Some(problem.clone());
                    WizardEvent::Blocked(problem)
                }
            }),
            StepInput::Back if self.wizard.can_go_back() => self.wizard.go_back().map(|()| {
                self.view.reset();
                self.notice = None;
                WizardEvent::Changed
            }),
            StepInput::Back | StepInput::Cancel => {
                self.cancel();
                Ok(WizardEvent::Cancelled)
            }
        };

        result.unwrap_or_else(|err| {
            report(&err);
            WizardEvent::Nothing
        })
    }

    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, WizardError> {
        self.wizard.begin_submit()
    }

    pub fn finish_submit(
        &mut self,
        ticket: u64,
        result: Result<Ack, SubmissionError>,
    ) -> SubmitOutcome {
        self.wizard.finish_submit(ticket, result)
    }

    /// Draw the active step as a modal over `area`. Does nothing when no
    /// step is shown.
    pub fn draw(&mut self, f: &mut Frame<'_>, area: Rect) {
        let Some(step) = self.wizard.active_step() else {
            return;
        };
        let offered = self.wizard.offered();
        let seed = self.wizard.active_seed();
        let position = (
            self.wizard
                .state()
                .collected
                .len()
                .saturating_add(1),
            self.wizard
                .steps()
                .iter()
                .filter(|s| s.is_applicable(&self.wizard.state().collected) || s.id == step.id)
                .count(),
        );

        render_backdrop(f, area);
        let dialog = centered_rect_fixed(area, 64, area.height.saturating_sub(4).max(12));
        let inner = draw_popup_frame(f, dialog, step.title.clone());
        self.view.draw(
            f,
            inner,
            StepFrame {
                step,
                offered: &offered,
                draft: self.wizard.draft(),
                seed: seed.as_ref(),
                notice: self.notice.as_ref(),
                position,
            },
        );
    }
}

/// Wiring mistakes are bugs: loud in debug builds, logged in release.
fn report(err: &WizardError) {
    match err {
        WizardError::Busy => debug!("ignoring input while a submission is in flight"),
        other => {
            error!(%other, "wizard rejected an operation");
            debug_assert!(false, "wizard rejected an operation: {other}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_core::{forms, InterestCatalog};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(max: usize) -> WizardScreen {
        let catalog = InterestCatalog::embedded().unwrap();
        let mut screen = WizardScreen::new(forms::favorites_wizard(&catalog, max));
        screen.start();
        screen
    }

    #[test]
    fn toggling_past_max_reports_truncation() {
        let mut screen = screen(1);
        assert_eq!(screen.handle_key(key(KeyCode::Char(' '))), WizardEvent::Changed);
        screen.handle_key(key(KeyCode::Down));
        assert!(matches!(
            screen.handle_key(key(KeyCode::Char(' '))),
            WizardEvent::Truncated(ConstraintError::TooManySelected { max: 1, .. })
        ));
        assert_eq!(screen.controller().draft().len(), 1);
    }

    #[test]
    fn enter_without_selection_is_blocked() {
        let mut screen = screen(7);
        assert!(matches!(
            screen.handle_key(key(KeyCode::Enter)),
            WizardEvent::Blocked(ConstraintError::TooFewSelected { .. })
        ));
        assert!(screen.is_open());
    }

    #[test]
    fn back_on_first_step_cancels() {
        let mut screen = screen(7);
        assert_eq!(screen.handle_key(key(KeyCode::Backspace)), WizardEvent::Cancelled);
        assert_eq!(screen.phase(), &WizardPhase::Cancelled);
        assert!(!screen.is_open());
    }

    #[test]
    fn pick_and_confirm_completes() {
        let mut screen = screen(7);
        screen.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(screen.handle_key(key(KeyCode::Enter)), WizardEvent::Completed);
        assert!(screen.begin_submit().is_ok());
    }
}
