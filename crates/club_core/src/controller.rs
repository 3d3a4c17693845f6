//! Wizard controller: the only owner of `WizardState`.
//!
//! Phases:
//!   Idle -> StepActive(first) -> StepActive(next) ... -> Completed
//!   any phase -> Cancelled
//!
//! The controller shows the active step through its `ModalStack`, keeps an
//! interim draft for the active step, and guards every transition while a
//! submission is in flight.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::aggregate::{self, SubmissionPayload};
use crate::catalog::InterestWithDetails;
use crate::error::{ConstraintError, SubmissionError, WizardError};
use crate::flow::{DeclaredOrder, StepFlow};
use crate::gateway::{Ack, SubmissionGateway};
use crate::modal::ModalStack;
use crate::session::AuthToken;
use crate::step::{CatalogItem, Collected, ItemId, SelectionResult, SelectionStep, StepId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Idle,
    StepActive(StepId),
    Completed,
    Cancelled,
}

impl WizardPhase {
    pub fn label(&self) -> &'static str {
        match self {
            WizardPhase::Idle => "idle",
            WizardPhase::StepActive(_) => "on a step",
            WizardPhase::Completed => "completed",
            WizardPhase::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardState {
    pub active_step: Option<StepId>,
    pub collected: Collected,
    pub step_order: Vec<StepId>,
}

/// What happened when the active step's draft was confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Advanced(StepId),
    Completed,
    /// The draft does not satisfy the step; nothing changed.
    Blocked(ConstraintError),
}

pub type TicketId = u64;

/// Tickets are unique per process, so a result arriving for an abandoned
/// wizard can never match a newer one.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// A finalized payload handed out for one submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    id: TicketId,
    payload: SubmissionPayload,
}

impl SubmissionTicket {
    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted(Ack),
    /// State preserved; the same payload may be submitted again.
    Failed(SubmissionError),
    /// The wizard was cancelled (or the ticket is stale); result ignored.
    Discarded,
}

pub struct WizardController {
    steps: Vec<SelectionStep>,
    flow: Box<dyn StepFlow>,
    phase: WizardPhase,
    state: WizardState,
    history: Vec<StepId>,
    draft: Vec<ItemId>,
    modal: ModalStack<StepId>,
    in_flight: Option<TicketId>,
}

impl WizardController {
    pub fn new(steps: Vec<SelectionStep>) -> Self {
        let step_order = steps.iter().map(|s| s.id.clone()).collect();
        Self {
            steps,
            flow: Box::new(DeclaredOrder),
            phase: WizardPhase::Idle,
            state: WizardState {
                step_order,
                ..WizardState::default()
            },
            history: Vec::new(),
            draft: Vec::new(),
            modal: ModalStack::new(),
            in_flight: None,
        }
    }

    pub fn with_flow(mut self, flow: impl StepFlow + 'static) -> Self {
        self.flow = Box::new(flow);
        self
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn steps(&self) -> &[SelectionStep] {
        &self.steps
    }

    pub fn step(&self, id: &StepId) -> Option<&SelectionStep> {
        self.steps.iter().find(|s| &s.id == id)
    }

    pub fn active_step(&self) -> Option<&SelectionStep> {
        match &self.phase {
            WizardPhase::StepActive(id) => self.step(id),
            _ => None,
        }
    }

    /// Options the active step offers right now.
    pub fn offered(&self) -> Vec<CatalogItem> {
        self.active_step()
            .map(|s| s.offered(&self.state.collected).into_owned())
            .unwrap_or_default()
    }

    /// Interest pre-seeded into the active step, if it is a detail step.
    pub fn active_seed(&self) -> Option<InterestWithDetails> {
        self.active_step()
            .and_then(|s| s.seed(&self.state.collected))
    }

    pub fn draft(&self) -> &[ItemId] {
        &self.draft
    }

    pub fn modal(&self) -> &ModalStack<StepId> {
        &self.modal
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether `go_back` would find a previous step.
    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
            && matches!(
                self.phase,
                WizardPhase::StepActive(_) | WizardPhase::Completed
            )
    }

    pub fn start(&mut self) -> Result<(), WizardError> {
        if self.phase != WizardPhase::Idle {
            return Err(self.invalid("start"));
        }
        if self.steps.is_empty() {
            return Err(WizardError::EmptyWizard);
        }
        let first = self
            .flow
            .next_step(&self.steps, &self.state.collected)
            .ok_or(WizardError::EmptyWizard)?;
        info!(step = %first, steps = self.steps.len(), "wizard started");
        self.enter(first)
    }

    /// Toggle one item in the active draft. Returns the truncation warning
    /// when the toggle pushed the draft over the step's maximum.
    pub fn toggle(&mut self, item: &str) -> Result<Option<ConstraintError>, WizardError> {
        self.guard("toggle")?;
        let mut next = self.draft.clone();
        if let Some(pos) = next.iter().position(|i| i == item) {
            next.remove(pos);
        } else {
            next.push(item.to_string());
        }
        self.set_draft(next)
    }

    /// Replace the active draft, clamped to the step's catalog and maximum.
    pub fn set_draft(&mut self, items: Vec<ItemId>) -> Result<Option<ConstraintError>, WizardError> {
        let step = self.guard("edit")?;
        let (items, warning) = step.clamp(&items, &self.state.collected);
        self.draft = items;
        Ok(warning)
    }

    /// Evaluate the draft against the active step and advance on success.
    /// Step-local constraint problems come back as `Confirmation::Blocked`.
    pub fn confirm(&mut self) -> Result<Confirmation, WizardError> {
        let step = self.guard("confirm")?;
        match step.evaluate(&self.draft, &self.state.collected) {
            Ok(evaluation) => {
                if let Some(warning) = &evaluation.warning {
                    debug!(step = %step.id, %warning, "confirmed truncated selection");
                }
                self.advance(evaluation.result)?;
                Ok(match &self.phase {
                    WizardPhase::StepActive(next) => Confirmation::Advanced(next.clone()),
                    _ => Confirmation::Completed,
                })
            }
            Err(problem) => {
                debug!(step = %step.id, %problem, "step cannot complete yet");
                Ok(Confirmation::Blocked(problem))
            }
        }
    }

    /// Store `result` for the active step and move on.
    pub fn advance(&mut self, result: SelectionResult) -> Result<&WizardPhase, WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }
        let active = match &self.phase {
            WizardPhase::StepActive(id) => id.clone(),
            _ => return Err(self.invalid("advance")),
        };
        if result.step != active {
            return Err(WizardError::StepMismatch {
                expected: active,
                got: result.step,
            });
        }

        let count = result.items.len();
        let replaced = self.state.collected.insert(active.clone(), result);
        let next = self.flow.next_step(&self.steps, &self.state.collected);
        if let Some(unknown) = next.as_ref().filter(|id| self.step(id).is_none()) {
            match replaced {
                Some(previous) => self.state.collected.insert(active.clone(), previous),
                None => self.state.collected.remove(&active),
            };
            return Err(WizardError::UnknownStep(unknown.clone()));
        }
        debug!(step = %active, items = count, "step confirmed");
        self.history.push(active);

        match next {
            Some(next) => self.enter(next)?,
            None => {
                self.phase = WizardPhase::Completed;
                self.state.active_step = None;
                self.draft.clear();
                self.modal.dismiss();
                info!(
                    collected = self.state.collected.len(),
                    "wizard completed"
                );
            }
        }
        Ok(&self.phase)
    }

    /// Return to the previous step. The step being left loses its draft and
    /// entry; earlier confirmed entries stay.
    pub fn go_back(&mut self) -> Result<(), WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }
        match self.phase.clone() {
            WizardPhase::StepActive(current) => {
                let previous = self.history.pop().ok_or(WizardError::InvalidTransition {
                    operation: "go back",
                    phase: "on its first step",
                })?;
                self.state.collected.remove(&current);
                self.draft.clear();
                debug!(from = %current, to = %previous, "stepping back");
                self.enter(previous)
            }
            WizardPhase::Completed => {
                let previous = self.history.pop().ok_or(self.invalid("go back"))?;
                debug!(to = %previous, "reopening last step");
                self.enter(previous)
            }
            WizardPhase::Idle | WizardPhase::Cancelled => Err(self.invalid("go back")),
        }
    }

    /// Dismiss the wizard and drop everything collected. An in-flight
    /// submission keeps running; its result will be discarded.
    pub fn cancel(&mut self) {
        if self.phase == WizardPhase::Cancelled {
            return;
        }
        if let Some(ticket) = self.in_flight.take() {
            info!(ticket, "wizard cancelled during submission, result will be discarded");
        } else {
            info!(phase = self.phase.label(), "wizard cancelled");
        }
        self.phase = WizardPhase::Cancelled;
        self.clear();
    }

    /// Validate and build the payload without changing anything.
    pub fn finalize(&self) -> Result<SubmissionPayload, WizardError> {
        Ok(aggregate::finalize(&self.state, &self.steps)?)
    }

    /// Hand the payload to a local callback instead of the network.
    /// The wizard state is dropped afterwards.
    pub fn complete_with<R>(
        &mut self,
        on_complete: impl FnOnce(SubmissionPayload) -> R,
    ) -> Result<R, WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }
        if self.phase != WizardPhase::Completed {
            return Err(self.invalid("complete"));
        }
        let payload = self.finalize()?;
        self.clear();
        Ok(on_complete(payload))
    }

    /// Finalize and mark a submission as in flight.
    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }
        if self.phase != WizardPhase::Completed {
            return Err(self.invalid("submit"));
        }
        let payload = self.finalize()?;
        let id = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some(id);
        info!(ticket = id, "submission started");
        Ok(SubmissionTicket { id, payload })
    }

    /// Apply the result of a submission started with `begin_submit`.
    pub fn finish_submit(
        &mut self,
        ticket: TicketId,
        result: Result<Ack, SubmissionError>,
    ) -> SubmitOutcome {
        if self.phase == WizardPhase::Cancelled || self.in_flight != Some(ticket) {
            debug!(ticket, "discarding submission result");
            return SubmitOutcome::Discarded;
        }
        self.in_flight = None;
        match result {
            Ok(ack) => {
                info!(ticket, "submission accepted");
                self.clear();
                SubmitOutcome::Accepted(ack)
            }
            Err(err) => {
                warn!(ticket, %err, "submission failed, state kept for retry");
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Run one submission round trip to completion.
    pub async fn submit<G>(
        &mut self,
        gateway: &G,
        token: &AuthToken,
    ) -> Result<SubmitOutcome, WizardError>
    where
        G: SubmissionGateway + ?Sized,
    {
        let ticket = self.begin_submit()?;
        let result = gateway.submit(ticket.payload(), token).await;
        Ok(self.finish_submit(ticket.id(), result))
    }

    fn enter(&mut self, id: StepId) -> Result<(), WizardError> {
        if self.step(&id).is_none() {
            return Err(WizardError::UnknownStep(id));
        }
        self.draft = self
            .state
            .collected
            .get(&id)
            .map(|r| r.items.clone())
            .unwrap_or_default();
        self.state.active_step = Some(id.clone());
        self.modal.show(id.clone());
        self.phase = WizardPhase::StepActive(id);
        Ok(())
    }

    /// Common checks for draft operations; returns the active step.
    fn guard(&self, operation: &'static str) -> Result<&SelectionStep, WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }
        self.active_step().ok_or(self.invalid(operation))
    }

    fn invalid(&self, operation: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            operation,
            phase: self.phase.label(),
        }
    }

    fn clear(&mut self) {
        self.state.collected.clear();
        self.state.active_step = None;
        self.history.clear();
        self.draft.clear();
        self.modal.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{SelectionConstraint, StepKind, StepOptions};
    use pretty_assertions::assert_eq;

    fn items(ids: &[&str]) -> Vec<ItemId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn fixed(ids: &[&str]) -> StepOptions {
        StepOptions::Fixed(ids.iter().map(|i| CatalogItem::new(*i, *i)).collect())
    }

    fn three_steps() -> WizardController {
        WizardController::new(vec![
            SelectionStep::new("one", StepKind::Interest, "One", fixed(&["a", "b"])),
            SelectionStep::new("two", StepKind::Interest, "Two", fixed(&["c", "d"]))
                .constraint(SelectionConstraint::up_to(2)),
            SelectionStep::new("three", StepKind::Region, "Three", fixed(&["e"])),
        ])
    }

    #[test]
    fn empty_wizard_cannot_start() {
        let mut wizard = WizardController::new(Vec::new());
        assert_eq!(wizard.start(), Err(WizardError::EmptyWizard));
    }

    #[test]
    fn n_advances_complete_the_wizard() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        for (step, pick) in [("one", "a"), ("two", "c"), ("three", "e")] {
            wizard
                .advance(SelectionResult::new(step, items(&[pick])))
                .unwrap();
        }
        assert_eq!(wizard.phase(), &WizardPhase::Completed);
        assert!(!wizard.modal().is_shown());
    }

    #[test]
    fn advance_outside_a_step_is_invalid() {
        let mut wizard = three_steps();
        let err = wizard
            .advance(SelectionResult::new("one", items(&["a"])))
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidTransition { .. }));

        wizard.cancel();
        let err = wizard
            .advance(SelectionResult::new("one", items(&["a"])))
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidTransition { .. }));
    }

    #[test]
    fn advance_for_another_step_is_rejected() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        let err = wizard
            .advance(SelectionResult::new("two", items(&["c"])))
            .unwrap_err();
        assert!(matches!(err, WizardError::StepMismatch { .. }));
        assert!(wizard.state().collected.is_empty());
    }

    #[test]
    fn advance_into_an_unknown_step_changes_nothing() {
        let mut wizard = three_steps().with_flow(|_: &[SelectionStep], collected: &Collected| {
            (!collected.is_empty()).then(|| StepId::from("ghost"))
        });
        wizard.start().unwrap();
        let err = wizard
            .advance(SelectionResult::new("one", items(&["a"])))
            .unwrap_err();
        assert_eq!(err, WizardError::UnknownStep("ghost".into()));
        assert_eq!(wizard.phase(), &WizardPhase::StepActive("one".into()));
        assert!(wizard.state().collected.is_empty());
        assert!(!wizard.can_go_back());
    }

    #[test]
    fn go_back_keeps_confirmed_entries() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        wizard
            .advance(SelectionResult::new("one", items(&["b"])))
            .unwrap();
        wizard.toggle("c").unwrap();

        wizard.go_back().unwrap();
        assert_eq!(wizard.phase(), &WizardPhase::StepActive("one".into()));
        assert_eq!(
            wizard.state().collected.get(&StepId::from("one")).unwrap().items,
            items(&["b"])
        );
        assert_eq!(wizard.draft(), items(&["b"]).as_slice());
        assert!(!wizard.can_go_back());
    }

    #[test]
    fn go_back_on_first_step_is_invalid() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        assert!(matches!(
            wizard.go_back(),
            Err(WizardError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn confirm_reports_blocked_steps_as_data() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        let outcome = wizard.confirm().unwrap();
        assert!(matches!(
            outcome,
            Confirmation::Blocked(ConstraintError::TooFewSelected { .. })
        ));
        assert_eq!(wizard.phase(), &WizardPhase::StepActive("one".into()));
    }

    #[test]
    fn toggle_over_max_keeps_earlier_picks() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        assert_eq!(wizard.toggle("a").unwrap(), None);
        let warning = wizard.toggle("b").unwrap();
        assert_eq!(
            warning,
            Some(ConstraintError::TooManySelected {
                max: 1,
                selected: 2
            })
        );
        assert_eq!(wizard.draft(), items(&["a"]).as_slice());

        wizard.toggle("a").unwrap();
        assert!(wizard.draft().is_empty());
    }

    #[test]
    fn cancel_drops_everything() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        wizard.toggle("a").unwrap();
        wizard.confirm().unwrap();
        wizard.cancel();
        assert_eq!(wizard.phase(), &WizardPhase::Cancelled);
        assert!(wizard.state().collected.is_empty());
        assert!(!wizard.modal().is_shown());
        wizard.cancel();
    }

    #[test]
    fn busy_wizard_refuses_transitions() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        for pick in ["a", "c", "e"] {
            wizard.toggle(pick).unwrap();
            wizard.confirm().unwrap();
        }
        let ticket = wizard.begin_submit().unwrap();
        assert!(wizard.is_busy());
        assert_eq!(wizard.go_back(), Err(WizardError::Busy));
        assert_eq!(
            wizard
                .advance(SelectionResult::new("three", items(&["e"])))
                .unwrap_err(),
            WizardError::Busy
        );
        assert_eq!(wizard.begin_submit().unwrap_err(), WizardError::Busy);

        let outcome = wizard.finish_submit(ticket.id(), Err(SubmissionError::not_ok()));
        assert_eq!(outcome, SubmitOutcome::Failed(SubmissionError::not_ok()));
        assert!(!wizard.is_busy());
        assert_eq!(wizard.state().collected.len(), 3);
    }

    #[test]
    fn result_after_cancel_is_discarded() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        for pick in ["a", "c", "e"] {
            wizard.toggle(pick).unwrap();
            wizard.confirm().unwrap();
        }
        let ticket = wizard.begin_submit().unwrap();
        wizard.cancel();
        let outcome = wizard.finish_submit(ticket.id(), Ok(Ack::default()));
        assert_eq!(outcome, SubmitOutcome::Discarded);
        assert_eq!(wizard.phase(), &WizardPhase::Cancelled);
    }

    #[test]
    fn ticket_of_an_abandoned_wizard_never_matches_a_new_one() {
        let run = || {
            let mut wizard = three_steps();
            wizard.start().unwrap();
            for pick in ["a", "c", "e"] {
                wizard.toggle(pick).unwrap();
                wizard.confirm().unwrap();
            }
            wizard
        };
        let mut old = run();
        let stale = old.begin_submit().unwrap();
        old.cancel();

        let mut fresh = run();
        let current = fresh.begin_submit().unwrap();
        assert_ne!(stale.id(), current.id());
        assert_eq!(
            fresh.finish_submit(stale.id(), Ok(Ack::default())),
            SubmitOutcome::Discarded
        );
        assert!(fresh.is_busy());
    }

    #[test]
    fn local_completion_hands_over_payload() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        for pick in ["b", "d", "e"] {
            wizard.toggle(pick).unwrap();
            wizard.confirm().unwrap();
        }
        let favorites = wizard
            .complete_with(|payload| payload.items("two").map(|i| i.to_vec()))
            .unwrap();
        assert_eq!(favorites, Some(items(&["d"])));
        assert!(wizard.state().collected.is_empty());
    }

    #[test]
    fn complete_before_the_end_is_invalid() {
        let mut wizard = three_steps();
        wizard.start().unwrap();
        assert!(matches!(
            wizard.complete_with(|_| ()),
            Err(WizardError::InvalidTransition { .. })
        ));
    }
}
