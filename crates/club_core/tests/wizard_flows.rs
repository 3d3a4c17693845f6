use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use club_core::catalog::InterestCatalog;
use club_core::forms::{self, FAVORITES_STEP, INTEREST_DETAIL_STEP, INTEREST_STEP, REGION_STEP};
use club_core::gateway::interpret;
use club_core::{
    Ack, AuthToken, Confirmation, ConstraintError, SubmissionError, SubmissionGateway,
    StepId, SubmissionPayload, SubmitOutcome, ValidationError, WizardError, WizardPhase,
};
use pretty_assertions::assert_eq;

/// Answers with the queued raw responses in order.
struct ScriptedGateway {
    responses: Mutex<Vec<(u16, &'static str)>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedGateway {
    fn new(mut responses: Vec<(u16, &'static str)>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SubmissionGateway for ScriptedGateway {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        _token: &AuthToken,
    ) -> Result<Ack, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(payload.to_json().unwrap());
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or((500, "{}"));
        interpret(status, body)
    }
}

fn catalog() -> InterestCatalog {
    InterestCatalog::embedded().unwrap()
}

#[test]
fn eight_favorites_are_truncated_to_seven() {
    let catalog = catalog();
    let mut wizard = forms::favorites_wizard(&catalog, forms::DEFAULT_FAVORITES_MAX);
    wizard.start().unwrap();

    let picks: Vec<String> = catalog
        .entries()
        .iter()
        .take(8)
        .map(|e| e.interest.clone())
        .collect();
    let warning = wizard.set_draft(picks.clone()).unwrap();
    assert_eq!(
        warning,
        Some(ConstraintError::TooManySelected {
            max: 7,
            selected: 8
        })
    );
    assert_eq!(wizard.draft(), &picks[..7]);
    assert_eq!(wizard.confirm().unwrap(), Confirmation::Completed);

    let payload = wizard.finalize().unwrap();
    assert_eq!(payload.items(FAVORITES_STEP).unwrap(), &picks[..7]);
}

#[test]
fn empty_favorites_cannot_complete() {
    let mut wizard = forms::favorites_wizard(&catalog(), 7);
    wizard.start().unwrap();
    assert_eq!(
        wizard.confirm().unwrap(),
        Confirmation::Blocked(ConstraintError::TooFewSelected {
            min: 1,
            selected: 0
        })
    );
}

#[test]
fn single_interest_seeds_detail_step_and_back_discards_it() {
    let mut wizard = forms::create_club_wizard(&catalog());
    wizard.start().unwrap();
    wizard.toggle("outdoor").unwrap();
    assert_eq!(
        wizard.confirm().unwrap(),
        Confirmation::Advanced(INTEREST_DETAIL_STEP.into())
    );

    let seed = wizard.active_seed().unwrap();
    assert_eq!(seed.name, "outdoor");
    assert!(seed.detail.is_empty());
    assert!(wizard.offered().iter().any(|i| i.id == "Hiking"));
    assert_eq!(wizard.modal().current(), Some(&StepId::from(INTEREST_DETAIL_STEP)));

    wizard.toggle("Hiking").unwrap();
    wizard.go_back().unwrap();

    assert_eq!(wizard.phase(), &WizardPhase::StepActive(INTEREST_STEP.into()));
    let collected = &wizard.state().collected;
    assert!(collected.get(&StepId::from(INTEREST_DETAIL_STEP)).is_none());
    assert_eq!(
        collected.get(&StepId::from(INTEREST_STEP)).unwrap().items,
        vec!["outdoor".to_string()]
    );
}

#[test]
fn missing_region_blocks_finalize() {
    let mut wizard = forms::create_club_wizard(&catalog());
    wizard.start().unwrap();
    wizard.toggle("outdoor").unwrap();
    wizard.confirm().unwrap();
    wizard.confirm().unwrap();

    assert_eq!(
        wizard.finalize(),
        Err(WizardError::Validation(ValidationError::IncompleteForm {
            step: REGION_STEP.into()
        }))
    );
}

#[test]
fn full_create_club_run_completes() {
    let mut wizard = forms::create_club_wizard(&catalog());
    wizard.start().unwrap();
    for pick in ["sports", "Running", "gangnam"] {
        wizard.toggle(pick).unwrap();
        wizard.confirm().unwrap();
    }
    assert_eq!(wizard.phase(), &WizardPhase::Completed);
    assert!(!wizard.modal().is_shown());

    let first = wizard.finalize().unwrap();
    assert_eq!(first, wizard.finalize().unwrap());
}

#[tokio::test]
async fn ok_false_keeps_state_and_retry_succeeds() {
    let mut wizard = forms::favorites_wizard(&catalog(), 7);
    wizard.start().unwrap();
    wizard.toggle("music").unwrap();
    wizard.toggle("books").unwrap();
    wizard.confirm().unwrap();

    let gateway = ScriptedGateway::new(vec![
        (200, r#"{"ok":false}"#),
        (200, r#"{"ok":true,"data":null}"#),
    ]);
    let token = AuthToken::new("token");

    let first = wizard.submit(&gateway, &token).await.unwrap();
    assert_eq!(first, SubmitOutcome::Failed(SubmissionError::not_ok()));
    assert_eq!(wizard.phase(), &WizardPhase::Completed);
    assert_eq!(wizard.state().collected.len(), 1);

    let second = wizard.submit(&gateway, &token).await.unwrap();
    assert_eq!(second, SubmitOutcome::Accepted(Ack::default()));
    assert!(wizard.state().collected.is_empty());

    let seen = gateway.seen.lock().unwrap();
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0], serde_json::json!({ "favorites": ["music", "books"] }));
}

#[tokio::test]
async fn submit_before_completion_is_rejected() {
    let mut wizard = forms::favorites_wizard(&catalog(), 7);
    wizard.start().unwrap();
    let gateway = ScriptedGateway::new(Vec::new());
    let err = wizard
        .submit(&gateway, &AuthToken::new("t"))
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { .. }));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}
