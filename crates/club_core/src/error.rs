//! Error taxonomy for the selection wizard.
//!
//! - `ConstraintError`: step-local cardinality problems, surfaced inline.
//! - `ValidationError`: the aggregated form is incomplete, blocks submission.
//! - `SubmissionError`: the remote endpoint rejected or never received the payload.
//! - `WizardError`: wiring mistakes (illegal transitions, empty wizards, busy guard).
//! - `StoreError`: local key-value persistence failures.

use crate::step::{ItemId, StepId};

/// Cardinality problems detected by a single selection step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    /// More items were selected than the step allows. Non-fatal: the
    /// selection has already been truncated to the first `max` items.
    #[error("at most {max} items can be selected ({selected} were chosen)")]
    TooManySelected { max: usize, selected: usize },
    /// Fewer items than required at completion time.
    #[error("at least {min} items must be selected ({selected} were chosen)")]
    TooFewSelected { min: usize, selected: usize },
    #[error("item '{0}' is not offered by this step")]
    NotInCatalog(ItemId),
}

impl ConstraintError {
    /// Warnings leave the step usable; everything else blocks completion.
    pub fn is_warning(&self) -> bool {
        matches!(self, ConstraintError::TooManySelected { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("step '{step}' is incomplete")]
    IncompleteForm { step: StepId },
}

/// Failure of a single submission attempt. The wizard state is untouched,
/// so the same payload may be submitted again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("submission failed: {cause}")]
pub struct SubmissionError {
    pub cause: String,
}

impl SubmissionError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    pub fn rejected(status: u16) -> Self {
        Self::new(format!("endpoint answered with status {status}"))
    }

    pub fn not_ok() -> Self {
        Self::new("endpoint answered ok=false")
    }
}

/// Internal invariant violations of the wizard controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("cannot {operation} while the wizard is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: &'static str,
    },
    #[error("wizard has no steps configured")]
    EmptyWizard,
    #[error("a submission is in flight")]
    Busy,
    #[error("result for step '{got}' given while '{expected}' is active")]
    StepMismatch { expected: StepId, got: StepId },
    #[error("unknown step '{0}'")]
    UnknownStep(StepId),
    #[error("selection range min {min} exceeds max {max}")]
    InvalidConstraint { min: usize, max: usize },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
