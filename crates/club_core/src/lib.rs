//! Core of the clubs client: bounded multi-step selection wizards, the
//! single-slot modal host that presents them, payload aggregation and the
//! submission contract, plus the small amount of local state (session,
//! recent clubs, gallery view) the screens share.
//!
//! Everything here is synchronous and UI-free except the
//! [`gateway::SubmissionGateway`] trait, whose implementations do the network
//! call.

pub mod aggregate;
pub mod catalog;
pub mod controller;
pub mod error;
pub mod flow;
pub mod forms;
pub mod gallery;
pub mod gateway;
pub mod modal;
pub mod session;
pub mod step;
pub mod store;

pub use aggregate::{finalize, SubmissionPayload};
pub use catalog::{InterestCatalog, InterestWithDetails};
pub use controller::{Confirmation, SubmitOutcome, WizardController, WizardPhase, WizardState};
pub use error::{ConstraintError, StoreError, SubmissionError, ValidationError, WizardError};
pub use gateway::{Ack, SubmissionGateway};
pub use modal::ModalStack;
pub use session::{AuthToken, Session, SessionHandle};
pub use step::{SelectionConstraint, SelectionResult, SelectionStep, StepId, StepKind};
