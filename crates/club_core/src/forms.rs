//! The concrete forms of the clubs client: favorites registration, club
//! creation and login, plus the field checks that sit next to the wizards.

use serde::Serialize;

use crate::aggregate::SubmissionPayload;
use crate::catalog::InterestCatalog;
use crate::controller::WizardController;
use crate::step::{SelectionConstraint, SelectionStep, StepCondition, StepKind, StepOptions};

pub const FAVORITES_STEP: &str = "favorites";
pub const INTEREST_STEP: &str = "interest";
pub const INTEREST_DETAIL_STEP: &str = "interestDetail";
pub const REGION_STEP: &str = "region";

pub const DEFAULT_FAVORITES_MAX: usize = 7;
pub const INTEREST_DETAIL_MAX: usize = 5;

pub const CLUB_NAME_MAX_CHARS: usize = 30;
pub const MIN_MEMBERS: u32 = 25;
pub const MAX_MEMBERS: u32 = 300;
pub const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=20;

/// Single multi-select over every interest: at least one, at most `max`.
pub fn favorites_wizard(catalog: &InterestCatalog, max: usize) -> WizardController {
    let step = SelectionStep::new(
        FAVORITES_STEP,
        StepKind::Interest,
        "Pick your interests",
        StepOptions::Fixed(catalog.interest_items()),
    )
    .constraint(SelectionConstraint::up_to(max));
    WizardController::new(vec![step])
}

/// Interest (exactly one) -> interest details (only after a single interest)
/// -> region.
pub fn create_club_wizard(catalog: &InterestCatalog) -> WizardController {
    WizardController::new(vec![
        SelectionStep::new(
            INTEREST_STEP,
            StepKind::Interest,
            "Club interest",
            StepOptions::Fixed(catalog.interest_items()),
        )
        .constraint(SelectionConstraint::single()),
        SelectionStep::new(
            INTEREST_DETAIL_STEP,
            StepKind::InterestDetail,
            "Interest details",
            StepOptions::DetailsOf {
                parent: INTEREST_STEP.into(),
                details: catalog.detail_items(),
            },
        )
        .constraint(SelectionConstraint::at_most(INTEREST_DETAIL_MAX))
        .only_when(StepCondition::ExactlyOne(INTEREST_STEP.into())),
        SelectionStep::new(
            REGION_STEP,
            StepKind::Region,
            "Club region",
            StepOptions::Fixed(catalog.region_items()),
        )
        .constraint(SelectionConstraint::single()),
    ])
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Please enter a club name.")]
    ClubNameMissing,
    #[error("Club names can be at most 30 characters.")]
    ClubNameTooLong,
    #[error("Capacity must be between 25 and 300 (got {0}).")]
    MemberCountOutOfRange(u32),
    #[error("Please enter your email.")]
    EmailMissing,
    #[error("That is not an email address.")]
    EmailMalformed,
    #[error("Please enter your password.")]
    PasswordMissing,
    #[error("Passwords are 8 to 20 characters long.")]
    PasswordLength,
}

/// The free-text part of the create-club form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubDetails {
    pub club_name: String,
    pub description: String,
    pub max_member: u32,
}

impl Default for ClubDetails {
    fn default() -> Self {
        Self {
            club_name: String::new(),
            description: String::new(),
            max_member: MAX_MEMBERS,
        }
    }
}

impl ClubDetails {
    pub fn validate(&self) -> Result<(), FieldError> {
        let name = self.club_name.trim();
        if name.is_empty() {
            return Err(FieldError::ClubNameMissing);
        }
        if name.chars().count() > CLUB_NAME_MAX_CHARS {
            return Err(FieldError::ClubNameTooLong);
        }
        if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&self.max_member) {
            return Err(FieldError::MemberCountOutOfRange(self.max_member));
        }
        Ok(())
    }

    /// Attach the typed fields and the chosen interest to the wizard payload.
    pub fn attach(
        &self,
        payload: SubmissionPayload,
        catalog: &InterestCatalog,
    ) -> Result<SubmissionPayload, serde_json::Error> {
        let interest = payload.interest_with_details(INTEREST_STEP, INTEREST_DETAIL_STEP);
        let location = payload
            .items(REGION_STEP)
            .and_then(|r| r.first())
            .map(|id| {
                catalog
                    .region_items()
                    .into_iter()
                    .find(|r| &r.id == id)
                    .map(|r| r.title)
                    .unwrap_or_else(|| id.clone())
            });
        payload
            .with_extra("clubName", self.club_name.trim())?
            .with_extra("description", &self.description)?
            .with_extra("maxMember", self.max_member)?
            .with_extra("location", location)?
            .with_extra("interestWithDetails", interest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.email.trim().is_empty() {
            return Err(FieldError::EmailMissing);
        }
        if !looks_like_email(self.email.trim()) {
            return Err(FieldError::EmailMalformed);
        }
        if self.password.is_empty() {
            return Err(FieldError::PasswordMissing);
        }
        if !PASSWORD_LEN.contains(&self.password.chars().count()) {
            return Err(FieldError::PasswordLength);
        }
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and a dot inside the domain.
fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .rsplit_once('.')
            .map(|(host, tld)| !host.is_empty() && tld.len() >= 2)
            .unwrap_or(false)
}
