//! A single bounded choose-from-list step.
//!
//! Steps are declarative: id, kind (used by renderers to pick a view),
//! offered options, cardinality constraint and an optional activation
//! condition. Evaluation is pure; the controller owns all mutation.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::InterestWithDetails;
use crate::error::{ConstraintError, WizardError};

pub type ItemId = String;

/// Results confirmed so far, keyed by the step that produced them.
pub type Collected = BTreeMap<StepId, SelectionResult>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<&str> for StepId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Allowed selection count range for a step, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConstraint")]
pub struct SelectionConstraint {
    min: usize,
    max: usize,
}

#[derive(Deserialize)]
struct RawConstraint {
    min: usize,
    max: usize,
}

impl TryFrom<RawConstraint> for SelectionConstraint {
    type Error = WizardError;

    fn try_from(raw: RawConstraint) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl SelectionConstraint {
    pub fn new(min: usize, max: usize) -> Result<Self, WizardError> {
        if max < min {
            return Err(WizardError::InvalidConstraint { min, max });
        }
        Ok(Self { min, max })
    }

    /// Exactly one item.
    pub fn single() -> Self {
        Self { min: 1, max: 1 }
    }

    /// At least one, at most `max`. A `max` of zero still allows one.
    pub fn up_to(max: usize) -> Self {
        Self {
            min: 1,
            max: max.max(1),
        }
    }

    /// Optional, at most `max`.
    pub fn at_most(max: usize) -> Self {
        Self { min: 0, max }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn admits(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl Default for SelectionConstraint {
    fn default() -> Self {
        Self::single()
    }
}

/// Which view family renders a step. Renderers match on this exhaustively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum StepKind {
    Interest,
    InterestDetail,
    Region,
}

/// One selectable entry offered by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
        }
    }
}

/// Where a step's options come from.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOptions {
    Fixed(Vec<CatalogItem>),
    /// Options depend on the single item chosen in `parent`.
    DetailsOf {
        parent: StepId,
        details: BTreeMap<ItemId, Vec<CatalogItem>>,
    },
}

/// Activation rule for conditionally inserted steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCondition {
    /// Only shown when `step` was confirmed with exactly one item.
    ExactlyOne(StepId),
}

impl StepCondition {
    pub fn holds(&self, collected: &Collected) -> bool {
        match self {
            StepCondition::ExactlyOne(step) => collected
                .get(step)
                .map(|r| r.items.len() == 1)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub step: StepId,
    pub items: Vec<ItemId>,
}

impl SelectionResult {
    pub fn new(step: impl Into<StepId>, items: Vec<ItemId>) -> Self {
        Self {
            step: step.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<String> for StepId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Outcome of a successful evaluation. `warning` carries the non-fatal
/// `TooManySelected` when the selection had to be truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub result: SelectionResult,
    pub warning: Option<ConstraintError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStep {
    pub id: StepId,
    pub kind: StepKind,
    pub title: String,
    pub options: StepOptions,
    pub constraint: SelectionConstraint,
    pub condition: Option<StepCondition>,
}

impl SelectionStep {
    pub fn new(
        id: impl Into<StepId>,
        kind: StepKind,
        title: impl Into<String>,
        options: StepOptions,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            options,
            constraint: SelectionConstraint::default(),
            condition: None,
        }
    }

    pub fn constraint(mut self, constraint: SelectionConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn only_when(mut self, condition: StepCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether this step takes part in the wizard given what was collected so far.
    pub fn is_applicable(&self, collected: &Collected) -> bool {
        self.condition
            .as_ref()
            .map(|c| c.holds(collected))
            .unwrap_or(true)
    }

    /// Options offered right now. Detail steps offer nothing until their
    /// parent holds exactly one choice.
    pub fn offered<'a>(&'a self, collected: &Collected) -> Cow<'a, [CatalogItem]> {
        match &self.options {
            StepOptions::Fixed(items) => Cow::Borrowed(items.as_slice()),
            StepOptions::DetailsOf { parent, details } => match parent_choice(parent, collected) {
                Some(choice) => details
                    .get(choice)
                    .map(|d| Cow::Borrowed(d.as_slice()))
                    .unwrap_or(Cow::Owned(Vec::new())),
                None => Cow::Owned(Vec::new()),
            },
        }
    }

    /// Interest pre-seeded for a detail step: the parent's single choice
    /// with an empty detail list.
    pub fn seed(&self, collected: &Collected) -> Option<InterestWithDetails> {
        match &self.options {
            StepOptions::DetailsOf { parent, .. } => {
                parent_choice(parent, collected).map(InterestWithDetails::seeded)
            }
            StepOptions::Fixed(_) => None,
        }
    }

    /// Interim edit: drop unknown items and duplicates, truncate to `max`.
    /// `min` is not enforced here.
    pub fn clamp(
        &self,
        selected: &[ItemId],
        collected: &Collected,
    ) -> (Vec<ItemId>, Option<ConstraintError>) {
        let offered = self.offered(collected);
        let mut items: Vec<ItemId> = Vec::with_capacity(selected.len());
        for id in selected {
            if items.contains(id) {
                continue;
            }
            if !offered.iter().any(|o| &o.id == id) {
                debug!(step = %self.id, item = %id, "dropping item not offered by step");
                continue;
            }
            items.push(id.clone());
        }
        let warning = self.truncate(&mut items);
        (items, warning)
    }

    /// Completion-time evaluation.
    pub fn evaluate(
        &self,
        selected: &[ItemId],
        collected: &Collected,
    ) -> Result<Evaluation, ConstraintError> {
        let offered = self.offered(collected);
        let mut items: Vec<ItemId> = Vec::with_capacity(selected.len());
        for id in selected {
            if !offered.iter().any(|o| &o.id == id) {
                return Err(ConstraintError::NotInCatalog(id.clone()));
            }
            if !items.contains(id) {
                items.push(id.clone());
            }
        }

        let warning = self.truncate(&mut items);

        if items.len() < self.constraint.min() {
            return Err(ConstraintError::TooFewSelected {
                min: self.constraint.min(),
                selected: items.len(),
            });
        }

        Ok(Evaluation {
            result: SelectionResult {
                step: self.id.clone(),
                items,
            },
            warning,
        })
    }

    fn truncate(&self, items: &mut Vec<ItemId>) -> Option<ConstraintError> {
        let max = self.constraint.max();
        if items.len() <= max {
            return None;
        }
        let selected = items.len();
        items.truncate(max);
        debug!(step = %self.id, max, selected, "selection truncated");
        Some(ConstraintError::TooManySelected { max, selected })
    }
}

fn parent_choice<'a>(parent: &StepId, collected: &'a Collected) -> Option<&'a ItemId> {
    collected
        .get(parent)
        .filter(|r| r.items.len() == 1)
        .and_then(|r| r.items.first())
}
