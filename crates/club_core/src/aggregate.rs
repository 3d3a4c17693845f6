//! Merge per-step results into the payload sent to the remote endpoint.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::InterestWithDetails;
use crate::controller::WizardState;
use crate::error::ValidationError;
use crate::step::{ItemId, SelectionStep, StepId};

/// Read-only projection of the collected results, in step declaration order.
/// Serializes as a JSON object keyed by step id, followed by any extras.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionPayload {
    fields: Vec<(StepId, Vec<ItemId>)>,
    extras: Vec<(String, serde_json::Value)>,
}

impl SubmissionPayload {
    pub fn items(&self, step: &str) -> Option<&[ItemId]> {
        self.fields
            .iter()
            .find(|(id, _)| id.as_str() == step)
            .map(|(_, items)| items.as_slice())
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepId> {
        self.fields.iter().map(|(id, _)| id)
    }

    /// Attach a non-selection field (e.g. a club name typed next to the wizard).
    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl serde::Serialize,
    ) -> Result<Self, serde_json::Error> {
        let key = key.into();
        let value = serde_json::to_value(value)?;
        self.extras.retain(|(k, _)| k != &key);
        self.extras.push((key, value));
        Ok(self)
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extras.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The interest chosen in `interest_step` with the tags from `detail_step`.
    /// `None` unless exactly one interest was chosen.
    pub fn interest_with_details(
        &self,
        interest_step: &str,
        detail_step: &str,
    ) -> Option<InterestWithDetails> {
        match self.items(interest_step)? {
            [name] => Some(InterestWithDetails {
                name: name.clone(),
                detail: self
                    .items(detail_step)
                    .map(|d| d.to_vec())
                    .unwrap_or_default(),
            }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for SubmissionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.extras.len()))?;
        for (step, items) in &self.fields {
            map.serialize_entry(step, items)?;
        }
        for (key, value) in &self.extras {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Validate completeness and build the payload.
///
/// Every step in `state.step_order` whose activation condition holds must
/// have a collected entry that satisfies its constraint. The first offender
/// in declaration order is reported. Pure: the same state always yields the
/// same payload.
pub fn finalize(
    state: &WizardState,
    steps: &[SelectionStep],
) -> Result<SubmissionPayload, ValidationError> {
    let mut fields = Vec::with_capacity(state.step_order.len());

    for id in &state.step_order {
        let incomplete = || ValidationError::IncompleteForm { step: id.clone() };

        let step = steps.iter().find(|s| &s.id == id).ok_or_else(incomplete)?;
        if !step.is_applicable(&state.collected) {
            continue;
        }

        match state.collected.get(id) {
            Some(result) if step.constraint.admits(result.items.len()) => {
                fields.push((id.clone(), result.items.clone()));
            }
            _ => return Err(incomplete()),
        }
    }

    Ok(SubmissionPayload {
        fields,
        extras: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{
        CatalogItem, Collected, SelectionConstraint, SelectionResult, StepCondition, StepKind,
        StepOptions,
    };
    use pretty_assertions::assert_eq;

    fn steps() -> Vec<SelectionStep> {
        let fixed = StepOptions::Fixed(vec![
            CatalogItem::new("hiking", "Hiking"),
            CatalogItem::new("camping", "Camping"),
            CatalogItem::new("mapo", "Mapo-gu"),
        ]);
        vec![
            SelectionStep::new("interest", StepKind::Interest, "Interest", fixed.clone()),
            SelectionStep::new("interestDetail", StepKind::InterestDetail, "Detail", fixed.clone())
                .constraint(SelectionConstraint::at_most(3))
                .only_when(StepCondition::ExactlyOne("interest".into())),
            SelectionStep::new("region", StepKind::Region, "Region", fixed),
        ]
    }

    fn state(collected: Collected) -> WizardState {
        WizardState {
            active_step: None,
            collected,
            step_order: steps().into_iter().map(|s| s.id).collect(),
        }
    }

    fn result(step: &str, items: &[&str]) -> (StepId, SelectionResult) {
        (
            step.into(),
            SelectionResult::new(step, items.iter().map(|s| s.to_string()).collect()),
        )
    }

    #[test]
    fn missing_region_is_reported() {
        let collected = Collected::from([
            result("interest", &["hiking"]),
            result("interestDetail", &["camping"]),
        ]);
        let err = finalize(&state(collected), &steps()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteForm {
                step: "region".into()
            }
        );
    }

    #[test]
    fn first_offender_in_declaration_order_wins() {
        let err = finalize(&state(Collected::new()), &steps()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteForm {
                step: "interest".into()
            }
        );
    }

    #[test]
    fn entry_violating_constraint_is_incomplete() {
        let collected = Collected::from([
            result("interest", &[]),
            result("region", &["mapo"]),
        ]);
        let err = finalize(&state(collected), &steps()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteForm {
                step: "interest".into()
            }
        );
    }

    #[test]
    fn finalize_is_idempotent_and_ordered() {
        let st = state(Collected::from([
            result("region", &["mapo"]),
            result("interest", &["hiking"]),
            result("interestDetail", &["camping"]),
        ]));
        let first = finalize(&st, &steps()).unwrap();
        let second = finalize(&st, &steps()).unwrap();
        assert_eq!(first, second);

        let json = serde_json::to_string(&first).unwrap();
        assert_eq!(
            json,
            r#"{"interest":["hiking"],"interestDetail":["camping"],"region":["mapo"]}"#
        );
        assert_eq!(
            first.interest_with_details("interest", "interestDetail"),
            Some(InterestWithDetails {
                name: "hiking".into(),
                detail: vec!["camping".into()],
            })
        );
    }

    #[test]
    fn extras_follow_step_fields() {
        let st = state(Collected::from([
            result("interest", &["hiking"]),
            result("interestDetail", &[]),
            result("region", &["mapo"]),
        ]));
        let payload = finalize(&st, &steps())
            .unwrap()
            .with_extra("clubName", "Weekend Hikers")
            .unwrap();
        let value = payload.to_json().unwrap();
        assert_eq!(value["clubName"], "Weekend Hikers");
        assert_eq!(payload.extra("clubName"), Some(&serde_json::json!("Weekend Hikers")));
    }
}
