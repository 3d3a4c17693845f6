//! Step sequencing as data.
//!
//! The wizard shape is decided by a pure function of what has been collected
//! so far, so conditional steps (interest detail after a single interest)
//! can be tested without any UI.

use crate::step::{Collected, SelectionStep, StepId};

pub trait StepFlow: Send + Sync {
    fn next_step(&self, steps: &[SelectionStep], collected: &Collected) -> Option<StepId>;
}

/// Declaration order, skipping steps whose condition does not hold.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredOrder;

impl StepFlow for DeclaredOrder {
    fn next_step(&self, steps: &[SelectionStep], collected: &Collected) -> Option<StepId> {
        next_step(steps, collected)
    }
}

/// First applicable step that has no confirmed result yet.
pub fn next_step(steps: &[SelectionStep], collected: &Collected) -> Option<StepId> {
    steps
        .iter()
        .find(|s| s.is_applicable(collected) && !collected.contains_key(&s.id))
        .map(|s| s.id.clone())
}

impl<F> StepFlow for F
where
    F: Fn(&[SelectionStep], &Collected) -> Option<StepId> + Send + Sync,
{
    fn next_step(&self, steps: &[SelectionStep], collected: &Collected) -> Option<StepId> {
        self(steps, collected)
    }
}
