//! Ordered scenario model
//!
//! A [`Sequence`] is a totally ordered list of [`Step`]s. Steps share a
//! [`ScenarioState`] that only the runner passes along; the order of the steps
//! is what guarantees an identifier is captured before anything reads it.

pub mod runner;
pub mod state;
pub mod step;

pub use runner::{FailurePolicy, ScenarioRunner, SequenceReport, StepOutcome, StepReport};
pub use state::{Lifecycle, Observation, ScenarioState};
pub use step::{BodyAssertion, Capture, DbCheck, ExpectedOutcome, Step};

use std::collections::BTreeSet;

use crate::error::{HarnessError, HarnessResult};
use crate::scenario::state::check_template;

/// A named, ordered list of steps
#[derive(Debug, Clone)]
pub struct Sequence {
    name: String,
    steps: Vec<Step>,
}

impl Sequence {
    /// Build a sequence. Steps are ordered by ordinal; ordinals must be unique
    /// and every template must hold only well-formed `{key}` placeholders.
    pub fn new(name: impl Into<String>, mut steps: Vec<Step>) -> HarnessResult<Self> {
        let name = name.into();
        if steps.is_empty() {
            return Err(HarnessError::InvalidSequence(format!(
                "sequence '{}' has no steps",
                name
            )));
        }

        let mut seen = BTreeSet::new();
        for step in &steps {
            if !seen.insert(step.ordinal) {
                return Err(HarnessError::InvalidSequence(format!(
                    "sequence '{}' has more than one step at position {}",
                    name, step.ordinal
                )));
            }
            for template in step.templates() {
                check_template(template)?;
            }
        }

        steps.sort_by_key(|step| step.ordinal);
        Ok(Self { name, steps })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
