//! Sequential execution of a [`Sequence`]

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::assertions;
use crate::config::HarnessConfig;
use crate::error::{AssertionFailure, HarnessError, HarnessResult, StepError, StepResult};
use crate::request::RequestFactory;
use crate::scenario::state::{Observation, ScenarioState};
use crate::scenario::step::{DbCheck, Step};
use crate::scenario::Sequence;
use crate::store::{ItemLookup, PostgresItemStore};

/// Headers sent with every request
pub const DEFAULT_HEADERS: [(&str, &str); 1] = [("Accept", "application/json")];

/// What happens to the remaining steps once one fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Skip every step after the first failure
    #[default]
    FailFast,
    /// Keep going; steps needing missing state error out on their own
    ContinueOnFailure,
}

/// Result of a single step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Passed,
    /// The system answered, but not as expected
    Failed(AssertionFailure),
    /// The harness could not get an answer
    Errored(String),
    /// Not run because an earlier step failed
    Skipped,
}

impl StepOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }
}

impl From<StepError> for StepOutcome {
    fn from(err: StepError) -> Self {
        match err {
            StepError::Assertion(failure) => StepOutcome::Failed(failure),
            StepError::Infrastructure(err) => StepOutcome::Errored(err.to_string()),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Passed => write!(f, "PASS"),
            StepOutcome::Failed(failure) => write!(f, "FAIL  {}", failure),
            StepOutcome::Errored(message) => write!(f, "ERROR {}", message),
            StepOutcome::Skipped => write!(f, "SKIP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub ordinal: u32,
    pub name: String,
    pub outcome: StepOutcome,
}

/// Per-step outcomes of one sequence run
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    pub sequence: String,
    pub steps: Vec<StepReport>,
}

impl SequenceReport {
    /// True when every step passed
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|step| step.outcome.is_passed())
    }

    /// Steps that failed or errored
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Failed(_) | StepOutcome::Errored(_)))
    }

    pub fn outcome_of(&self, ordinal: u32) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|step| step.ordinal == ordinal)
            .map(|step| &step.outcome)
    }
}

impl fmt::Display for SequenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "passed" } else { "FAILED" };
        writeln!(f, "sequence '{}' {}", self.sequence, verdict)?;
        for step in &self.steps {
            writeln!(f, "  [{:>2}] {:<40} {}", step.ordinal, step.name, step.outcome)?;
        }
        Ok(())
    }
}

/// Runs sequences step by step against the service and, optionally, the store
#[derive(Clone)]
pub struct ScenarioRunner {
    factory: RequestFactory,
    store: Option<Arc<dyn ItemLookup>>,
    policy: FailurePolicy,
}

impl ScenarioRunner {
    /// Runner without a store; steps with a DB check will error
    pub fn new(factory: RequestFactory) -> Self {
        Self {
            factory,
            store: None,
            policy: FailurePolicy::default(),
        }
    }

    /// Runner against the configured service and PostgreSQL store
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let factory = RequestFactory::new(config.base_url.clone(), DEFAULT_HEADERS)?;
        let store = PostgresItemStore::from_config(config)?;
        Ok(Self::new(factory).with_store(Arc::new(store)))
    }

    pub fn with_store(mut self, store: Arc<dyn ItemLookup>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every step of `sequence` in order with a fresh scenario state
    pub async fn run(&self, sequence: &Sequence) -> SequenceReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("sequence", name = %sequence.name(), run_id = %run_id);
        self.run_steps(sequence).instrument(span).await
    }

    async fn run_steps(&self, sequence: &Sequence) -> SequenceReport {
        info!(steps = sequence.steps().len(), "Starting sequence");

        let mut state = ScenarioState::new();
        let mut reports = Vec::with_capacity(sequence.steps().len());
        let mut aborted = false;

        for step in sequence.steps() {
            let outcome = if aborted {
                StepOutcome::Skipped
            } else {
                debug!(ordinal = step.ordinal, step = %step.name, "Running step");
                match self.run_step(step, &mut state).await {
                    Ok(()) => {
                        info!(ordinal = step.ordinal, step = %step.name, "Step passed");
                        StepOutcome::Passed
                    }
                    Err(err) => {
                        if err.is_infrastructure() {
                            error!(
                                ordinal = step.ordinal,
                                step = %step.name,
                                "Step errored: {}",
                                err
                            );
                        } else {
                            warn!(
                                ordinal = step.ordinal,
                                step = %step.name,
                                "Step failed: {}",
                                err
                            );
                        }
                        aborted = self.policy == FailurePolicy::FailFast;
                        err.into()
                    }
                }
            };

            reports.push(StepReport {
                ordinal: step.ordinal,
                name: step.name.clone(),
                outcome,
            });
        }

        let report = SequenceReport {
            sequence: sequence.name().to_string(),
            steps: reports,
        };
        info!(passed = report.passed(), "Sequence finished");
        report
    }

    /// Execute one step: call, assert, capture, then verify against the store
    pub async fn run_step(&self, step: &Step, state: &mut ScenarioState) -> StepResult<()> {
        for key in step.reads() {
            state.id(key)?;
        }

        let path = state.render(&step.path)?;
        let response = self
            .factory
            .build_request(step.body.as_deref().unwrap_or(""))
            .send(step.method.clone(), &path)
            .await?;

        assertions::assert_status(&response, step.expect.status)?;
        if step.expect.json {
            assertions::assert_json_content_type(&response)?;
        }

        if !step.expect.body.is_empty() || step.capture.is_some() {
            let body = response.json()?;
            for assertion in &step.expect.body {
                assertions::assert_body(&body, assertion, state)?;
            }

            if let Some(capture) = &step.capture {
                let id = body
                    .get(&capture.field)
                    .and_then(|value| value.as_i64())
                    .ok_or_else(|| {
                        HarnessError::MalformedResponse(format!(
                            "field '{}' is missing or not an integer in {}",
                            capture.field, body
                        ))
                    })?;
                state.capture(&capture.key, id)?;
                debug!(key = %capture.key, id, "Captured identifier");
            }
        }

        if let Some(subject) = &step.subject {
            if let Some(observation) = http_observation(step, response.status) {
                state.observe(subject, observation)?;
            }
        }

        if let Some(check) = &step.db_check {
            self.verify_store(check, state).await?;
        }

        Ok(())
    }

    async fn verify_store(&self, check: &DbCheck, state: &mut ScenarioState) -> StepResult<()> {
        let store = self.store.as_ref().ok_or_else(|| {
            HarnessError::Configuration(
                "step verifies the database but no store is configured".to_string(),
            )
        })?;

        let id = state.id(check.key())?;
        match check {
            DbCheck::RowMatches { key, expected } => {
                let row = store.find_item(id).await?;
                assertions::assert_row_matches(id, row.as_ref(), expected)?;
                state.observe(key, Observation::Present)?;
            }
            DbCheck::Absent { key } => {
                let exists = store.item_exists(id).await?;
                assertions::assert_row_absent(id, exists)?;
                state.observe(key, Observation::Absent)?;
            }
        }
        debug!(key = %check.key(), id, "Store verification passed");
        Ok(())
    }
}

/// What an HTTP answer says about the step's subject resource
fn http_observation(step: &Step, status: StatusCode) -> Option<Observation> {
    if step.capture.is_some() {
        return status.is_success().then_some(Observation::Created);
    }

    let is_read = step.method == Method::GET;
    let is_delete = step.method == Method::DELETE;

    if (is_read || is_delete) && status == StatusCode::NOT_FOUND {
        Some(Observation::Absent)
    } else if is_read && status.is_success() {
        Some(Observation::Present)
    } else if is_delete && status.is_success() {
        Some(Observation::Deleted)
    } else {
        None
    }
}
