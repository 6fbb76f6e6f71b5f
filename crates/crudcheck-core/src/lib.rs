//! Ordered API/database verification harness for an items service.
//!
//! Sequences of dependent HTTP steps run strictly in order, share the
//! identifiers they capture through a per-sequence [`scenario::ScenarioState`],
//! and assert post-conditions against both the API and the backing store.

pub mod assertions;
pub mod config;
pub mod error;
pub mod model;
pub mod request;
pub mod scenario;
pub mod sequences;
pub mod store;

pub use config::HarnessConfig;
pub use error::{AssertionFailure, HarnessError, HarnessResult, StepError};
pub use request::{ApiResponse, RequestFactory, RequestSpec};
pub use scenario::{FailurePolicy, ScenarioRunner, Sequence, SequenceReport, Step, StepOutcome};
pub use store::{ItemLookup, PostgresItemStore};
