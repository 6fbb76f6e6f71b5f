//! Per-sequence state shared between ordered steps

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AssertionFailure, HarnessError, HarnessResult};

/// Where a resource stands in its lifecycle, as far as the harness has observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Creation acknowledged, not yet read back
    Created,
    /// Observed present through the API or the store
    Present,
    /// Deletion acknowledged by the API
    Deleted,
    /// Observed absent after deletion
    Absent,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Created => "created",
            Lifecycle::Present => "present",
            Lifecycle::Deleted => "deleted",
            Lifecycle::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// What a step learned about a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Created,
    Present,
    Deleted,
    Absent,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Observation::Created => "creation",
            Observation::Present => "presence",
            Observation::Deleted => "deletion",
            Observation::Absent => "absence",
        };
        f.write_str(name)
    }
}

/// Apply an observation to a (possibly unknown) lifecycle state
pub fn transition(current: Option<Lifecycle>, observation: Observation) -> Option<Lifecycle> {
    use Lifecycle as L;
    use Observation as O;

    match (current, observation) {
        (None, O::Created) => Some(L::Created),
        (Some(L::Created | L::Present), O::Present) => Some(L::Present),
        (Some(L::Created | L::Present), O::Deleted) => Some(L::Deleted),
        (Some(L::Deleted | L::Absent), O::Absent) => Some(L::Absent),
        _ => None,
    }
}

/// Identifiers captured by earlier steps plus the lifecycle of each resource
#[derive(Debug, Default, Clone)]
pub struct ScenarioState {
    ids: BTreeMap<String, i64>,
    lifecycle: BTreeMap<String, Lifecycle>,
}

impl ScenarioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an identifier. A key has exactly one writer.
    pub fn capture(&mut self, key: &str, id: i64) -> HarnessResult<()> {
        if let Some(previous) = self.ids.get(key) {
            return Err(HarnessError::InvalidSequence(format!(
                "'{}' already holds identifier {}",
                key, previous
            )));
        }
        self.ids.insert(key.to_string(), id);
        Ok(())
    }

    /// Read an identifier captured earlier in the sequence
    pub fn id(&self, key: &str) -> HarnessResult<i64> {
        self.ids.get(key).copied().ok_or_else(|| {
            HarnessError::MissingState(format!("no identifier captured under '{}'", key))
        })
    }

    pub fn lifecycle(&self, key: &str) -> Option<Lifecycle> {
        self.lifecycle.get(key).copied()
    }

    /// Record an observation, failing if the lifecycle does not allow it
    pub fn observe(
        &mut self,
        key: &str,
        observation: Observation,
    ) -> Result<Lifecycle, AssertionFailure> {
        let current = self.lifecycle(key);
        match transition(current, observation) {
            Some(next) => {
                self.lifecycle.insert(key.to_string(), next);
                Ok(next)
            }
            None => Err(AssertionFailure::Lifecycle {
                key: key.to_string(),
                state: current.map_or_else(|| "unknown".to_string(), |s| s.to_string()),
                observation: observation.to_string(),
            }),
        }
    }

    /// Replace `{key}` placeholders with captured identifiers
    pub fn render(&self, template: &str) -> HarnessResult<String> {
        check_template(template)?;

        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&self.id(key.as_str())?.to_string());
            last = whole.end();
        }
        rendered.push_str(&template[last..]);

        Ok(rendered)
    }
}

lazy_static! {
    // A captured-identifier reference such as `{item_id}`
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap();
}

/// Placeholder keys referenced by a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|key| key.as_str())
        .collect()
}

/// Reject braces that are not part of a well-formed `{key}` placeholder
pub fn check_template(template: &str) -> HarnessResult<()> {
    let stripped = PLACEHOLDER.replace_all(template, "");
    if stripped.contains(|c: char| c == '{' || c == '}') {
        return Err(HarnessError::InvalidSequence(format!(
            "malformed placeholder in '{}'",
            template
        )));
    }
    Ok(())
}
