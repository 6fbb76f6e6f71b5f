//! Step definitions
//!
//! A step is one HTTP call plus what it expects, what it captures, and an
//! optional check against the store.

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::model::NewItem;
use crate::scenario::state::placeholders;

/// Collection path of the items API
pub const ITEMS_PATH: &str = "/items";

/// An assertion on one top-level field of the JSON body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyAssertion {
    /// Field equals a literal value
    Equals { field: String, value: Value },
    /// Field is a string containing the rendered template
    Contains { field: String, template: String },
    /// Field is an integer greater than zero
    PositiveInteger { field: String },
}

impl BodyAssertion {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, template: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            template: template.into(),
        }
    }

    pub fn positive_integer(field: impl Into<String>) -> Self {
        Self::PositiveInteger {
            field: field.into(),
        }
    }
}

/// What the response must look like
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedOutcome {
    pub status: StatusCode,
    /// Require a JSON content type
    pub json: bool,
    pub body: Vec<BodyAssertion>,
}

impl Default for ExpectedOutcome {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            json: false,
            body: Vec::new(),
        }
    }
}

/// Take an integer field out of the response and store it under `key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub field: String,
    pub key: String,
}

/// Post-condition verified directly against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbCheck {
    /// The row for `key` exists and holds the submitted values
    RowMatches { key: String, expected: NewItem },
    /// No row exists for `key`
    Absent { key: String },
}

impl DbCheck {
    pub fn key(&self) -> &str {
        match self {
            DbCheck::RowMatches { key, .. } | DbCheck::Absent { key } => key,
        }
    }
}

/// One ordered step of a sequence
#[derive(Debug, Clone)]
pub struct Step {
    pub ordinal: u32,
    pub name: String,
    pub method: Method,
    /// Path template, may reference captured identifiers as `{key}`
    pub path: String,
    /// Raw request body; `None` sends no body
    pub body: Option<String>,
    pub expect: ExpectedOutcome,
    pub capture: Option<Capture>,
    pub db_check: Option<DbCheck>,
    /// Scenario-state key of the resource this step observes
    pub subject: Option<String>,
}

impl Step {
    /// A step expecting `200 OK` and nothing else
    pub fn new(
        ordinal: u32,
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let subject = placeholders(&path).first().map(|key| key.to_string());
        Self {
            ordinal,
            name: name.into(),
            method,
            path,
            body: None,
            expect: ExpectedOutcome::default(),
            capture: None,
            db_check: None,
            subject,
        }
    }

    /// `POST /items` with the item as payload, expecting a JSON body with a positive id
    pub fn create_item(ordinal: u32, name: impl Into<String>, item: &NewItem) -> Self {
        Self::new(ordinal, name, Method::POST, ITEMS_PATH)
            .with_body(item.to_payload())
            .expect_json()
            .assert_body(BodyAssertion::positive_integer("id"))
    }

    /// `GET /items/{key}`
    pub fn get_item(ordinal: u32, name: impl Into<String>, key: &str) -> Self {
        Self::new(ordinal, name, Method::GET, item_path(key))
    }

    /// `DELETE /items/{key}`
    pub fn delete_item(ordinal: u32, name: impl Into<String>, key: &str) -> Self {
        Self::new(ordinal, name, Method::DELETE, item_path(key))
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = (!body.is_empty()).then_some(body);
        self
    }

    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.expect.status = status;
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.expect.json = true;
        self
    }

    pub fn assert_body(mut self, assertion: BodyAssertion) -> Self {
        self.expect.body.push(assertion);
        self
    }

    /// Capture the `id` field under `key`; the step then observes that resource
    pub fn capture_id(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.subject = Some(key.clone());
        self.capture = Some(Capture {
            field: "id".to_string(),
            key,
        });
        self
    }

    pub fn verify_db(mut self, check: DbCheck) -> Self {
        if self.subject.is_none() {
            self.subject = Some(check.key().to_string());
        }
        self.db_check = Some(check);
        self
    }

    /// The path and every body template rendered against the scenario state
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        let body = self.expect.body.iter().filter_map(|assertion| match assertion {
            BodyAssertion::Contains { template, .. } => Some(template.as_str()),
            _ => None,
        });
        std::iter::once(self.path.as_str()).chain(body)
    }

    /// Every scenario-state key this step reads before it runs
    pub fn reads(&self) -> Vec<&str> {
        let captured = self.capture.as_ref().map(|c| c.key.as_str());
        let mut keys: Vec<&str> = self.templates().flat_map(placeholders).collect();
        if let Some(check) = &self.db_check {
            keys.push(check.key());
        }
        keys.retain(|key| Some(*key) != captured);
        keys.dedup();
        keys
    }
}

fn item_path(key: &str) -> String {
    format!("{}/{{{}}}", ITEMS_PATH, key)
}
