//! Assertion helpers comparing observations against expected literals.
//!
//! Each helper returns `Ok(())` on a match and an [`AssertionFailure`] that
//! carries the literal expected and actual values otherwise.

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{AssertionFailure, StepResult};
use crate::model::{ItemRow, NewItem};
use crate::request::{ApiResponse, JSON_CONTENT_TYPE};
use crate::scenario::state::ScenarioState;
use crate::scenario::step::BodyAssertion;

/// Asserts the response status code
pub fn assert_status(response: &ApiResponse, expected: StatusCode) -> Result<(), AssertionFailure> {
    if response.status != expected {
        return Err(AssertionFailure::mismatch(
            "status",
            expected.as_u16(),
            format!("{} ({})", response.status.as_u16(), snippet(&response.body)),
        ));
    }
    Ok(())
}

/// Asserts the response declares a JSON content type
pub fn assert_json_content_type(response: &ApiResponse) -> Result<(), AssertionFailure> {
    if !response.is_json() {
        return Err(AssertionFailure::mismatch(
            "content type",
            JSON_CONTENT_TYPE,
            response.content_type.as_deref().unwrap_or("none"),
        ));
    }
    Ok(())
}

/// Asserts one body field against its expectation.
///
/// Templates are rendered against the scenario state first, so a missing
/// identifier surfaces as an infrastructure failure rather than a mismatch.
pub fn assert_body(
    body: &Value,
    assertion: &BodyAssertion,
    state: &ScenarioState,
) -> StepResult<()> {
    match assertion {
        BodyAssertion::Equals { field, value } => {
            let actual = field_of(body, field)?;
            if actual != value {
                return Err(AssertionFailure::mismatch(subject(field), value, actual).into());
            }
        }
        BodyAssertion::Contains { field, template } => {
            let needle = state.render(template)?;
            let actual = field_of(body, field)?;
            match actual.as_str() {
                Some(text) if text.contains(&needle) => {}
                _ => {
                    return Err(AssertionFailure::mismatch(
                        subject(field),
                        format!("a string containing \"{}\"", needle),
                        actual,
                    )
                    .into())
                }
            }
        }
        BodyAssertion::PositiveInteger { field } => {
            let actual = field_of(body, field)?;
            match actual.as_i64() {
                Some(n) if n > 0 => {}
                _ => {
                    return Err(
                        AssertionFailure::mismatch(subject(field), "an integer > 0", actual).into(),
                    )
                }
            }
        }
    }
    Ok(())
}

/// Asserts that a row exists and equals the submitted values
pub fn assert_row_matches(
    id: i64,
    row: Option<&ItemRow>,
    expected: &NewItem,
) -> Result<(), AssertionFailure> {
    let row = row.ok_or(AssertionFailure::RowMissing { id })?;

    if row.name != expected.name {
        return Err(AssertionFailure::mismatch("db.name", &expected.name, &row.name));
    }
    if row.description != expected.description {
        return Err(AssertionFailure::mismatch(
            "db.description",
            &expected.description,
            &row.description,
        ));
    }
    Ok(())
}

/// Asserts that no row exists
pub fn assert_row_absent(id: i64, exists: bool) -> Result<(), AssertionFailure> {
    if exists {
        return Err(AssertionFailure::RowStillPresent { id });
    }
    Ok(())
}

fn field_of<'v>(body: &'v Value, field: &str) -> Result<&'v Value, AssertionFailure> {
    body.get(field)
        .ok_or_else(|| AssertionFailure::mismatch(subject(field), "a value", "missing field"))
}

fn subject(field: &str) -> String {
    format!("body.{}", field)
}

fn snippet(body: &str) -> String {
    const MAX: usize = 120;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use serde_json::json;

    fn response(status: u16, content_type: Option<&str>, body: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_status() {
        assert!(assert_status(&response(200, None, ""), StatusCode::OK).is_ok());

        let not_found = response(404, None, r#"{"detail":"Item not found"}"#);
        let err = assert_status(&not_found, StatusCode::OK).unwrap_err();
        assert!(err.to_string().contains("expected 200, got 404"));
        assert!(err.to_string().contains("Item not found"));
    }

    #[test]
    fn test_content_type() {
        assert!(assert_json_content_type(&response(200, Some("application/json"), "")).is_ok());
        assert!(
            assert_json_content_type(&response(200, Some("application/json; charset=utf-8"), ""))
                .is_ok()
        );
        assert!(assert_json_content_type(&response(200, Some("text/html"), "")).is_err());
        assert!(assert_json_content_type(&response(200, None, "")).is_err());
    }

    #[test]
    fn test_equals() {
        let state = ScenarioState::new();
        let body = json!({"name": "E2E Item"});

        assert!(assert_body(&body, &BodyAssertion::equals("name", "E2E Item"), &state).is_ok());

        let err = assert_body(&body, &BodyAssertion::equals("name", "Other"), &state).unwrap_err();
        assert_eq!(
            err.to_string(),
            "assertion failed: body.name: expected \"Other\", got \"E2E Item\""
        );

        let err =
            assert_body(&body, &BodyAssertion::equals("description", "x"), &state).unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_contains_renders_template() {
        let mut state = ScenarioState::new();
        state.capture("item_id", 5).unwrap();

        let assertion = BodyAssertion::contains("message", "Item {item_id} deleted");
        assert!(assert_body(&json!({"message": "Item 5 deleted"}), &assertion, &state).is_ok());
        assert!(assert_body(&json!({"message": "Item 6 deleted"}), &assertion, &state).is_err());
        assert!(assert_body(&json!({"message": 5}), &assertion, &state).is_err());
    }

    #[test]
    fn test_contains_without_state_is_infrastructure() {
        let state = ScenarioState::new();
        let assertion = BodyAssertion::contains("message", "Item {item_id} deleted");
        let err =
            assert_body(&json!({"message": "Item 5 deleted"}), &assertion, &state).unwrap_err();
        assert!(matches!(err, StepError::Infrastructure(_)));
    }

    #[test]
    fn test_positive_integer() {
        let state = ScenarioState::new();
        let assertion = BodyAssertion::positive_integer("id");
        assert!(assert_body(&json!({"id": 1}), &assertion, &state).is_ok());
        assert!(assert_body(&json!({"id": 0}), &assertion, &state).is_err());
        assert!(assert_body(&json!({"id": -3}), &assertion, &state).is_err());
        assert!(assert_body(&json!({"id": "7"}), &assertion, &state).is_err());
    }

    #[test]
    fn test_row_checks() {
        let submitted = NewItem::new("DB Test", "From test");
        let row = ItemRow {
            id: 9,
            name: "DB Test".to_string(),
            description: "From test".to_string(),
        };

        assert!(assert_row_matches(9, Some(&row), &submitted).is_ok());
        assert_eq!(
            assert_row_matches(9, None, &submitted).unwrap_err(),
            AssertionFailure::RowMissing { id: 9 }
        );

        let drifted = ItemRow {
            description: "Changed".to_string(),
            ..row
        };
        assert_eq!(
            assert_row_matches(9, Some(&drifted), &submitted).unwrap_err(),
            AssertionFailure::mismatch("db.description", "From test", "Changed")
        );

        assert!(assert_row_absent(9, false).is_ok());
        assert_eq!(
            assert_row_absent(9, true).unwrap_err(),
            AssertionFailure::RowStillPresent { id: 9 }
        );
    }
}
