//! The two fixed sequences run against the items service

use reqwest::StatusCode;

use crate::error::HarnessResult;
use crate::model::NewItem;
use crate::scenario::{BodyAssertion, DbCheck, Sequence, Step};

pub const INTEGRATION: &str = "integration";
pub const SMOKE: &str = "smoke";

/// Full integration sequence: API behaviour cross-checked against the store.
///
/// Each resource goes through its own create/verify/delete chain; no step reads
/// an identifier captured by another chain.
pub fn integration() -> HarnessResult<Sequence> {
    let first = NewItem::new("Test Item", "Test Desc");
    let persisted = NewItem::new("DB Test", "From test");
    let to_delete = NewItem::new("To Delete", "Gone soon");
    let temporary = NewItem::new("To Be Deleted", "Temporary");

    Sequence::new(
        INTEGRATION,
        vec![
            Step::create_item(1, "Create item", &first).capture_id("item_id"),
            Step::get_item(2, "Read created item", "item_id")
                .assert_body(BodyAssertion::equals("name", first.name.as_str())),
            Step::create_item(3, "Create item persisted in DB", &persisted)
                .capture_id("db_item_id")
                .verify_db(DbCheck::RowMatches {
                    key: "db_item_id".to_string(),
                    expected: persisted.clone(),
                }),
            Step::create_item(4, "Create item to delete", &to_delete).capture_id("delete_id"),
            Step::delete_item(5, "Delete item", "delete_id")
                .assert_body(BodyAssertion::contains("message", "Item {delete_id} deleted")),
            Step::create_item(6, "Create temporary item", &temporary).capture_id("temp_id"),
            Step::delete_item(7, "Delete temporary item and check DB", "temp_id").verify_db(
                DbCheck::Absent {
                    key: "temp_id".to_string(),
                },
            ),
            Step::get_item(8, "Deleted item is gone from API", "temp_id")
                .expect_status(StatusCode::NOT_FOUND),
            Step::delete_item(9, "Second delete is not found", "temp_id")
                .expect_status(StatusCode::NOT_FOUND),
        ],
    )
}

/// Smoke sequence: one resource through its whole lifecycle, API only
pub fn smoke() -> HarnessResult<Sequence> {
    let item = NewItem::new("E2E Item", "End-to-end test");

    Sequence::new(
        SMOKE,
        vec![
            Step::create_item(1, "Create new item", &item).capture_id("item_id"),
            Step::get_item(2, "Retrieve created item", "item_id")
                .assert_body(BodyAssertion::equals("name", item.name.as_str()))
                .assert_body(BodyAssertion::equals("description", item.description.as_str())),
            Step::delete_item(3, "Delete item", "item_id")
                .assert_body(BodyAssertion::contains("message", "Item {item_id} deleted")),
            Step::get_item(4, "Verify item is gone", "item_id")
                .expect_status(StatusCode::NOT_FOUND),
        ],
    )
}

/// Both sequences, integration first
pub fn all() -> HarnessResult<Vec<Sequence>> {
    Ok(vec![integration()?, smoke()?])
}
