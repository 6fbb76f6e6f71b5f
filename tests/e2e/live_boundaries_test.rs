//! Boundary behaviour of the live service that the fixed sequences rely on

use crudcheck_core::model::{Item, NewItem};
use crudcheck_e2e_tests::utils::live_factory;
use reqwest::{Method, StatusCode};

#[tokio::test]
#[ignore = "needs a running items service"]
async fn live_repeated_delete_reports_not_found() {
    let factory = live_factory().expect("factory");

    let created = factory
        .build_request(&NewItem::new("Boundary", "Double delete").to_payload())
        .send(Method::POST, "/items")
        .await
        .expect("create");
    assert_eq!(created.status, StatusCode::OK);
    let item: Item = serde_json::from_value(created.json().expect("json")).expect("item");

    let path = format!("/items/{}", item.id);
    let first = factory.build_request("").send(Method::DELETE, &path).await.expect("delete");
    assert_eq!(first.status, StatusCode::OK);

    let second = factory.build_request("").send(Method::DELETE, &path).await.expect("delete again");
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(second.json().expect("json")["detail"], "Item not found");
}

#[tokio::test]
#[ignore = "needs a running items service"]
async fn live_unknown_item_is_not_found() {
    let factory = live_factory().expect("factory");

    let response = factory
        .build_request("")
        .send(Method::GET, &format!("/items/{}", i32::MAX))
        .await
        .expect("get");
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
