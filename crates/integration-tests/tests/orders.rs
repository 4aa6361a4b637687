//! Order placement and order ownership over HTTP.

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use record_store_core::OrderState;
use record_store_integration_tests::{TestApp, decimal, order_body, order_id, products};

#[tokio::test]
async fn test_order_created_and_stock_decremented() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body(
                "cash-on-delivery",
                &[(products::IN_UTERO, 2), (products::NEVERMIND, 1)],
            ),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    // Non bank transfer orders come back as the bare order detail.
    let order = &resp.body;
    assert!(order.get("order").is_none());
    assert_eq!(order["state"], "ordered");
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));
    // 2 x 129.00 + 59.99 + 15.00 shipping
    assert_eq!(decimal(&order["total_price"]), Decimal::new(33299, 2));
    assert!(order.get("info").is_none());
    assert_eq!(order["address"], "ul. Długa 5");

    assert_eq!(app.stock(products::IN_UTERO).await, 1);
    assert_eq!(app.stock(products::NEVERMIND).await, 9);
    assert_eq!(app.stock(products::KIND_OF_BLUE).await, 5);
}

#[tokio::test]
async fn test_order_visible_in_history_and_detail() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;
    let placed = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("cash-on-delivery", &[(products::KIND_OF_BLUE, 1)]),
        )
        .await;
    let id = order_id(&placed.body);

    let list = app.get("/api/orders", Some(&alice.token)).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body[0]["id"], id.as_i32());
    assert_eq!(list.body[0]["payment"], "Cash on delivery");
    assert_eq!(list.body[0]["shipping"]["slug"], "post");

    let detail = app.get(&format!("/api/orders/{id}"), Some(&alice.token)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["zip_code"], "80-831");
    assert_eq!(detail.body["user"]["user"]["username"], "alice");
    assert_eq!(detail.body["items"][0]["product"]["slug"], products::KIND_OF_BLUE);
    assert_eq!(detail.body["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_empty_order_rejected_without_changes() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post("/api/orders", Some(&alice.token), order_body("cash-on-delivery", &[]))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["errors"]["items"][0], "Cannot place an empty order.");
    assert_eq!(app.order_count(&alice).await, 0);
    assert_eq!(app.stock(products::NEVERMIND).await, 10);
}

#[tokio::test]
async fn test_invalid_fields_are_field_errors() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let mut body = order_body("cash-on-delivery", &[(products::NEVERMIND, 0)]);
    body["zip_code"] = json!("80831");
    body["city"] = json!("");

    let resp = app.post("/api/orders", Some(&alice.token), body).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let errors = &resp.body["errors"];
    assert_eq!(errors["zip_code"][0], "Enter a zip code in the format NN-NNN.");
    assert!(errors["city"].is_array());
    assert!(errors["items[0].quantity"].is_array());
    assert_eq!(app.order_count(&alice).await, 0);
}

#[tokio::test]
async fn test_mistyped_fields_are_field_errors() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let mut body = order_body("cash-on-delivery", &[(products::NEVERMIND, 1)]);
    body["items"][0]["quantity"] = json!("two");
    let resp = app.post("/api/orders", Some(&alice.token), body).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["errors"]["items[0].quantity"].is_array(), "{}", resp.body);

    let mut body = order_body("cash-on-delivery", &[]);
    body["items"] = json!(null);
    let resp = app.post("/api/orders", Some(&alice.token), body).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["errors"]["items"].is_array(), "{}", resp.body);
    assert_eq!(app.order_count(&alice).await, 0);
    assert_eq!(app.stock(products::NEVERMIND).await, 10);
}

#[tokio::test]
async fn test_unknown_slugs_are_field_errors() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("bitcoin", &[(products::NEVERMIND, 1)]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["errors"]["payment"][0],
        "Object with slug=bitcoin does not exist."
    );

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("cash-on-delivery", &[(products::NEVERMIND, 1), ("bootleg", 1)]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.body["errors"]["items[1].product"][0],
        "Object with slug=bootleg does not exist."
    );

    assert_eq!(app.order_count(&alice).await, 0);
    assert_eq!(app.stock(products::NEVERMIND).await, 10);
}

#[tokio::test]
async fn test_insufficient_stock_is_server_error_without_changes() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body(
                "cash-on-delivery",
                &[(products::NEVERMIND, 2), (products::IN_UTERO, 4)],
            ),
        )
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body, json!({"error": "Internal server error"}));
    assert_eq!(app.order_count(&alice).await, 0);
    assert_eq!(app.stock(products::NEVERMIND).await, 10);
    assert_eq!(app.stock(products::IN_UTERO).await, 3);
}

#[tokio::test]
async fn test_delete_ordered_order() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;
    let placed = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("cash-on-delivery", &[(products::NEVERMIND, 1)]),
        )
        .await;
    let id = order_id(&placed.body);

    let resp = app.delete(&format!("/api/orders/{id}"), Some(&alice.token)).await;

    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(app.order_count(&alice).await, 0);
    let gone = app.get(&format!("/api/orders/{id}"), Some(&alice.token)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_paid_or_shipped_order_cannot_be_deleted() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    for state in [OrderState::Paid, OrderState::Shipped] {
        let placed = app
            .post(
                "/api/orders",
                Some(&alice.token),
                order_body("cash-on-delivery", &[(products::NEVERMIND, 1)]),
            )
            .await;
        let id = order_id(&placed.body);
        app.set_order_state(id, state).await;

        let resp = app.delete(&format!("/api/orders/{id}"), Some(&alice.token)).await;

        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{state}");
        assert_eq!(
            resp.body["error"],
            "This order has already been paid and can no longer be deleted. Please contact us directly."
        );
        let still = app.get(&format!("/api/orders/{id}"), Some(&alice.token)).await;
        assert_eq!(still.status, StatusCode::OK);
        assert_eq!(still.body["state"], state.as_str());
        assert_eq!(still.body["items"].as_array().map(Vec::len), Some(1));
    }
}

#[tokio::test]
async fn test_other_customers_order_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;
    let mallory = app.customer("mallory").await;
    let placed = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("cash-on-delivery", &[(products::NEVERMIND, 1)]),
        )
        .await;
    let id = order_id(&placed.body);

    let read = app.get(&format!("/api/orders/{id}"), Some(&mallory.token)).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);

    let delete = app.delete(&format!("/api/orders/{id}"), Some(&mallory.token)).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let list = app.get("/api/orders", Some(&mallory.token)).await;
    assert_eq!(list.body, json!([]));
    assert_eq!(app.order_count(&alice).await, 1);
}

#[tokio::test]
async fn test_malformed_order_id_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app.get("/api/orders/latest", Some(&alice.token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orders_require_authentication() {
    let app = TestApp::new().await;

    let list = app.get("/api/orders", None).await;
    assert_eq!(list.status, StatusCode::UNAUTHORIZED);

    let create = app
        .post(
            "/api/orders",
            None,
            order_body("cash-on-delivery", &[(products::NEVERMIND, 1)]),
        )
        .await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.stock(products::NEVERMIND).await, 10);
}
