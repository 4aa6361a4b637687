//! Bank transfer payment instructions.

use axum::http::StatusCode;
use rust_decimal::Decimal;

use record_store_integration_tests::{TestApp, decimal, order_body, order_id, products};

#[tokio::test]
async fn test_bank_transfer_sends_exactly_one_email() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("bank-transfer", &[(products::KIND_OF_BLUE, 2)]),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    assert_eq!(resp.body["info"]["name"], "Music Shop Sp. z o.o.");
    assert_eq!(
        resp.body["info"]["account"],
        "PL61 1090 1014 0000 0712 1981 2874"
    );

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.to.as_str(), "alice@example.com");
    assert_eq!(email.instructions.order_id, order_id(&resp.body));
    // 2 x 45.00 + 15.00 shipping
    assert_eq!(email.instructions.amount, Decimal::new(10500, 2));
    assert_eq!(email.instructions.amount, decimal(&resp.body["order"]["total_price"]));
    assert_eq!(
        email.instructions.reference.to_string(),
        resp.body["order"]["code"].as_str().unwrap_or_default()
    );
    assert_eq!(email.instructions.recipient_address, "ul. Winylowa 33, 00-950 Warszawa");
}

#[tokio::test]
async fn test_other_payment_sends_no_email() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("cash-on-delivery", &[(products::KIND_OF_BLUE, 1)]),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert!(resp.body.get("info").is_none());
    assert_eq!(resp.body["payment"], "Cash on delivery");
    assert!(resp.body["code"].is_string());
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_rolled_back_order_sends_no_email() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("bank-transfer", &[(products::A_LOVE_SUPREME, 1)]),
        )
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.mailer.sent().is_empty());
    assert_eq!(app.order_count(&alice).await, 0);
}

#[tokio::test]
async fn test_rejected_order_sends_no_email() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;

    let resp = app
        .post("/api/orders", Some(&alice.token), order_body("bank-transfer", &[]))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_order() {
    let app = TestApp::new().await;
    let alice = app.customer("alice").await;
    app.mailer.fail_from_now_on();

    let resp = app
        .post(
            "/api/orders",
            Some(&alice.token),
            order_body("bank-transfer", &[(products::NEVERMIND, 1)]),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert!(resp.body["info"].is_object());
    assert_eq!(app.order_count(&alice).await, 1);
    assert_eq!(app.stock(products::NEVERMIND).await, 9);
}
