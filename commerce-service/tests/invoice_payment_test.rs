//! Invoice tests: derivation from orders, due-date terms, payment-driven
//! status promotion.

mod common;

use common::{TestApp, TEST_CUSTOMER_ID, TEST_PRODUCT_ID};
use serde_json::{json, Value};

fn order_body(payment_terms: &str) -> Value {
    json!({
        "counterparty_id": TEST_CUSTOMER_ID,
        "counterparty_name": "Acme Retail",
        "currency": "USD",
        "payment_terms": payment_terms,
        "issue_date": "2026-02-01",
        "items": [
            {
                "product_id": TEST_PRODUCT_ID,
                "item_code": "WID-1",
                "quantity": "4",
                "unit_price": "25"
            }
        ]
    })
}

fn invoice_body() -> Value {
    json!({
        "counterparty_id": TEST_CUSTOMER_ID,
        "counterparty_name": "Acme Retail",
        "currency": "USD",
        "items": [
            {
                "product_id": TEST_PRODUCT_ID,
                "item_code": "WID-1",
                "quantity": "2",
                "unit_price": "100"
            }
        ]
    })
}

/// Create an order and move it to confirmed so it can be invoiced.
async fn confirmed_order(app: &TestApp, payment_terms: &str) -> String {
    let order: Value = app
        .post("/orders", &order_body(payment_terms))
        .await
        .json()
        .await
        .unwrap();
    let id = order["human_id"].as_str().unwrap().to_string();
    let response = app
        .patch(&format!("/orders/{}/status", id), &json!({"status": "confirmed"}))
        .await;
    assert_eq!(response.status(), 200);
    id
}

#[tokio::test]
async fn invoice_from_order_copies_lines_and_links_provenance() {
    let Some(app) = TestApp::spawn().await else { return };

    let order_id = confirmed_order(&app, "net 15").await;
    let order: Value = app
        .get(&format!("/orders/{}", order_id))
        .await
        .json()
        .await
        .unwrap();

    let response = app
        .post("/invoices/from-order", &json!({"source_id": order_id}))
        .await;
    assert_eq!(response.status(), 201);
    let invoice: Value = response.json().await.unwrap();

    assert_eq!(invoice["human_id"], "INV001");
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["source_document_id"], order["document_id"]);
    assert_eq!(invoice["counterparty_name"], "Acme Retail");
    assert_eq!(invoice["total_amount"], order["total_amount"]);
    assert_eq!(invoice["balance_due"], order["total_amount"]);

    let invoice_items = invoice["items"].as_array().unwrap();
    let order_items = order["items"].as_array().unwrap();
    assert_eq!(invoice_items.len(), order_items.len());
    assert_eq!(invoice_items[0]["quantity"], order_items[0]["quantity"]);
    assert_eq!(invoice_items[0]["unit_price"], order_items[0]["unit_price"]);
    assert_eq!(invoice_items[0]["product_id"], order_items[0]["product_id"]);

    app.cleanup().await;
}

#[tokio::test]
async fn derived_due_date_follows_net_terms() {
    let Some(app) = TestApp::spawn().await else { return };

    let order_id = confirmed_order(&app, "net 15").await;

    let invoice: Value = app
        .post(
            "/invoices/from-order",
            &json!({"source_id": order_id, "issue_date": "2026-02-01"}),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(invoice["issue_date"], "2026-02-01");
    assert_eq!(invoice["due_date"], "2026-02-16");

    app.cleanup().await;
}

#[tokio::test]
async fn explicit_due_date_wins_over_terms() {
    let Some(app) = TestApp::spawn().await else { return };

    let order_id = confirmed_order(&app, "net 15").await;

    let invoice: Value = app
        .post(
            "/invoices/from-order",
            &json!({"source_id": order_id, "due_date": "2026-06-30"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(invoice["due_date"], "2026-06-30");

    app.cleanup().await;
}

#[tokio::test]
async fn draft_and_cancelled_sources_cannot_be_invoiced() {
    let Some(app) = TestApp::spawn().await else { return };

    let draft: Value = app
        .post("/orders", &order_body("net 30"))
        .await
        .json()
        .await
        .unwrap();
    let draft_id = draft["human_id"].as_str().unwrap();

    let response = app
        .post("/invoices/from-order", &json!({"source_id": draft_id}))
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("draft"));

    let response = app
        .post("/invoices/from-order", &json!({"source_id": "SO404"}))
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn full_payment_promotes_to_paid_with_zero_balance() {
    let Some(app) = TestApp::spawn().await else { return };

    let invoice: Value = app.post("/invoices", &invoice_body()).await.json().await.unwrap();
    let id = invoice["human_id"].as_str().unwrap().to_string();
    assert_eq!(invoice["total_amount"], "200.00");

    app.patch(&format!("/invoices/{}/status", id), &json!({"status": "sent"}))
        .await;

    let response = app
        .patch(
            &format!("/invoices/{}/payment", id),
            &json!({
                "amount_paid": "200.00",
                "payment_method": "bank_transfer",
                "payment_date": "2026-03-01",
                "payment_reference": "TRX-993"
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let paid: Value = response.json().await.unwrap();
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["balance_due"], "0.00");
    assert_eq!(paid["amount_paid"], "200.00");
    assert_eq!(paid["payment_reference"], "TRX-993");

    app.cleanup().await;
}

#[tokio::test]
async fn partial_payment_promotes_to_partially_paid() {
    let Some(app) = TestApp::spawn().await else { return };

    let invoice: Value = app.post("/invoices", &invoice_body()).await.json().await.unwrap();
    let id = invoice["human_id"].as_str().unwrap().to_string();

    app.patch(&format!("/invoices/{}/status", id), &json!({"status": "sent"}))
        .await;

    let partial: Value = app
        .patch(
            &format!("/invoices/{}/payment", id),
            &json!({"amount_paid": "50.00"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(partial["status"], "partially_paid");
    assert_eq!(partial["balance_due"], "150.00");

    // Settling the remainder finishes the promotion
    let paid: Value = app
        .patch(
            &format!("/invoices/{}/payment", id),
            &json!({"amount_paid": "200.00"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["balance_due"], "0.00");

    app.cleanup().await;
}

#[tokio::test]
async fn payment_on_a_draft_invoice_fails_the_transition_check() {
    let Some(app) = TestApp::spawn().await else { return };

    let invoice: Value = app.post("/invoices", &invoice_body()).await.json().await.unwrap();
    let id = invoice["human_id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/invoices/{}/payment", id),
            &json!({"amount_paid": "200.00"}),
        )
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("draft"));
    assert!(error["details"].as_str().unwrap().contains("sent"));

    app.cleanup().await;
}

#[tokio::test]
async fn cancelling_an_order_with_an_outstanding_invoice_is_blocked() {
    let Some(app) = TestApp::spawn().await else { return };

    let order_id = confirmed_order(&app, "net 30").await;
    app.post("/invoices/from-order", &json!({"source_id": order_id.as_str()}))
        .await;

    let response = app
        .patch(
            &format!("/orders/{}/status", order_id),
            &json!({"status": "cancelled"}),
        )
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("derived"));

    app.cleanup().await;
}

#[tokio::test]
async fn manual_invoices_require_a_product_on_every_line() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut body = invoice_body();
    body["items"][0].as_object_mut().unwrap().remove("product_id");
    let response = app.post("/invoices", &body).await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}
