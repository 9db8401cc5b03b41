//! Sales order lifecycle integration tests: creation with computed totals,
//! line replacement, status transitions, soft deletion.

mod common;

use common::{TestApp, OTHER_TENANT_ID, TEST_CUSTOMER_ID, TEST_PRODUCT_2_ID, TEST_PRODUCT_ID};
use serde_json::{json, Value};

fn order_body() -> Value {
    json!({
        "counterparty_id": TEST_CUSTOMER_ID,
        "counterparty_name": "Acme Retail",
        "currency": "USD",
        "items": [
            {
                "product_id": TEST_PRODUCT_ID,
                "item_code": "WID-1",
                "description": "Widget",
                "quantity": "10",
                "unit_price": "100",
                "discount_percent": "10",
                "tax_rate": "5"
            },
            {
                "product_id": TEST_PRODUCT_2_ID,
                "item_code": "GAD-1",
                "description": "Gadget",
                "quantity": "5",
                "unit_price": "50"
            }
        ]
    })
}

#[tokio::test]
async fn create_order_computes_totals_and_allocates_id() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app.post("/orders", &order_body()).await;
    assert_eq!(response.status(), 201);

    let order: Value = response.json().await.unwrap();
    assert_eq!(order["human_id"], "SO001");
    assert_eq!(order["status"], "draft");
    assert_eq!(order["subtotal"], "1250.00");
    assert_eq!(order["discount_amount"], "100.00");
    assert_eq!(order["tax_amount"], "45.00");
    assert_eq!(order["total_amount"], "1195.00");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["items"][0]["line_number"], 1);
    assert_eq!(order["items"][0]["line_amount"], "945.00");
    assert_eq!(order["items"][1]["line_number"], 2);
    assert_eq!(order["items"][1]["line_amount"], "250.00");

    app.cleanup().await;
}

#[tokio::test]
async fn ids_are_sequential_per_tenant() {
    let Some(app) = TestApp::spawn().await else { return };

    let first: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let second: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    assert_eq!(first["human_id"], "SO001");
    assert_eq!(second["human_id"], "SO002");

    app.cleanup().await;
}

#[tokio::test]
async fn order_without_product_reference_is_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut body = order_body();
    body["items"][0]
        .as_object_mut()
        .unwrap()
        .remove("product_id");

    let response = app.post("/orders", &body).await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(
        error["error"].as_str().unwrap().contains("product"),
        "unexpected error: {}",
        error
    );

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_product_reference_is_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut body = order_body();
    body["items"][0]["product_id"] = json!("00000000-0000-0000-0000-00000000dead");

    let response = app.post("/orders", &body).await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn update_replaces_lines_and_recomputes_totals() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap();

    let patch = json!({
        "items": [
            {
                "product_id": TEST_PRODUCT_ID,
                "item_code": "WID-1",
                "quantity": "2",
                "unit_price": "30"
            }
        ]
    });

    let response = app.put(&format!("/orders/{}", id), &patch).await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["subtotal"], "60.00");
    assert_eq!(updated["total_amount"], "60.00");
    assert_eq!(updated["items"].as_array().unwrap().len(), 1);

    // Applying the same list again yields identical totals
    let again: Value = app
        .put(&format!("/orders/{}", id), &patch)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(again["subtotal"], updated["subtotal"]);
    assert_eq!(again["total_amount"], updated["total_amount"]);

    app.cleanup().await;
}

#[tokio::test]
async fn line_items_are_frozen_after_draft() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap();

    let response = app
        .patch(&format!("/orders/{}/status", id), &json!({"status": "confirmed"}))
        .await;
    assert_eq!(response.status(), 200);

    let patch = json!({
        "items": [
            {"product_id": TEST_PRODUCT_ID, "item_code": "WID-1", "quantity": "1", "unit_price": "10"}
        ]
    });
    let response = app.put(&format!("/orders/{}", id), &patch).await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .contains("cannot modify line items of a non-draft document"));

    // Header fields stay patchable after draft
    let response = app
        .put(&format!("/orders/{}", id), &json!({"notes": "rush delivery"}))
        .await;
    assert_eq!(response.status(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn order_walks_its_status_graph_to_delivery() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap();

    for status in ["confirmed", "in_production", "ready_to_ship"] {
        let response = app
            .patch(&format!("/orders/{}/status", id), &json!({"status": status}))
            .await;
        assert_eq!(response.status(), 200, "transition to {} failed", status);
    }

    let response = app
        .patch(
            &format!("/orders/{}/status", id),
            &json!({
                "status": "shipped",
                "carrier": "DHL",
                "tracking_number": "JD014600003828"
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let shipped: Value = response.json().await.unwrap();
    assert_eq!(shipped["status"], "shipped");
    assert_eq!(shipped["carrier"], "DHL");
    assert_eq!(shipped["tracking_number"], "JD014600003828");
    assert!(shipped["shipped_date"].is_string());

    let delivered: Value = app
        .patch(&format!("/orders/{}/status", id), &json!({"status": "delivered"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(delivered["status"], "delivered");
    assert!(delivered["delivered_date"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn illegal_transition_names_both_statuses_and_the_allowed_set() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap();

    let response = app
        .patch(&format!("/orders/{}/status", id), &json!({"status": "shipped"}))
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    let message = error["error"].as_str().unwrap();
    assert!(message.contains("draft"));
    assert!(message.contains("shipped"));
    assert!(error["details"].as_str().unwrap().contains("confirmed"));

    app.cleanup().await;
}

#[tokio::test]
async fn foreign_status_is_rejected_with_a_field_error() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap();

    let response = app
        .patch(&format!("/orders/{}/status", id), &json!({"status": "paid"}))
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn only_draft_orders_can_be_deleted() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap().to_string();

    app.patch(&format!("/orders/{}/status", id), &json!({"status": "confirmed"}))
        .await;

    let response = app.delete(&format!("/orders/{}", id)).await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("draft"));

    app.cleanup().await;
}

#[tokio::test]
async fn deleted_drafts_disappear_from_get_and_list() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap().to_string();

    let response = app.delete(&format!("/orders/{}", id)).await;
    assert_eq!(response.status(), 200);

    let response = app.get(&format!("/orders/{}", id)).await;
    assert_eq!(response.status(), 404);

    let list: Value = app.get("/orders").await.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn documents_are_invisible_to_other_tenants() {
    let Some(app) = TestApp::spawn().await else { return };

    let order: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    let id = order["human_id"].as_str().unwrap();

    let response = app.get_as(&format!("/orders/{}", id), OTHER_TENANT_ID).await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn list_filters_by_status() {
    let Some(app) = TestApp::spawn().await else { return };

    let first: Value = app.post("/orders", &order_body()).await.json().await.unwrap();
    app.post("/orders", &order_body()).await;
    let id = first["human_id"].as_str().unwrap();
    app.patch(&format!("/orders/{}/status", id), &json!({"status": "confirmed"}))
        .await;

    let confirmed: Value = app
        .get("/orders?status=confirmed")
        .await
        .json()
        .await
        .unwrap();
    let confirmed = confirmed.as_array().unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0]["human_id"], first["human_id"]);
    // Summaries carry no line items
    assert!(confirmed[0].get("items").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn missing_tenant_header_is_unauthorized() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .client
        .get(app.url("/orders"))
        .send()
        .await
        .expect("Failed to send GET");
    assert_eq!(response.status(), 401);

    app.cleanup().await;
}
