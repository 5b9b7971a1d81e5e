//! End-to-end tests of the HTTP surface over in-memory stores.

mod common;

use axum::http::StatusCode;
use common::{spawn_app, spawn_app_with_account};
use serde_json::{Value, json};
use uuid::Uuid;

fn authorization_body(account: &str, amount_cents: i64, mcc: &str, merchant: &str) -> Value {
    json!({
        "account": account,
        "amount_cents": amount_cents,
        "mcc": mcc,
        "merchant": merchant,
    })
}

#[tokio::test]
async fn approved_debit_comes_out_of_the_routed_bucket() {
    let app = spawn_app_with_account(20_000, 20_000, 20_000).await;

    let response = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&authorization_body("1", 2_500, "5411", "MERCADO DA VILA"))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "code": "00" }));

    let balance = app
        .server
        .get("/api/v1/accounts/1/balance")
        .await
        .json::<Value>();
    assert_eq!(balance["food_cents"], 17_500);
    assert_eq!(balance["meal_cents"], 20_000);
    assert_eq!(balance["cash_cents"], 20_000);

    let transactions = app
        .server
        .get("/api/v1/accounts/1/transactions")
        .await
        .json::<Value>();
    let transactions = transactions.as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["kind"], "debit");
    assert_eq!(transactions[0]["amount_cents"], 2_500);
    assert_eq!(transactions[0]["resolved_mcc"], "5411");
}

#[tokio::test]
async fn short_food_bucket_falls_back_to_cash() {
    // food=10, meal=0, cash=200; request 100 against a food MCC.
    let app = spawn_app_with_account(1_000, 0, 20_000).await;

    let response = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&authorization_body("1", 10_000, "5412", "MERCADO GRANDE"))
        .await;

    response.assert_json(&json!({ "code": "00" }));

    let balance = app
        .server
        .get("/api/v1/accounts/1/balance")
        .await
        .json::<Value>();
    assert_eq!(balance["food_cents"], 1_000);
    assert_eq!(balance["meal_cents"], 0);
    assert_eq!(balance["cash_cents"], 10_000);
}

#[tokio::test]
async fn exhausted_account_declines_without_writing() {
    let app = spawn_app_with_account(0, 0, 0).await;

    let response = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&authorization_body("1", 100, "5411", "MERCADO DA VILA"))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "code": "51" }));

    let transactions = app
        .server
        .get("/api/v1/accounts/1/transactions")
        .await
        .json::<Value>();
    assert!(transactions.as_array().unwrap().is_empty());
    assert!(app.balances.histories_for_account("1").await.is_empty());
}

#[tokio::test]
async fn replayed_idempotency_key_maps_to_unexpected_error() {
    let app = spawn_app_with_account(20_000, 0, 0).await;
    let key = Uuid::new_v4().to_string();
    let body = authorization_body("1", 1_000, "5411", "MERCADO DA VILA");

    let first = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", key.clone())
        .json(&body)
        .await;
    first.assert_json(&json!({ "code": "00" }));

    let second = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", key)
        .json(&body)
        .await;
    second.assert_status_ok();
    second.assert_json(&json!({ "code": "07" }));

    // Exactly one debit; the caller recovers the original outcome from
    // the transaction listing.
    let balance = app
        .server
        .get("/api/v1/accounts/1/balance")
        .await
        .json::<Value>();
    assert_eq!(balance["food_cents"], 19_000);

    let transactions = app
        .server
        .get("/api/v1/accounts/1/transactions")
        .await
        .json::<Value>();
    assert_eq!(transactions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_idempotency_header_maps_to_unexpected_error() {
    let app = spawn_app_with_account(20_000, 0, 0).await;

    let response = app
        .server
        .post("/api/v1/authorizations")
        .json(&authorization_body("1", 1_000, "5411", "MERCADO DA VILA"))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "code": "07" }));
}

#[tokio::test]
async fn invalid_fields_map_to_unexpected_error() {
    let app = spawn_app_with_account(20_000, 0, 0).await;

    for body in [
        authorization_body("1", 0, "5411", "MERCADO DA VILA"),
        authorization_body("1", -100, "5411", "MERCADO DA VILA"),
        authorization_body("", 100, "5411", "MERCADO DA VILA"),
        authorization_body("1", 100, "", "MERCADO DA VILA"),
        authorization_body("1", 100, "5411", "   "),
    ] {
        let response = app
            .server
            .post("/api/v1/authorizations")
            .add_header("Idempotency-Key", Uuid::new_v4().to_string())
            .json(&body)
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "code": "07" }));
    }

    let balance = app
        .server
        .get("/api/v1/accounts/1/balance")
        .await
        .json::<Value>();
    assert_eq!(balance["food_cents"], 20_000);
}

#[tokio::test]
async fn unknown_account_maps_to_unexpected_error() {
    let app = spawn_app();

    let response = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&authorization_body("ghost", 100, "5411", "MERCADO DA VILA"))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "code": "07" }));
}

#[tokio::test]
async fn registered_merchant_override_beats_the_submitted_mcc() {
    let app = spawn_app_with_account(20_000, 20_000, 20_000).await;

    let created = app
        .server
        .post("/api/v1/merchants")
        .json(&json!({
            "name": "UBER EATS                   SAO PAULO BR",
            "mcc": "5811",
        }))
        .await;
    created.assert_status_ok();
    assert_eq!(
        created.json::<Value>()["normalized_name"],
        "UBER EATS SAO PAULO BR"
    );

    // Unrelated submitted code; the registry redirects to the meal bucket.
    let response = app
        .server
        .post("/api/v1/authorizations")
        .add_header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&authorization_body(
            "1",
            3_000,
            "5912",
            "UBER EATS                   SAO PAULO BR",
        ))
        .await;
    response.assert_json(&json!({ "code": "00" }));

    let balance = app
        .server
        .get("/api/v1/accounts/1/balance")
        .await
        .json::<Value>();
    assert_eq!(balance["meal_cents"], 17_000);
    assert_eq!(balance["food_cents"], 20_000);
    assert_eq!(balance["cash_cents"], 20_000);
}

#[tokio::test]
async fn duplicate_merchant_registration_conflicts() {
    let app = spawn_app();
    let body = json!({ "name": "Uber Eats  Sao Paulo BR", "mcc": "5811" });

    app.server.post("/api/v1/merchants").json(&body).await.assert_status_ok();

    // Same normalized name, different casing and padding.
    let second = app
        .server
        .post("/api/v1/merchants")
        .json(&json!({ "name": "UBER EATS SAO PAULO BR", "mcc": "5812" }))
        .await;
    second.assert_status(StatusCode::CONFLICT);

    let merchants = app.server.get("/api/v1/merchants").await.json::<Value>();
    assert_eq!(merchants.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_merchant_registration_is_a_bad_request() {
    let app = spawn_app();

    let response = app
        .server
        .post("/api/v1/merchants")
        .json(&json!({ "name": "  ", "mcc": "5811" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_account_balance_read_is_not_found() {
    let app = spawn_app();
    app.server
        .get("/api/v1/accounts/ghost/balance")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn health_reports_storage_connectivity() {
    let app = spawn_app();

    let response = app.server.get("/health").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "connected");
}
