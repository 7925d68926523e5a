//! HTTP-level flows against the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pacioli_api::{create_router, AppState};
use pacioli_core::store::memory::MemoryStore;
use pacioli_core::LedgerStore;
use pacioli_shared::HmacAuth;

fn app() -> (Router, String) {
    let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
    let auth = HmacAuth::new("integration-secret", 5);
    let token = auth.generate();
    let state = AppState::new(store, auth, "AvadaCadavra".to_string());
    (create_router(state), token)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, body)
}

fn authed(token: &str, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", token)
        .header("content-type", "application/json");
    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn health_is_open() {
    let (router, _) = app();
    let (status, body) = send(
        &router,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SUCCESS");
}

#[tokio::test]
async fn api_requires_token() {
    let (router, _) = app();
    let (status, body) = send(
        &router,
        Request::builder()
            .uri("/api/v1/currencies")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "FAIL");
}

#[tokio::test]
async fn currency_upsert_then_get() {
    let (router, token) = app();

    let (status, body) = send(
        &router,
        authed(
            &token,
            "PUT",
            "/api/v1/currencies/GOLD",
            Some(json!({"name": "Gold Currency", "exchange": 1.0, "author": "max"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "GOLD");

    let (status, body) = send(
        &router,
        authed(&token, "GET", "/api/v1/currencies/GOLD", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Gold Currency");
    assert_eq!(body["data"]["exchange"], 1.0);

    // Same body again lands in the same state.
    let (status, _) = send(
        &router,
        authed(
            &token,
            "PUT",
            "/api/v1/currencies/GOLD",
            Some(json!({"name": "Gold Currency", "exchange": 1.0, "author": "max"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn exchange_endpoints() {
    let (router, token) = app();
    for (code, name, exchange) in [("GOLD", "Gold Currency", 1.0), ("POINT", "Reward Point", 10.0)]
    {
        let (status, _) = send(
            &router,
            authed(
                &token,
                "PUT",
                &format!("/api/v1/currencies/{code}"),
                Some(json!({"name": name, "exchange": exchange, "author": "max"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &router,
        authed(&token, "GET", "/api/v1/exchange/GOLD/POINT", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], 10.0);

    let (status, body) = send(
        &router,
        authed(&token, "GET", "/api/v1/exchange/POINT/GOLD/100", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], 10);

    let (status, body) = send(
        &router,
        authed(&token, "PUT", "/api/v1/exchange/denom?denom=2.5", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], 2.5);

    let (_, body) = send(&router, authed(&token, "GET", "/api/v1/exchange/denom", None)).await;
    assert_eq!(body["data"], 2.5);
}

#[tokio::test]
async fn journal_posting_flow() {
    let (router, token) = app();

    let (status, _) = send(
        &router,
        authed(
            &token,
            "PUT",
            "/api/v1/currencies/GOLD",
            Some(json!({"name": "Gold Currency", "exchange": 1.0, "author": "max"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for (number, alignment) in [("GOLDRESERVE", "DEBIT"), ("GOLDCOMMIT", "CREDIT")] {
        let (status, _) = send(
            &router,
            authed(
                &token,
                "POST",
                "/api/v1/accounts",
                Some(json!({
                    "account_number": number,
                    "name": format!("{number} account"),
                    "description": format!("{number} test account"),
                    "coa": "1",
                    "currency": "GOLD",
                    "alignment": alignment,
                    "creator": "max",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &router,
        authed(
            &token,
            "POST",
            "/api/v1/journals",
            Some(json!({
                "description": "commit the reserve",
                "creator": "max",
                "transactions": [
                    {"account_number": "GOLDRESERVE", "description": "reserve", "alignment": "DEBIT", "amount": 2_000_000},
                    {"account_number": "GOLDCOMMIT", "description": "commitment", "alignment": "CREDIT", "amount": 2_000_000},
                ],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let journal_id = body["data"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        authed(&token, "GET", "/api/v1/accounts/GOLDRESERVE", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"], 2_000_000);

    let (status, body) = send(
        &router,
        authed(&token, "GET", &format!("/api/v1/journals/{journal_id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 2_000_000);
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);

    // A leg with a negative amount is a validation failure, not a backend
    // one, and carries its own error code.
    let (status, body) = send(
        &router,
        authed(
            &token,
            "POST",
            "/api/v1/journals",
            Some(json!({
                "description": "negative posting",
                "creator": "max",
                "transactions": [
                    {"account_number": "GOLDRESERVE", "description": "", "alignment": "DEBIT", "amount": -500},
                    {"account_number": "GOLDCOMMIT", "description": "", "alignment": "CREDIT", "amount": -500},
                ],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "NEGATIVE_AMOUNT");

    // An unbalanced journal is rejected with the stable error code.
    let (status, body) = send(
        &router,
        authed(
            &token,
            "POST",
            "/api/v1/journals",
            Some(json!({
                "description": "bad posting",
                "creator": "max",
                "transactions": [
                    {"account_number": "GOLDRESERVE", "description": "", "alignment": "DEBIT", "amount": 100},
                    {"account_number": "GOLDCOMMIT", "description": "", "alignment": "CREDIT", "amount": 99},
                ],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "JOURNAL_NOT_BALANCE");

    // Reverse the good journal and check balances return to zero.
    let (status, _) = send(
        &router,
        authed(
            &token,
            "POST",
            "/api/v1/journals/reversal",
            Some(json!({
                "description": "undo",
                "journal_id": journal_id,
                "creator": "max",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &router,
        authed(&token, "GET", "/api/v1/accounts/GOLDRESERVE", None),
    )
    .await;
    assert_eq!(body["data"]["balance"], 0);
}

#[tokio::test]
async fn missing_account_is_404() {
    let (router, token) = app();
    let (status, body) = send(
        &router,
        authed(&token, "GET", "/api/v1/accounts/GHOST", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "FAIL");
}

#[tokio::test]
async fn devkey_requires_magic_phrase() {
    let (router, _) = app();

    let (status, _) = send(
        &router,
        Request::builder()
            .uri("/devkey")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &router,
        Request::builder()
            .uri("/devkey")
            .header("HocusPocus", "AvadaCadavra")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(body, Value::String(_)));
}
