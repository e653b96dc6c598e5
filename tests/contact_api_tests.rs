
use std::collections::HashSet;

use portfolio_contact::constants::{
    MSG_DISPATCH_FAILED, MSG_INVALID_BODY, MSG_INVALID_EMAIL, MSG_MISSING_FIELD, MSG_RATE_LIMITED,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

#[actix_rt::test]
async fn five_submissions_succeed_and_the_sixth_is_rate_limited() {
    let app = TestApp::spawn().await;

    let mut ids = HashSet::new();
    for _ in 0..5 {
        let response = app.send_email(&valid_submission("f1")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        ids.insert(body["emailId"].as_str().unwrap().to_string());
    }
    assert_eq!(ids.len(), 5);

    let response = app.send_email(&valid_submission("f1")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    assert!(retry_after > 0 && retry_after <= 3600);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], MSG_RATE_LIMITED);

    assert_eq!(app.provider.received().len(), 5);
    assert_eq!(app.rate_limiter.entry("f1").unwrap().count, 5);
}

#[actix_rt::test]
async fn fingerprints_have_independent_quotas() {
    let app = TestApp::spawn().await;

    for _ in 0..5 {
        app.send_email(&valid_submission("f1")).await;
    }
    let exhausted = app.send_email(&valid_submission("f1")).await;
    assert_eq!(exhausted.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = app.send_email(&valid_submission("f2")).await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn missing_fields_return_400_without_touching_quota() {
    let app = TestApp::spawn().await;

    let cases = [
        json!({ "subject": "Hi", "content": "x", "fingerprint": "f1" }),
        json!({ "sender": "a@b.com", "subject": "", "content": "x", "fingerprint": "f1" }),
        json!({ "sender": "a@b.com", "subject": "Hi", "content": null, "fingerprint": "f1" }),
        json!({ "sender": "a@b.com", "subject": "Hi", "content": "x" }),
    ];

    for case in cases {
        let response = app.send_email(&case).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], MSG_MISSING_FIELD);
    }

    assert!(app.rate_limiter.is_empty());
    assert!(app.provider.received().is_empty());
}

#[actix_rt::test]
async fn malformed_sender_returns_400() {
    let app = TestApp::spawn().await;

    for sender in ["plainaddress", "a@b", "a @b.com", "@b.com"] {
        let mut submission = valid_submission("f1");
        submission["sender"] = json!(sender);

        let response = app.send_email(&submission).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], MSG_INVALID_EMAIL);
    }

    assert!(app.rate_limiter.is_empty());
}

#[actix_rt::test]
async fn outbound_email_matches_the_submission() {
    let app = TestApp::spawn().await;

    let response = app.send_email(&valid_submission("f1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let received = app.provider.received();
    assert_eq!(received.len(), 1);

    let email = &received[0];
    assert_eq!(email["from"], "contact@kwt.co.kr");
    assert_eq!(email["to"], "kwt@kwt.co.kr");
    assert_eq!(email["subject"], "[KWT 문의] Hi");
    assert_eq!(email["reply_to"], "a@b.com");
    assert!(email["html"].as_str().unwrap().contains("Hello<br>World"));

    assert_eq!(app.provider.authorization(), vec![format!("Bearer {}", TEST_API_KEY)]);
}

#[actix_rt::test]
async fn user_content_is_escaped_in_outbound_html() {
    let app = TestApp::spawn().await;

    let mut submission = valid_submission("f1");
    submission["content"] = json!("<img src=x onerror=alert(1)>");
    app.send_email(&submission).await;

    let html = app.provider.received()[0]["html"].as_str().unwrap().to_string();
    assert!(!html.contains("<img"));
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
}

#[actix_rt::test]
async fn provider_rejection_returns_500_and_still_consumes_quota() {
    let app = TestApp::spawn().await;
    app.provider.set_mode(ProviderMode::Reject);

    let response = app.send_email(&valid_submission("f1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], MSG_DISPATCH_FAILED);
    assert_eq!(body["details"]["kind"], "rejected");
    assert_eq!(body["details"]["status"], 422);
    assert_eq!(body["details"]["body"]["name"], "validation_error");

    assert_eq!(app.rate_limiter.entry("f1").unwrap().count, 1);
}

#[actix_rt::test]
async fn failed_sends_count_towards_the_limit() {
    let app = TestApp::spawn().await;
    app.provider.set_mode(ProviderMode::Reject);

    for _ in 0..5 {
        let response = app.send_email(&valid_submission("f1")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    app.provider.set_mode(ProviderMode::Accept);
    let response = app.send_email(&valid_submission("f1")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn malformed_provider_response_returns_500() {
    let app = TestApp::spawn().await;
    app.provider.set_mode(ProviderMode::Malformed);

    let response = app.send_email(&valid_submission("f1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"]["kind"], "malformed_response");
}

#[actix_rt::test]
async fn unreachable_provider_returns_500() {
    let app = TestApp::spawn_with(|config| {
        // nothing listens on the discard port
        config.email_api_base_url = "http://127.0.0.1:9".parse().unwrap();
    })
    .await;

    let response = app.send_email(&valid_submission("f1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"]["kind"], "transport");
    assert_eq!(app.rate_limiter.entry("f1").unwrap().count, 1);
}

#[actix_rt::test]
async fn invalid_json_body_returns_400() {
    let app = TestApp::spawn().await;

    let response = app.client
        .post(format!("{}/api/send-email", app.address))
        .header("content-type", "application/json")
        .body("{\"sender\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], MSG_INVALID_BODY);
    assert!(body["details"].is_string());
}

#[actix_rt::test]
async fn custom_quota_is_honoured() {
    let app = TestApp::spawn_with(|config| config.rate_limit_max_requests = 2).await;

    assert_eq!(app.send_email(&valid_submission("f1")).await.status(), StatusCode::OK);
    assert_eq!(app.send_email(&valid_submission("f1")).await.status(), StatusCode::OK);
    assert_eq!(
        app.send_email(&valid_submission("f1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.config.rate_limit_max_requests, 2);
}

#[actix_rt::test]
async fn health_and_home_respond() {
    let app = TestApp::spawn().await;

    let health: Value = app.client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["rate_limiter"].as_str().unwrap().starts_with("in-memory"));

    let home: Value = app.client
        .get(format!("{}/", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(home["version"], env!("CARGO_PKG_VERSION"));
}
