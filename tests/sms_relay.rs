//! SMS relay endpoint against a mock gateway.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{client, proxy_config, start_proxy, start_sms_gateway, MockResolver};

async fn proxy_with_gateway(status: StatusCode) -> common::TestProxy {
    let gateway = start_sms_gateway(status).await;
    let resolver = MockResolver::json(json!({})).await;

    let mut config = proxy_config(&resolver);
    config.sms.enabled = true;
    config.sms.api_url = format!("http://{}/api/sms/send-sms", gateway);
    start_proxy(config).await
}

#[tokio::test]
async fn query_parameters_are_forwarded() {
    let proxy = proxy_with_gateway(StatusCode::OK).await;

    let res = client()
        .get(proxy.url("/sms?number=01700000000&message=hello%20there"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["received"], json!({ "name": "hello there", "mobile": "01700000000" }));
}

#[tokio::test]
async fn json_body_is_forwarded_and_status_relayed() {
    let proxy = proxy_with_gateway(StatusCode::TOO_MANY_REQUESTS).await;

    let res = client()
        .post(proxy.url("/sms"))
        .json(&json!({ "number": "01800000000", "message": "hi" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 429);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["received"]["mobile"], "01800000000");
}

#[tokio::test]
async fn missing_parameters_are_rejected() {
    let proxy = proxy_with_gateway(StatusCode::OK).await;

    for request in [
        client().get(proxy.url("/sms?number=017")),
        client().get(proxy.url("/sms?message=hi")),
        client().post(proxy.url("/sms")).body("not json"),
    ] {
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Missing required parameters: number and message");
    }
}

#[tokio::test]
async fn unreachable_gateway_is_internal_error() {
    let resolver = MockResolver::json(json!({})).await;
    let mut config = proxy_config(&resolver);
    config.sms.enabled = true;
    config.sms.api_url = "http://127.0.0.1:9/api/sms/send-sms".into();
    config.sms.timeout_ms = 2_000;
    let proxy = start_proxy(config).await;

    let res = client()
        .get(proxy.url("/sms?number=017&message=hi"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Failed to process request");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn disabled_relay_is_not_found() {
    let resolver = MockResolver::json(json!({})).await;
    let proxy = start_proxy(proxy_config(&resolver)).await;

    let res = client()
        .get(proxy.url("/sms?number=017&message=hi"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
}
