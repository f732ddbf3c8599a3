mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_json, body_text, TestApp};
use serde_json::json;

fn put_config(if_match: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::PUT)
        .uri("/v1/app/config")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(tag) = if_match {
        builder = builder.header(header::IF_MATCH, tag);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn greeting() {
    let app = TestApp::new("production");
    let res = app.call(Method::GET, "/v1/app", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "Hello World!");
}

#[tokio::test]
async fn config_defaults_then_full_replace() {
    let app = TestApp::new("production");
    let res = app.call(Method::GET, "/v1/app/config", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::ETAG).unwrap(), "\"1\"");
    assert_eq!(
        body_json(res).await,
        json!({ "dummyApi": false, "llmKey": "", "tavilyApiKey": "", "llmPreset": "" })
    );

    let res = app
        .send(put_config(None, json!({ "dummyApi": true, "llmKey": "sk", "tavilyApiKey": "tv", "llmPreset": "fast" })))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({}));

    // a second set replaces everything, no merge
    app.send(put_config(None, json!({ "llmPreset": "slow" }))).await;
    let res = app.call(Method::GET, "/v1/app/config", None).await;
    assert_eq!(res.headers().get(header::ETAG).unwrap(), "\"3\"");
    assert_eq!(
        body_json(res).await,
        json!({ "dummyApi": false, "llmKey": "", "tavilyApiKey": "", "llmPreset": "slow" })
    );
}

#[tokio::test]
async fn stale_if_match_is_refused() {
    let app = TestApp::new("production");
    let res = app.send(put_config(Some("\"1\""), json!({ "llmPreset": "a" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::ETAG).unwrap(), "\"2\"");

    let res = app.send(put_config(Some("\"1\""), json!({ "llmPreset": "b" }))).await;
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(body_json(res).await["error"]["code"], "precondition_failed");

    let res = app.call(Method::GET, "/v1/app/config", None).await;
    assert_eq!(body_json(res).await["llmPreset"], "a");
}

#[tokio::test]
async fn probes_and_openapi() {
    let app = TestApp::new("production");
    let res = app.call(Method::GET, "/health", None).await;
    assert_eq!(body_json(res).await, json!({ "status": "ok" }));

    let res = app.call(Method::GET, "/ready", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["database"], "ok");

    let res = app.call(Method::GET, "/version", None).await;
    assert_eq!(body_json(res).await["name"], "report-backend");

    let res = app.call(Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let doc = body_json(res).await;
    assert_eq!(doc["paths"]["/v1/generic/{entity}/{id}"]["delete"]["operationId"], "deleteEntity");
}
