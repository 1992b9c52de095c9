use std::time::Duration;

use bananagen::{
    AspectRatio, GenError, GenerationRequest, GenerationResult, GenerationSettings, ImageClient,
    Resolution,
};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "test-model";
const NATIVE_PATH: &str = "/v1beta/models/test-model:generateContent";
const COMPAT_PATH: &str = "/v1/chat/completions";

fn settings(server: &MockServer) -> GenerationSettings {
    GenerationSettings::new()
        .with_api_key("test-key")
        .with_base_url(server.uri())
        .with_attempt_timeout(Duration::from_secs(5))
}

fn request() -> GenerationRequest {
    GenerationRequest::new("a banana on the moon", MODEL)
}

fn native_inline(mime: &str, data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"inlineData": {"mimeType": mime, "data": data}}]}
        }]
    })
}

fn compat_content(content: &str) -> Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

async fn mount_compat(server: &MockServer, template: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(COMPAT_PATH))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_native(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(NATIVE_PATH))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

async fn bodies_for(server: &MockServer, request_path: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn native_success_skips_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(NATIVE_PATH))
        .and(query_param("key", "test-key"))
        .and(header("x-goog-api-key", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(native_inline("image/jpeg", "ZZZZ")))
        .expect(1)
        .mount(&server)
        .await;
    mount_compat(&server, ResponseTemplate::new(200), 0).await;

    let result = ImageClient::new()
        .generate(&settings(&server), &request())
        .await
        .unwrap();

    assert_eq!(result.to_string(), "data:image/jpeg;base64,ZZZZ");
}

#[tokio::test]
async fn native_text_url_is_returned() {
    let server = MockServer::start().await;
    mount_native(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Here: https://x.test/a.png done"}]}}]
        })),
    )
    .await;
    mount_compat(&server, ResponseTemplate::new(200), 0).await;

    let result = ImageClient::new()
        .generate(&settings(&server), &request())
        .await
        .unwrap();

    assert_eq!(result, GenerationResult::Url("https://x.test/a.png".into()));
}

#[tokio::test]
async fn unauthorized_native_does_not_fall_back() {
    for status in [401u16, 403] {
        let server = MockServer::start().await;
        mount_native(&server, ResponseTemplate::new(status).set_body_string("invalid key")).await;
        mount_compat(&server, ResponseTemplate::new(200), 0).await;

        let err = ImageClient::new()
            .generate(&settings(&server), &request())
            .await
            .unwrap_err();

        match err {
            GenError::AuthRejected { status: got, message } => {
                assert_eq!(got, status);
                assert_eq!(message, "invalid key");
            }
            other => panic!("expected auth rejection, got {other}"),
        }
    }
}

#[tokio::test]
async fn not_found_falls_back_once() {
    let server = MockServer::start().await;
    mount_native(&server, ResponseTemplate::new(404).set_body_string("no such route")).await;
    mount_compat(
        &server,
        ResponseTemplate::new(200).set_body_json(compat_content("![img](https://x.test/b.png)")),
        1,
    )
    .await;

    let result = ImageClient::new()
        .generate(&settings(&server), &request())
        .await
        .unwrap();

    assert_eq!(result, GenerationResult::Url("https://x.test/b.png".into()));
}

#[tokio::test]
async fn exhausted_fallback_reports_only_compat_error() {
    let server = MockServer::start().await;
    mount_native(
        &server,
        ResponseTemplate::new(400).set_body_string("imageSize 4K unsupported"),
    )
    .await;
    mount_compat(
        &server,
        ResponseTemplate::new(500).set_body_string("upstream exploded"),
        1,
    )
    .await;

    let err = ImageClient::new()
        .generate(&settings(&server), &request().with_resolution(Resolution::Res4K))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, GenError::FallbackExhausted(_)));
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("upstream exploded"), "{message}");
    assert!(!message.contains("imageSize"), "{message}");
}

#[tokio::test]
async fn native_without_candidates_falls_back() {
    let server = MockServer::start().await;
    mount_native(&server, ResponseTemplate::new(200).set_body_json(json!({"candidates": []}))).await;
    mount_compat(
        &server,
        ResponseTemplate::new(200).set_body_json(compat_content("https://x.test/d.png extra")),
        1,
    )
    .await;

    let result = ImageClient::new()
        .generate(&settings(&server), &request())
        .await
        .unwrap();

    assert_eq!(result.to_string(), "https://x.test/d.png");
}

#[tokio::test]
async fn compat_without_image_is_exhausted() {
    let server = MockServer::start().await;
    mount_native(&server, ResponseTemplate::new(502)).await;
    mount_compat(
        &server,
        ResponseTemplate::new(200).set_body_json(compat_content("I can only describe images.")),
        1,
    )
    .await;

    let err = ImageClient::new()
        .generate(&settings(&server), &request())
        .await
        .unwrap_err();

    match err {
        GenError::FallbackExhausted(message) => assert!(message.contains("No image")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn compat_auth_failure_is_wrapped() {
    let server = MockServer::start().await;
    mount_native(&server, ResponseTemplate::new(404)).await;
    mount_compat(&server, ResponseTemplate::new(401).set_body_string("bad key"), 1).await;

    let err = ImageClient::new()
        .generate(&settings(&server), &request())
        .await
        .unwrap_err();

    assert!(matches!(err, GenError::FallbackExhausted(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn slow_native_attempt_times_out_into_fallback() {
    let server = MockServer::start().await;
    mount_native(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(native_inline("image/png", "AAAA"))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_compat(
        &server,
        ResponseTemplate::new(200).set_body_json(compat_content("See https://x.test/c.png")),
        1,
    )
    .await;

    let settings = settings(&server).with_attempt_timeout(Duration::from_millis(300));
    let result = ImageClient::new().generate(&settings, &request()).await.unwrap();

    assert_eq!(result.to_string(), "https://x.test/c.png");
}

#[tokio::test]
async fn chat_completions_base_url_reaches_both_protocols() {
    let server = MockServer::start().await;
    mount_native(&server, ResponseTemplate::new(404)).await;
    mount_compat(
        &server,
        ResponseTemplate::new(200).set_body_json(compat_content("https://x.test/ok.png")),
        1,
    )
    .await;

    let settings = settings(&server).with_base_url(format!("{}/v1/chat/completions/", server.uri()));
    let result = ImageClient::new().generate(&settings, &request()).await.unwrap();

    assert_eq!(result.to_string(), "https://x.test/ok.png");
}

#[tokio::test]
async fn reference_image_is_sent_in_both_encodings() {
    let server = MockServer::start().await;
    mount_native(&server, ResponseTemplate::new(404)).await;
    Mock::given(method("POST"))
        .and(path(COMPAT_PATH))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(compat_content("https://x.test/r.png")))
        .expect(1)
        .mount(&server)
        .await;

    let request = request()
        .with_aspect_ratio(AspectRatio::Square)
        .with_resolution(Resolution::Res2K)
        .with_reference_image("data:image/png;base64,AAAA");
    ImageClient::new()
        .generate(&settings(&server), &request)
        .await
        .unwrap();

    let native = bodies_for(&server, NATIVE_PATH).await;
    assert_eq!(native.len(), 1);
    assert_eq!(
        native[0]["contents"][0]["parts"][1],
        json!({"inlineData": {"mimeType": "image/png", "data": "AAAA"}})
    );
    assert_eq!(
        native[0]["generationConfig"]["imageConfig"],
        json!({"aspectRatio": "1:1", "imageSize": "2K"})
    );

    let compat = bodies_for(&server, COMPAT_PATH).await;
    assert_eq!(compat.len(), 1);
    assert_eq!(compat[0]["model"], MODEL);
    assert_eq!(
        compat[0]["messages"][1]["content"][1]["image_url"]["url"],
        "data:image/png;base64,AAAA"
    );
}

#[tokio::test]
async fn missing_key_makes_no_requests() {
    let server = MockServer::start().await;
    let settings = GenerationSettings::new().with_base_url(server.uri());

    let err = ImageClient::new()
        .generate(&settings, &request())
        .await
        .unwrap_err();

    assert!(matches!(err, GenError::MissingCredential));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn invalid_request_makes_no_requests() {
    let server = MockServer::start().await;

    let err = ImageClient::new()
        .generate(&settings(&server), &GenerationRequest::new("  ", MODEL))
        .await
        .unwrap_err();

    assert!(matches!(err, GenError::InvalidRequest(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
