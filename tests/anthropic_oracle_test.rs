//! Anthropic oracle against a local HTTP double.

mod common;

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use message_chess::adapters::oracles::{AnthropicApiConfig, AnthropicApiOracle};
use message_chess::domain::errors::{DomainError, ErrorKind};
use message_chess::domain::models::{ImageFormat, PersonaTable, ScreenshotRef};
use message_chess::domain::ports::{
    PersonaOracle, PersonaTurn, ReviewOracle, ReviewPrompt, ReviewSynthesizer, SynthesisRequest,
    PromptTurn,
};
use message_chess::services::{demo_review, OracleSynthesizer, DEMO_REVIEW_ID};

fn oracle_for(server: &Server) -> AnthropicApiOracle {
    let config = AnthropicApiConfig::default()
        .with_api_key("test-key")
        .with_base_url(server.url());
    AnthropicApiOracle::new(config).expect("client builds")
}

fn text_response(text: &str) -> String {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 12, "output_tokens": 34 }
    })
    .to_string()
}

fn screenshot() -> ScreenshotRef {
    ScreenshotRef::from_bytes(ImageFormat::Png, common::PNG_BYTES)
}

#[tokio::test]
async fn test_review_request_returns_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(text_response("{\"hello\": true}"))
        .expect(1)
        .create_async()
        .await;

    let oracle = oracle_for(&server);
    let prompt = ReviewPrompt::new("system", PromptTurn::user("review this"));
    let text = oracle.generate_review(&prompt).await.unwrap();

    assert_eq!(text, "{\"hello\": true}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_screenshot_review_end_to_end() {
    let review_json = serde_json::to_string(&demo_review().unwrap()).unwrap();
    let fenced = format!("Here is the review:\n```json\n{review_json}\n```");

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("content-type", Matcher::Regex("application/json".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(text_response(&fenced))
        .expect(1)
        .create_async()
        .await;

    let synthesizer =
        OracleSynthesizer::new(Arc::new(oracle_for(&server)), Duration::from_secs(10));
    let review = synthesizer
        .synthesize(SynthesisRequest::screenshot(screenshot()))
        .await
        .unwrap();

    assert_ne!(review.id, DEMO_REVIEW_ID, "oracle reviews get a fresh id");
    assert_eq!(review.eval_series.len(), review.message_reviews.len() + 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_overloaded_is_transient_and_retried_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body("{\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\"}}")
        .expect(3)
        .create_async()
        .await;

    let oracle = Arc::new(oracle_for(&server));
    let prompt = ReviewPrompt::new("system", PromptTurn::user("review"));
    let err = oracle.generate_review(&prompt).await.unwrap_err();
    assert!(err.is_transient());

    let synthesizer = OracleSynthesizer::new(oracle, Duration::from_secs(10));
    let err = synthesizer
        .synthesize(SynthesisRequest::screenshot(screenshot()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OracleError);

    // One direct call, then a call and a retry from the synthesizer.
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_and_server_errors_are_transient() {
    for status in [429, 500, 503] {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(status)
            .with_body("busy")
            .create_async()
            .await;

        let prompt = ReviewPrompt::new("system", PromptTurn::user("review"));
        let err = oracle_for(&server).generate_review(&prompt).await.unwrap_err();
        assert!(err.is_transient(), "status {status} should be transient");
    }
}

#[tokio::test]
async fn test_unauthorized_is_permanent_and_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(401)
        .with_body("{\"type\":\"error\",\"error\":{\"type\":\"authentication_error\"}}")
        .expect(1)
        .create_async()
        .await;

    let synthesizer =
        OracleSynthesizer::new(Arc::new(oracle_for(&server)), Duration::from_secs(10));
    let err = synthesizer
        .synthesize(SynthesisRequest::screenshot(screenshot()))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Oracle { transient: false, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_content_is_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(text_response("   "))
        .create_async()
        .await;

    let prompt = ReviewPrompt::new("system", PromptTurn::user("review"));
    let err = oracle_for(&server).generate_review(&prompt).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OracleError);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_persona_reply_is_trimmed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(text_response("  lol sure, 8 works  \n"))
        .expect(1)
        .create_async()
        .await;

    let persona = PersonaTable.get("flirty").expect("flirty persona exists");
    let reply = oracle_for(&server)
        .respond(PersonaTurn {
            persona,
            turn: 1,
            transcript: &[],
            user_message: "still on for 8?",
        })
        .await
        .unwrap();

    assert_eq!(reply, "lol sure, 8 works");
    mock.assert_async().await;
}
