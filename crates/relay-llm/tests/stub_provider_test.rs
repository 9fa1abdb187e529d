//! Provider clients against a local stub server speaking the OpenAI wire format.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use relay_core::{
    CompletionError, CompletionProvider, CompletionRequest, ModelConfig,
};
use relay_llm::{ChatCompletionsClient, ResponsesClient};
use serde_json::{json, Value};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn record(state: &Recorded, headers: &HeaderMap, body: Value) {
    state.bodies.lock().await.push(body);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.auth.lock().await.push(auth);
}

async fn responses_ok(
    State(state): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let n = state.bodies.lock().await.len() + 1;
    record(&state, &headers, body).await;
    Json(json!({
        "id": format!("resp_{}", n),
        "object": "response",
        "status": "completed",
        "error": null,
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": format!("answer {}", n), "annotations": []}]
        }]
    }))
}

async fn chat_ok(
    State(state): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&state, &headers, body).await;
    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "  Hello from chat.  "},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 4, "total_tokens": 9}
    }))
}

async fn server_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn malformed() -> Json<Value> {
    Json(json!({"unexpected": true}))
}

async fn empty_choices() -> Json<Value> {
    Json(json!({"id": "chatcmpl-2", "choices": []}))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"id": "late", "output_text": "late"}))
}

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

fn model_config(base_url: String, timeout: Duration) -> ModelConfig {
    ModelConfig {
        base_url,
        system_prompt: Some("You are a helpful assistant.".to_string()),
        timeout,
        ..ModelConfig::default()
    }
}

#[tokio::test]
async fn test_responses_round_trip_threads_previous_id() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/responses", post(responses_ok))
        .with_state(recorded.clone());
    let base_url = spawn_stub(app).await;
    let client =
        ResponsesClient::new(model_config(base_url, Duration::from_secs(5)), "sk-test").unwrap();

    let first = client.complete(CompletionRequest::new("hello")).await.unwrap();
    assert_eq!(first.text, "answer 1");
    assert_eq!(first.response_id.as_deref(), Some("resp_1"));

    let second = client
        .complete(CompletionRequest::new("more").with_previous_response(first.response_id))
        .await
        .unwrap();
    assert_eq!(second.response_id.as_deref(), Some("resp_2"));

    let bodies = recorded.bodies.lock().await;
    assert_eq!(bodies[0]["input"], "hello");
    assert_eq!(bodies[0]["instructions"], "You are a helpful assistant.");
    assert!(bodies[0].get("previous_response_id").is_none());
    assert_eq!(bodies[1]["previous_response_id"], "resp_1");

    let auth = recorded.auth.lock().await;
    assert!(auth.iter().all(|a| a == "Bearer sk-test"));
}

#[tokio::test]
async fn test_chat_completions_round_trip() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .with_state(recorded.clone());
    let base_url = spawn_stub(app).await;
    let client =
        ChatCompletionsClient::new(model_config(base_url, Duration::from_secs(5)), "sk-test")
            .unwrap();

    let result = client.complete(CompletionRequest::new("hi")).await.unwrap();
    assert_eq!(result.text, "Hello from chat.");
    assert_eq!(result.response_id, None);

    let bodies = recorded.bodies.lock().await;
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(bodies[0]["messages"][1]["content"], "hi");
}

#[tokio::test]
async fn test_provider_error_status() {
    let app = Router::new().route("/v1/responses", post(server_error));
    let base_url = spawn_stub(app).await;
    let client =
        ResponsesClient::new(model_config(base_url, Duration::from_secs(5)), "sk-test").unwrap();

    let err = client.complete(CompletionRequest::new("hi")).await.unwrap_err();
    match err {
        CompletionError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unexpected_response_shape() {
    let app = Router::new().route("/v1/responses", post(malformed));
    let base_url = spawn_stub(app).await;
    let client =
        ResponsesClient::new(model_config(base_url, Duration::from_secs(5)), "sk-test").unwrap();

    let err = client.complete(CompletionRequest::new("hi")).await.unwrap_err();
    assert!(matches!(err, CompletionError::ResponseParse(_)));
}

#[tokio::test]
async fn test_empty_reply() {
    let app = Router::new().route("/v1/chat/completions", post(empty_choices));
    let base_url = spawn_stub(app).await;
    let client =
        ChatCompletionsClient::new(model_config(base_url, Duration::from_secs(5)), "sk-test")
            .unwrap();

    let err = client.complete(CompletionRequest::new("hi")).await.unwrap_err();
    assert!(matches!(err, CompletionError::EmptyReply));
}

#[tokio::test]
async fn test_timeout() {
    let app = Router::new().route("/v1/responses", post(slow));
    let base_url = spawn_stub(app).await;
    let client =
        ResponsesClient::new(model_config(base_url, Duration::from_millis(200)), "sk-test")
            .unwrap();

    let err = client.complete(CompletionRequest::new("hi")).await.unwrap_err();
    assert!(matches!(err, CompletionError::Timeout(_)));
}
