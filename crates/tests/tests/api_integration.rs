use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, FixedOffset};
use resq_api::{build_app, build_default_app};
use resq_core::{guidance_for, Intent, FALLBACK_GUIDANCE};
use serde_json::json;
use tower::ServiceExt;

fn corpus_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../training")
}

fn chat_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn instant(value: &serde_json::Value) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value.as_str().expect("timestamp should be a string"))
        .expect("timestamp should be rfc3339")
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    let labels = parsed["model"]["labels"]
        .as_array()
        .expect("labels should be an array");
    assert!(labels.iter().any(|label| label == "shelter"));
}

#[tokio::test]
async fn default_app_falls_back_to_the_seed_corpus() {
    // No corpus directory is reachable from this test's working directory,
    // so the environment-resolved model ships the five built-in pairs.
    let app = build_default_app().await.expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["model"]["document_count"], 5);
    let labels = parsed["model"]["labels"]
        .as_array()
        .expect("labels should be an array");
    assert_eq!(labels.len(), 5);
}

#[tokio::test]
async fn chat_returns_guidance_and_intent() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({
            "text": "Where is the nearest shelter?"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["intent"], "shelter");
    assert_eq!(parsed["response_text"], guidance_for(Intent::Shelter));
    assert!(parsed["session_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn chat_rejects_blank_text() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({
            "session_id": "itest-blank",
            "text": "   "
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed = read_json(response).await;
    assert_eq!(parsed["error"], "empty_message");
}

#[tokio::test]
async fn nonsense_falls_back_to_generic_guidance() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({
            "text": "asdkjqwe nonsense text"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["intent"], "fallback");
    assert_eq!(parsed["response_text"], FALLBACK_GUIDANCE);
}

#[tokio::test]
async fn history_alternates_and_timestamps_increase() {
    let app = build_app(corpus_root()).await.expect("app should build");

    for text in [
        "I need medical help now",
        "What should I do in case of flood?",
        "Earthquake safety tips",
    ] {
        let response = app
            .clone()
            .oneshot(chat_request(json!({
                "session_id": "itest-history",
                "owner_id": "resident-7",
                "text": text
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/itest-history/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["session_id"], "itest-history");

    let messages = parsed["messages"]
        .as_array()
        .expect("messages should be an array");
    assert_eq!(messages.len(), 6);

    for (index, message) in messages.iter().enumerate() {
        let expected = if index % 2 == 0 { "user" } else { "assistant" };
        assert_eq!(message["sender"], expected);
    }

    let instants = messages
        .iter()
        .map(|message| instant(&message["at"]))
        .collect::<Vec<_>>();
    assert!(instants.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn medical_text_routes_to_medical_guidance() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(chat_request(json!({
            "text": "I need medical help now"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["intent"], "medical");
    assert_eq!(parsed["response_text"], guidance_for(Intent::Medical));
}

#[tokio::test]
async fn unknown_session_history_is_not_found() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/ghost/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let parsed = read_json(response).await;
    assert_eq!(parsed["error"], "invalid_session");
}

#[tokio::test]
async fn discarded_session_stops_serving_history() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .clone()
        .oneshot(chat_request(json!({
            "session_id": "itest-discard",
            "text": "How do I report a disaster?"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/sessions/itest-discard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/itest-discard/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn intent_catalog_covers_every_label() {
    let app = build_app(corpus_root()).await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/intents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    let intents = parsed["intents"]
        .as_array()
        .expect("intents should be an array");
    assert_eq!(intents.len(), Intent::ALL.len());
    assert!(intents.iter().any(|entry| entry["intent"] == "fallback"));
    for entry in intents {
        assert!(entry["guidance"]
            .as_str()
            .is_some_and(|guidance| !guidance.is_empty()));
    }
}
