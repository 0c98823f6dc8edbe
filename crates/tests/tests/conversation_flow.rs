use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use resq_agents::TriageAgent;
use resq_classifier::load_model_from;
use resq_core::{ChatInput, Intent, Sender};
use resq_observability::AppMetrics;
use resq_storage::{Archive, ExchangeArchive, MemoryArchive, SqliteArchive};
use uuid::Uuid;

fn corpus_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../training")
}

fn input(session_id: &str, owner_id: Option<&str>, text: &str) -> ChatInput {
    ChatInput {
        session_id: session_id.to_string(),
        owner_id: owner_id.map(ToString::to_string),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn rapid_fire_exchanges_keep_strict_order() {
    let model = Arc::new(load_model_from(corpus_root(), None));
    let agent = TriageAgent::new(
        model,
        Arc::new(MemoryArchive::new()),
        AppMetrics::shared(),
    );

    for text in [
        "Where is the nearest shelter?",
        "I need medical help",
        "How do I report a disaster?",
        "What should I do in case of flood?",
        "Earthquake safety tips",
    ] {
        agent
            .submit_message(input("flow-1", Some("resident-1"), text))
            .await
            .expect("submit succeeds");
    }

    let history = agent.history("flow-1").expect("session exists");
    assert_eq!(history.len(), 10);
    for (index, message) in history.iter().enumerate() {
        let expected = if index % 2 == 0 {
            Sender::User
        } else {
            Sender::Assistant
        };
        assert_eq!(message.sender, expected);
    }
    assert!(history.windows(2).all(|pair| pair[0].at < pair[1].at));
}

#[tokio::test]
async fn exchanges_land_in_sqlite() {
    let db_path = std::env::temp_dir().join(format!("resq-flow-{}.db", Uuid::new_v4()));
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let model = Arc::new(load_model_from(corpus_root(), None));
    let archive = Arc::new(
        Archive::sqlite(&database_url)
            .await
            .expect("sqlite archive connects"),
    );
    let agent = TriageAgent::new(model, archive.clone(), AppMetrics::shared());

    let outcome = agent
        .submit_message(input(
            "flow-2",
            Some("resident-2"),
            "water is rising inside the house",
        ))
        .await
        .expect("submit succeeds");
    assert_eq!(outcome.intent, Intent::FloodSafety);

    // Persistence is fire-and-forget, so give the spawned insert a moment.
    let mut records = Vec::new();
    for _ in 0..100 {
        records = archive.recent(10).await.expect("recent succeeds");
        if !records.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].owner_id.as_deref(), Some("resident-2"));
    assert_eq!(records[0].user_text, "water is rising inside the house");
    assert_eq!(records[0].response_text, outcome.response_text);

    for suffix in ["", "-wal", "-shm"] {
        let mut path = db_path.clone().into_os_string();
        path.push(suffix);
        std::fs::remove_file(path).ok();
    }
}

#[tokio::test]
async fn persistence_failure_never_blocks_the_reply() {
    let model = Arc::new(load_model_from(corpus_root(), None));
    let metrics = AppMetrics::shared();
    let archive = Arc::new(
        SqliteArchive::connect("sqlite::memory:")
            .await
            .expect("sqlite archive connects"),
    );
    archive.pool().close().await;

    let agent = TriageAgent::new(model, archive, metrics.clone());

    let outcome = agent
        .submit_message(input(
            "flow-3",
            Some("resident-3"),
            "someone is bleeding and needs a medic",
        ))
        .await
        .expect("reply still succeeds");
    assert_eq!(outcome.intent, Intent::Medical);

    let history = agent.history("flow-3").expect("session exists");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[1].sender, Sender::Assistant);

    // The failed insert is reported off the request path, so poll the counter.
    let mut failures = 0;
    for _ in 0..100 {
        failures = metrics.snapshot().persistence_failures_total;
        if failures > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(failures, 1);
}
