use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resq_agents::TriageAgent;
use resq_classifier::{load_dir, load_model_from, smoothing_from_env, train_from_documents};
use resq_core::ChatInput;
use resq_observability::{init_tracing, AppMetrics};
use resq_storage::{Archive, ExchangeArchive};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(about = "ResQ Triage CLI")]
struct Cli {
    #[arg(long, env = "RESQ_CORPUS_DIR", default_value = "training")]
    corpus_root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat,
    Classify {
        text: String,
    },
    Corpus,
    Exchanges {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("resq_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Chat => {
            let agent = build_agent(&cli.corpus_root).await?;
            run_chat(agent).await?;
        }
        Command::Classify { text } => {
            let model = load_model_from(&cli.corpus_root, smoothing_from_env());
            let intent = model.classify(&text)?;
            let scores = model
                .scores(&text)
                .into_iter()
                .map(|(label, score)| serde_json::json!({ "label": label, "score": score }))
                .collect::<Vec<_>>();

            let payload = serde_json::json!({
                "intent": intent,
                "scores": scores
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Corpus => {
            let documents = load_dir(&cli.corpus_root).with_context(|| {
                format!(
                    "failed loading training corpus from {}",
                    cli.corpus_root.display()
                )
            })?;

            let mut per_label: BTreeMap<String, usize> = BTreeMap::new();
            for document in &documents {
                *per_label.entry(document.label.clone()).or_insert(0) += 1;
            }
            let model = train_from_documents(&documents, smoothing_from_env());

            let payload = serde_json::json!({
                "documents": documents.len(),
                "labels": per_label,
                "vocabulary": model.vocabulary_size()
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Exchanges { limit } => {
            let archive = build_archive().await?;
            let records = archive.recent(limit).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}

async fn run_chat(agent: TriageAgent<Archive>) -> Result<()> {
    let session_id = Uuid::new_v4().to_string();

    println!("ResQ triage chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let outcome = agent
            .submit_message(ChatInput {
                session_id: session_id.clone(),
                owner_id: None,
                text: message.to_string(),
            })
            .await?;

        println!("\n[{}] {}\n", outcome.intent.as_label(), outcome.response_text);
    }

    Ok(())
}

async fn build_agent(corpus_root: &PathBuf) -> Result<TriageAgent<Archive>> {
    let metrics = AppMetrics::shared();
    let model = Arc::new(load_model_from(corpus_root, smoothing_from_env()));
    let archive = build_archive().await?;

    Ok(TriageAgent::new(model, Arc::new(archive), metrics))
}

async fn build_archive() -> Result<Archive> {
    if let Ok(database_url) = env::var("RESQ_DATABASE_URL") {
        Archive::sqlite(&database_url).await
    } else {
        Ok(Archive::memory())
    }
}
