use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::bayes::{NaiveBayesBuilder, NaiveBayesModel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDocument {
    pub text: String,
    pub label: String,
}

/// The five product training pairs; the minimum corpus the assistant ships
/// with when no corpus directory is present.
pub fn seed_corpus() -> Vec<TrainingDocument> {
    [
        ("Where is the nearest shelter?", "shelter"),
        ("I need medical help", "medical"),
        ("How do I report a disaster?", "report"),
        ("What should I do in case of flood?", "flood-safety"),
        ("Earthquake safety tips", "earthquake-safety"),
    ]
    .into_iter()
    .map(|(text, label)| TrainingDocument {
        text: text.to_string(),
        label: label.to_string(),
    })
    .collect()
}

pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Vec<TrainingDocument>> {
    let raw = fs::read_to_string(path.as_ref()).with_context(|| {
        format!(
            "failed reading training corpus at {}",
            path.as_ref().display()
        )
    })?;

    let mut documents = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let document: TrainingDocument =
            serde_json::from_str(line).context("invalid jsonl training line")?;
        if document.label.trim().is_empty() {
            continue;
        }
        documents.push(document);
    }

    Ok(documents)
}

/// Loads every `*.jsonl` under `root` in stable filename order, so the corpus
/// stays an ordered list regardless of filesystem enumeration.
pub fn load_dir(root: impl AsRef<Path>) -> Result<Vec<TrainingDocument>> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(root.as_ref()).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
            continue;
        }
        documents.extend(load_jsonl(entry.path())?);
    }

    if documents.is_empty() {
        anyhow::bail!(
            "training corpus at {} produced zero documents",
            root.as_ref().display()
        );
    }

    Ok(documents)
}

pub fn train_from_documents(
    documents: &[TrainingDocument],
    smoothing: Option<f64>,
) -> NaiveBayesModel {
    let mut builder = NaiveBayesBuilder::new();
    if let Some(alpha) = smoothing {
        builder = builder.with_smoothing(alpha);
    }
    for document in documents {
        builder.add_document(&document.text, &document.label);
    }
    builder.train()
}
