mod bayes;
mod corpus;

use std::env;
use std::path::Path;

pub use bayes::{NaiveBayesBuilder, NaiveBayesModel, DEFAULT_SMOOTHING};
pub use corpus::{load_dir, load_jsonl, seed_corpus, train_from_documents, TrainingDocument};

/// Model from a corpus directory, falling back to the built-in seed pairs
/// when the directory is missing or unreadable.
pub fn load_model_from(corpus_root: impl AsRef<Path>, smoothing: Option<f64>) -> NaiveBayesModel {
    let documents = load_dir(corpus_root).unwrap_or_else(|_| seed_corpus());
    train_from_documents(&documents, smoothing)
}

/// Model resolved from the environment: `RESQ_CORPUS_DIR` picks the corpus
/// directory and `RESQ_SMOOTHING` overrides the smoothing constant.
pub fn load_default_model() -> NaiveBayesModel {
    let corpus_root = env::var("RESQ_CORPUS_DIR").unwrap_or_else(|_| "training".to_string());
    load_model_from(corpus_root, smoothing_from_env())
}

/// `RESQ_SMOOTHING` as an override, ignoring values that do not parse.
pub fn smoothing_from_env() -> Option<f64> {
    env::var("RESQ_SMOOTHING")
        .ok()
        .and_then(|raw| raw.parse::<f64>().ok())
}
