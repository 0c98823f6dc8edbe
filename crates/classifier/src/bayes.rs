use std::collections::{BTreeMap, HashMap, HashSet};

use resq_core::{tokenize, Intent, TriageError};

pub const DEFAULT_SMOOTHING: f64 = 1.0;

#[derive(Debug, Clone, Default)]
struct LabelStats {
    documents: u64,
    total_terms: u64,
    term_counts: HashMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct NaiveBayesBuilder {
    smoothing: f64,
    labels: BTreeMap<String, LabelStats>,
    vocabulary: HashSet<String>,
    total_documents: u64,
}

impl Default for NaiveBayesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesBuilder {
    pub fn new() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            labels: BTreeMap::new(),
            vocabulary: HashSet::new(),
            total_documents: 0,
        }
    }

    /// Non-positive values are ignored; zero would reintroduce log(0) for
    /// unseen terms.
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        if smoothing > 0.0 {
            self.smoothing = smoothing;
        }
        self
    }

    pub fn add_document(&mut self, text: &str, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }

        let stats = self.labels.entry(label.to_string()).or_default();
        stats.documents += 1;
        self.total_documents += 1;

        for term in tokenize(text) {
            stats.total_terms += 1;
            *stats.term_counts.entry(term.clone()).or_insert(0) += 1;
            self.vocabulary.insert(term);
        }
    }

    /// Freezes the accumulated counts into the serving model.
    pub fn train(self) -> NaiveBayesModel {
        NaiveBayesModel {
            smoothing: self.smoothing,
            labels: self.labels,
            vocabulary: self.vocabulary,
            total_documents: self.total_documents,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NaiveBayesModel {
    smoothing: f64,
    labels: BTreeMap<String, LabelStats>,
    vocabulary: HashSet<String>,
    total_documents: u64,
}

impl NaiveBayesModel {
    /// Best label for the text. `UntrainedModel` when no label has ever been
    /// trained; the reserved fallback label when no term of the text is in
    /// the vocabulary (every score would collapse to its bare prior).
    pub fn classify(&self, text: &str) -> Result<String, TriageError> {
        if self.labels.is_empty() {
            return Err(TriageError::UntrainedModel);
        }

        let terms = tokenize(text);
        if !terms.iter().any(|term| self.vocabulary.contains(term)) {
            return Ok(Intent::Fallback.as_label().to_string());
        }

        // Ascending label order plus strictly-greater replacement makes ties
        // resolve to the lexicographically smallest label.
        let mut best_label: &str = Intent::Fallback.as_label();
        let mut best_score = f64::NEG_INFINITY;
        for (label, stats) in &self.labels {
            let score = self.score(stats, &terms);
            if score > best_score {
                best_score = score;
                best_label = label.as_str();
            }
        }

        Ok(best_label.to_string())
    }

    /// Per-label log-scores, highest first.
    pub fn scores(&self, text: &str) -> Vec<(String, f64)> {
        let terms = tokenize(text);
        let mut scored: Vec<(String, f64)> = self
            .labels
            .iter()
            .map(|(label, stats)| (label.clone(), self.score(stats, &terms)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored
    }

    fn score(&self, stats: &LabelStats, terms: &[String]) -> f64 {
        let prior = (stats.documents as f64 / self.total_documents as f64).ln();
        let denominator = stats.total_terms as f64 + self.smoothing * self.vocabulary.len() as f64;

        let likelihood: f64 = terms
            .iter()
            .map(|term| {
                let count = stats.term_counts.get(term).copied().unwrap_or(0) as f64;
                ((count + self.smoothing) / denominator).ln()
            })
            .sum();

        prior + likelihood
    }

    pub fn labels(&self) -> Vec<&str> {
        self.labels.keys().map(String::as_str).collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn document_count(&self) -> u64 {
        self.total_documents
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }
}
