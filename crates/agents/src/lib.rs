use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use resq_classifier::NaiveBayesModel;
use resq_core::{
    guidance_for, is_blank, preview, ChatInput, ConversationMessage, ConversationSession,
    ExchangeRecord, Intent, TriageError, TriageOutcome,
};
use resq_observability::AppMetrics;
use resq_storage::ExchangeArchive;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct TriageAgent<S>
where
    S: ExchangeArchive,
{
    model: Arc<NaiveBayesModel>,
    archive: Arc<S>,
    metrics: Arc<AppMetrics>,
    sessions: Arc<RwLock<HashMap<String, ConversationSession>>>,
}

impl<S> TriageAgent<S>
where
    S: ExchangeArchive,
{
    pub fn new(model: Arc<NaiveBayesModel>, archive: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            model,
            archive,
            metrics,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn model(&self) -> &NaiveBayesModel {
        &self.model
    }

    #[instrument(skip(self, input))]
    pub async fn submit_message(&self, input: ChatInput) -> Result<TriageOutcome, TriageError> {
        let started = Instant::now();

        if is_blank(&input.text) {
            return Err(TriageError::EmptyMessage);
        }
        self.metrics.inc_message();

        {
            let mut sessions = self.sessions.write();
            let session = sessions
                .entry(input.session_id.clone())
                .or_insert_with(|| ConversationSession::new(input.session_id.clone()));
            if input.owner_id.is_some() {
                session.owner_id = input.owner_id.clone();
            }
            let at = session.next_instant();
            session.append(ConversationMessage::user(input.text.clone(), at))?;
        }

        let intent = match self.model.classify(&input.text) {
            Ok(label) => Intent::parse(&label).unwrap_or(Intent::Fallback),
            Err(TriageError::UntrainedModel) => Intent::Fallback,
            Err(other) => return Err(other),
        };
        if intent == Intent::Fallback {
            self.metrics.inc_fallback();
        }
        let response_text = guidance_for(intent).to_string();

        let (owner_id, responded_at) = {
            let mut sessions = self.sessions.write();
            let session = sessions
                .get_mut(&input.session_id)
                .ok_or_else(|| TriageError::InvalidSession(input.session_id.clone()))?;
            let at = session.next_instant();
            session.append(ConversationMessage::assistant(response_text.clone(), at))?;
            (session.owner_id.clone(), at)
        };

        // The persist task is never awaited on the request path; a detached
        // reaper records its outcome.
        let persist = self.archive.persist_exchange(ExchangeRecord {
            owner_id,
            user_text: input.text.clone(),
            response_text: response_text.clone(),
            at: responded_at,
        });
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            match persist.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    metrics.inc_persistence_failure();
                    warn!(error = %err, "exchange persistence failed");
                }
                Err(err) => {
                    metrics.inc_persistence_failure();
                    warn!(error = %err, "exchange persistence task aborted");
                }
            }
        });

        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %input.session_id,
            intent = intent.as_label(),
            text = %preview(&input.text, 48),
            "message triaged"
        );

        Ok(TriageOutcome {
            response_text,
            intent,
            at: responded_at,
        })
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<ConversationMessage>, TriageError> {
        self.metrics.inc_history_request();
        let sessions = self.sessions.read();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| TriageError::InvalidSession(session_id.to_string()))?;
        Ok(session.history().to_vec())
    }

    pub fn discard_session(&self, session_id: &str) -> Result<(), TriageError> {
        self.sessions
            .write()
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| TriageError::InvalidSession(session_id.to_string()))
    }
}
