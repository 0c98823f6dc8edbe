use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("message text is empty")]
    EmptyMessage,

    #[error("classifier has no trained labels")]
    UntrainedModel,

    #[error("message at {offered} does not follow the last message at {last}")]
    OutOfOrderMessage {
        last: DateTime<Utc>,
        offered: DateTime<Utc>,
    },

    #[error("unknown session: {0}")]
    InvalidSession(String),
}
