pub mod error;
pub mod models;
pub mod registry;
pub mod text;

pub use error::TriageError;
pub use models::*;
pub use registry::{guidance_catalog, guidance_for, FALLBACK_GUIDANCE};
pub use text::{is_blank, preview, tokenize};
