use thiserror::Error;

/// Errors from the foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A user-provided serializer rejected a key or value. Surfaced to the
    /// caller untranslated.
    #[error("serialization error: {0}")]
    Serialization(String),
}
