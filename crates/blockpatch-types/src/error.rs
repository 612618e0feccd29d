use thiserror::Error;

/// Errors produced when decoding documents or patch sets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid patch set: {0}")]
    InvalidPatch(String),
}
