use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A single document or segment could not be indexed. The rest of the
    /// batch is unaffected.
    #[error("Ingestion failed for document {document}: {reason}")]
    Ingestion { document: usize, reason: String },

    #[error("Embedding dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable { collaborator: &'static str, reason: String },

    #[error("Engine has been shut down")]
    Closed,

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn embedder(reason: impl ToString) -> Self {
        Self::CollaboratorUnavailable { collaborator: "embedding model", reason: reason.to_string() }
    }

    pub fn generator(reason: impl ToString) -> Self {
        Self::CollaboratorUnavailable { collaborator: "generation model", reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
