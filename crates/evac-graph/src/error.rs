//! Graph and config error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("edge `{edge}` references unknown vertex `{vertex}`")]
    UnknownEndpoint { edge: String, vertex: String },

    #[error("duplicate vertex id `{0}`")]
    DuplicateVertex(String),

    #[error("building has no vertices")]
    EmptyGraph,

    #[error("building has no exit-kind vertex")]
    NoExits,

    #[error("unknown vertex `{0}`")]
    UnknownVertex(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
