//! Shared base error type.
//!
//! Sub-crates define their own error enums and either convert into
//! `CoreError` via `From` impls or wrap it as one variant.  Only
//! configuration-class errors propagate to the driver; everything else is
//! recovered locally.

use thiserror::Error;

use crate::{ResponderId, VertexId};

/// The base error type shared across `evac-*` crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    #[error("responder {0} not found")]
    ResponderNotFound(ResponderId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `evac-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
