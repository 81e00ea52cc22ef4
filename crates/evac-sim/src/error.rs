use evac_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("fire origin `{0}` does not name a vertex")]
    UnknownFireOrigin(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type SimResult<T> = Result<T, SimError>;
