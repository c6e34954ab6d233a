use semtab_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("class node {node} has {count} subject edges, expected at most one")]
    MultipleSubjectEdges { node: usize, count: usize },

    #[error("example {index} has neither a true label nor a prediction")]
    MissingPrediction { index: usize },

    #[error("inconsistent input: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T, E = EvalError> = std::result::Result<T, E>;
