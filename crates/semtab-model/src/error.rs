use thiserror::Error;

/// Errors raised while decoding or validating model records.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown {kind} version: {version}")]
    UnknownVersion { kind: &'static str, version: String },

    #[error("matrix is not rectangular")]
    NotRectangular,

    #[error("shape mismatch: {what} is {actual:?} but table is {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("column {index} has {actual} rows, expected {expected}")]
    RaggedColumn {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("no column with index {0}")]
    MissingColumn(usize),

    #[error("row index {index} out of range for table with {nrows} rows")]
    RowOutOfRange { index: usize, nrows: usize },

    #[error("semantic model references unknown node id {0}")]
    DanglingNode(usize),

    #[error("unknown prefix `{0}`")]
    UnknownPrefix(String),

    #[error("uri `{0}` does not belong to any registered namespace")]
    UnknownNamespace(String),

    #[error("unknown knowledge graph `{0}`")]
    UnknownKg(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
