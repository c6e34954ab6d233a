use semtab_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid dataset layout: {0}")]
    InvalidLayout(String),

    #[error("unsupported {kind}: `{tag}`")]
    UnsupportedFormat { kind: &'static str, tag: String },

    #[error("missing description for table `{0}`")]
    MissingDescription(String),

    #[error("inconsistent dataset: {0}")]
    Inconsistent(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::XlsxError),
}

pub type Result<T, E = DatasetError> = std::result::Result<T, E>;
