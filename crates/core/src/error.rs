use docfill_docx::DocxError;
use docfill_registry::LookupError;
use docfill_types::IdentifierError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("company lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("document error: {0}")]
    Document(#[from] DocxError),
    #[error("failed to read configuration {}: {reason}", .path.display())]
    ConfigRead {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("failed to deserialize YAML configuration: {0}")]
    ConfigDeserialization(serde_yaml::Error),
}

impl From<IdentifierError> for ReportError {
    fn from(error: IdentifierError) -> Self {
        ReportError::InvalidInput(error.to_string())
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
