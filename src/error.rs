use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load {path}: {details}")]
    DataLoad { path: String, details: String },

    #[error("No customer matched an account record; the joined dataset is empty")]
    EmptyDataset,

    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InsightsError {
    pub fn data_load(path: impl AsRef<std::path::Path>, details: impl ToString) -> Self {
        InsightsError::DataLoad {
            path: path.as_ref().display().to_string(),
            details: details.to_string(),
        }
    }

    /// Missing credentials are reported separately from transport failures.
    pub fn is_configuration(&self) -> bool {
        matches!(self, InsightsError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
