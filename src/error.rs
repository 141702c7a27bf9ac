use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Failed to parse {field}: '{value}'")]
    Parse { field: String, value: String },

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl MetricsError {
    pub fn parse(field: &str, value: &str) -> Self {
        MetricsError::Parse {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for MetricsError {
    fn from(err: serde_json::Error) -> Self {
        MetricsError::Json(err.to_string())
    }
}

impl From<std::io::Error> for MetricsError {
    fn from(err: std::io::Error) -> Self {
        MetricsError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
