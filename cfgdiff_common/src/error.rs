use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfgDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error while loading {format} content from {label}: {message}")]
    Parse {
        format: String,
        label: String,
        message: String,
    },

    /// Type or length mismatch inside a tree comparison
    #[error("Structural mismatch at {path}: {message}")]
    Structure { path: String, message: String },

    #[error("Path error: {0}")]
    Path(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Service not supported: {0}")]
    UnknownService(String),
}

impl CfgDiffError {
    pub fn parse(format: impl Into<String>, label: impl Into<String>, message: impl ToString) -> Self {
        CfgDiffError::Parse {
            format: format.into(),
            label: label.into(),
            message: message.to_string(),
        }
    }

    pub fn structure(path: &str, message: impl Into<String>) -> Self {
        let path = if path.is_empty() { "<root>" } else { path };
        CfgDiffError::Structure {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Parse errors are recoverable by falling back to the line comparator
    pub fn is_parse(&self) -> bool {
        matches!(self, CfgDiffError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, CfgDiffError>;
