//! Error types for genesim

use thiserror::Error;

/// Result type alias using genesim's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Genesim error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Gene '{0}' not found. Load a gene list first with one of the loader commands.")]
    GeneNotFound(String),

    // Input errors (E100-E199)
    #[error("Required input not found: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Table '{0}' not found in similarity source")]
    TableNotFound(String),

    // Validation errors (E200-E299)
    #[error("Validation failed: {0}")]
    Validation(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Format errors (E800-E899)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Delimited data error: {0}")]
    Csv(#[from] csv::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::GeneNotFound(_) => "E001",
            Self::MissingInput(_) => "E100",
            Self::InvalidInput(_) => "E101",
            Self::TableNotFound(_) => "E102",
            Self::Validation(_) => "E200",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::Json(_) => "E800",
            Self::Csv(_) => "E801",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::GeneNotFound(_) => Some("genesim bulk-create <genes.json> <report.csv>".to_string()),
            Self::MissingInput(_) => Some("Check that the input paths exist".to_string()),
            Self::TableNotFound(name) => Some(format!(
                "Add a '{}' table to the table-file or change `loader.metric`",
                name
            )),
            Self::ConfigError(_) => Some("genesim config list".to_string()),
            Self::DatabaseError(_) if self.is_unique_violation() => Some(
                "Bulk and copy loads expect an empty store and unique gene names in the source".to_string(),
            ),
            _ => None,
        }
    }

    /// Whether this error came from a storage-layer uniqueness violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DatabaseError(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gene_not_found_error() {
        let error = Error::GeneNotFound("YAL001C".to_string());
        assert_eq!(error.code(), "E001");
        assert!(error.suggestion().is_some());
        assert!(error.to_string().contains("YAL001C"));
    }

    #[test]
    fn test_missing_input_error() {
        let error = Error::MissingInput("genes.json".to_string());
        assert_eq!(error.code(), "E100");
        assert!(error.to_string().contains("genes.json"));
    }

    #[test]
    fn test_table_not_found_suggestion() {
        let error = Error::TableNotFound("cosine".to_string());
        assert_eq!(error.code(), "E102");
        assert_eq!(
            error.suggestion(),
            Some("Add a 'cosine' table to the table-file or change `loader.metric`".to_string())
        );
    }

    #[test]
    fn test_validation_error_has_no_suggestion() {
        let error = Error::Validation("score is required".to_string());
        assert_eq!(error.code(), "E200");
        assert_eq!(error.suggestion(), None);
        assert!(!error.is_unique_violation());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<Vec<String>, _> = serde_json::from_str("{not json");
        let error: Error = parse.unwrap_err().into();
        assert_eq!(error.code(), "E800");
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: Error = io.into();
        assert_eq!(error.code(), "E9999");
        assert_eq!(error.to_string(), "gone");
    }
}
