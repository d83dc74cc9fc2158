use crate::domain::model::DataType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Resource '{resource}' not found in dataset '{dataset}'")]
    ResourceNotFound { dataset: String, resource: String },

    #[error("No rows were classified as {data_type}; cannot generate output for it")]
    EmptyDataType { data_type: DataType },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

impl EtlError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) => format!("Could not reach the data source: {}", e),
            EtlError::CsvError(e) => format!("The source CSV could not be processed: {}", e),
            EtlError::IoError(e) => format!("File operation failed: {}", e),
            EtlError::SerializationError(e) => format!("Metadata could not be parsed: {}", e),
            EtlError::ConfigValidationError { field, message } => {
                format!("Configuration problem ({}): {}", field, message)
            }
            EtlError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid value for {}: {}", value, field, reason)
            }
            EtlError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            EtlError::ResourceNotFound { dataset, resource } => {
                format!("Dataset '{}' has no resource named '{}'", dataset, resource)
            }
            EtlError::EmptyDataType { data_type } => {
                format!("The source contained no rows classified as {}", data_type)
            }
            EtlError::ProcessingError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check network connectivity and the source base URL",
            EtlError::CsvError(_) => "Verify the source resource still has the expected layout",
            EtlError::IoError(_) => "Check the output path exists and is writable",
            EtlError::SerializationError(_) => "The remote metadata format may have changed",
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration file and re-run",
            EtlError::ResourceNotFound { .. } => {
                "Update source.resource to match a resource name in the dataset"
            }
            EtlError::EmptyDataType { .. } => {
                "Check the Population Type column against the known population group codes"
            }
            EtlError::ProcessingError { .. } => "Inspect the logs for the failing row or column",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
