use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorreiosError {
    #[error("Invalid zip code '{value}': {reason}")]
    InvalidZipCode { value: String, reason: String },

    #[error("Invalid tracking code '{code}': {reason}")]
    InvalidTrackingCode { code: String, reason: String },

    #[error("Invalid tax number '{value}': {reason}")]
    InvalidTaxNumber { value: String, reason: String },

    #[error("Invalid package weight {weight}: must be greater than zero")]
    InvalidMinPackageWeight { weight: f64 },

    #[error("Invalid package weight {weight}: service maximum is {max}")]
    InvalidMaxPackageWeight { weight: f64, max: u32 },

    #[error("Invalid package dimensions: {message}")]
    InvalidPackageDimensions { message: String },

    #[error("Invalid {dimension} {value}: minimum is {min}")]
    InvalidMinPackageDimensions {
        dimension: &'static str,
        value: f64,
        min: f64,
    },

    #[error("Invalid {dimension} {value}: maximum is {max}")]
    InvalidMaxPackageDimensions {
        dimension: &'static str,
        value: f64,
        max: f64,
    },

    #[error("Invalid package sequence {index}/{total}")]
    InvalidPackageSequence { index: u32, total: u32 },

    #[error("Invalid declared value {value}: must be between {min} and {max}")]
    InvalidDeclaredValue {
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("Sender and receiver addresses must be different")]
    InvalidAddresses,

    #[error("Posting list error: {message}")]
    PostingList { message: String },

    #[error("Unknown service code {0}")]
    UnknownService(String),

    #[error("Unknown extra service '{0}'")]
    UnknownExtraService(String),

    #[error("Too many tracking codes in one request: {count} (limit {limit})")]
    TrackingCodesLimitExceeded { count: usize, limit: usize },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("SOAP fault: {message}")]
    SoapFault { message: String },

    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse { operation: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML writing error: {message}")]
    XmlWriteError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected input: identifiers, measurements, structural violations.
    Input,
    Transport,
    Configuration,
    Io,
}

impl CorreiosError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CorreiosError::ApiError(_)
            | CorreiosError::SoapFault { .. }
            | CorreiosError::InvalidResponse { .. } => ErrorCategory::Transport,
            CorreiosError::ConfigError { .. }
            | CorreiosError::ConfigValidationError { .. }
            | CorreiosError::InvalidConfigValueError { .. }
            | CorreiosError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CorreiosError::CsvError(_)
            | CorreiosError::IoError(_)
            | CorreiosError::SerializationError(_)
            | CorreiosError::XmlWriteError { .. } => ErrorCategory::Io,
            _ => ErrorCategory::Input,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CorreiosError::TrackingCodesLimitExceeded { .. } => {
                "Split the tracking codes into batches of at most 50"
            }
            CorreiosError::SoapFault { .. } => {
                "Check the credentials, contract and posting card sent to the postal service"
            }
            CorreiosError::MissingConfigError { .. } => {
                "Add the missing section to the TOML configuration file"
            }
            _ => match self.category() {
                ErrorCategory::Input => "Fix the rejected value and try again",
                ErrorCategory::Transport => "Check network access to the postal service endpoints",
                ErrorCategory::Configuration => "Review the TOML configuration file",
                ErrorCategory::Io => "Check that the input files exist and are readable",
            },
        }
    }

    pub(crate) fn tracking_code(code: &str, reason: impl Into<String>) -> Self {
        CorreiosError::InvalidTrackingCode {
            code: code.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn xml_write<E: std::fmt::Display>(error: E) -> Self {
        CorreiosError::XmlWriteError {
            message: error.to_string(),
        }
    }

    pub(crate) fn posting_list(message: impl Into<String>) -> Self {
        CorreiosError::PostingList {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CorreiosError>;
