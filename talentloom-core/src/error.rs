//! Error types for TalentLoom operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a remote service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Transient,
    Unknown,
}

/// Errors returned by the remote service facade.
///
/// Cloneable and comparable so the same failure can be stored in a cache
/// entry and handed to every waiter of a shared fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Transient failure in {operation}: {reason}")]
    Transient { operation: String, reason: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl ServiceError {
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn transient(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transient {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Transient { .. } => ErrorKind::Transient,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Transient failures are the only ones a later attempt may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::unknown(format!("payload codec: {}", err))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => {
                Self::validation(field, "required field missing")
            }
            ValidationError::InvalidValue { field, reason } => Self::validation(field, reason),
        }
    }
}

/// Input validation errors raised before a write reaches a service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or TALENTLOOM_CONFIG)")]
    MissingConfigPath,

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all TalentLoom errors.
#[derive(Debug, Clone, Error)]
pub enum TalentloomError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for facade calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for TalentLoom operations.
pub type TalentloomResult<T> = Result<T, TalentloomError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display_not_found() {
        let err = ServiceError::not_found("PipelineItem", "p9");
        let msg = format!("{}", err);
        assert!(msg.contains("PipelineItem"));
        assert!(msg.contains("p9"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ServiceError::transient("jobs.list", "flaky").is_retryable());
        assert!(!ServiceError::unknown("boom").is_retryable());
        assert!(!ServiceError::validation("title", "empty").is_retryable());
    }

    #[test]
    fn test_validation_error_converts_to_service_error() {
        let err: ServiceError = ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_master_error_from_variants() {
        let service = TalentloomError::from(ServiceError::unknown("x"));
        assert!(matches!(service, TalentloomError::Service(_)));

        let config = TalentloomError::from(ConfigError::MissingConfigPath);
        assert!(matches!(config, TalentloomError::Config(_)));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "realtime.tick_interval_ms".to_string(),
            reason: "must be > 0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("realtime.tick_interval_ms"));
        assert!(msg.contains("must be > 0"));
    }
}
