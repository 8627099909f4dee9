//! Configuration validation errors and semantic validation.

use nt_redact::RuleSpec;
use thiserror::Error;

use crate::settings::NotifierSettings;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate notifier settings semantically.
pub fn validate_settings(settings: &NotifierSettings) -> ValidationResult<()> {
    if settings.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: settings.schema_version.clone(),
        });
    }

    if settings.environment_name.trim().is_empty() {
        return Err(ValidationError::MissingField("environment_name".to_string()));
    }

    if settings.notifier.name.trim().is_empty() {
        return Err(ValidationError::MissingField("notifier.name".to_string()));
    }
    if settings.notifier.version.trim().is_empty() {
        return Err(ValidationError::MissingField("notifier.version".to_string()));
    }

    if let Some(ref key) = settings.api_key {
        if key.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "api_key".to_string(),
                message: "Must not be blank when set".to_string(),
            });
        }
    }

    validate_rules("params_filters", &settings.params_filters)?;
    validate_rules("params_whitelist_filters", &settings.params_whitelist_filters)?;
    validate_rules("ignore_user_agent", &settings.ignore_user_agent)?;

    if settings.ignore.iter().any(|class| class.trim().is_empty()) {
        return Err(ValidationError::InvalidValue {
            field: "ignore".to_string(),
            message: "Class names must not be blank".to_string(),
        });
    }

    Ok(())
}

/// Check that every rule in a list compiles.
fn validate_rules(field: &str, specs: &[RuleSpec]) -> ValidationResult<()> {
    for (idx, spec) in specs.iter().enumerate() {
        spec.compile().map_err(|e| ValidationError::InvalidValue {
            field: format!("{}[{}]", field, idx),
            message: e.to_string(),
        })?;
    }
    Ok(())
}
