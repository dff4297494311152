use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiStatusError { status: u16, message: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

}

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Database,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::ApiStatusError { .. } => ErrorCategory::Network,
            EtlError::DatabaseError(_) => ErrorCategory::Database,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    /// Severity drives the CLI exit code: transient failures are `Medium`,
    /// anything that needs an operator is `Critical`.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ApiError(e) if e.is_timeout() || e.is_connect() => ErrorSeverity::Medium,
            EtlError::ApiError(_) => ErrorSeverity::High,
            EtlError::ApiStatusError { status, .. } if self.is_transient_status(*status) => {
                ErrorSeverity::Medium
            }
            EtlError::ApiStatusError { status: 401 | 403, .. } => ErrorSeverity::Critical,
            EtlError::ApiStatusError { .. } => ErrorSeverity::High,
            EtlError::DatabaseError(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => {
                ErrorSeverity::Medium
            }
            EtlError::DatabaseError(_) => ErrorSeverity::High,
            EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EtlError::ApiStatusError { status, .. } => self.is_transient_status(*status),
            _ => false,
        }
    }

    fn is_transient_status(&self, status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity to the CoinMarketCap API and try again".to_string()
            }
            EtlError::ApiStatusError { status: 401 | 403, .. } => {
                "Verify that COINMARKETCAP_API_KEY is valid and has access to this endpoint"
                    .to_string()
            }
            EtlError::ApiStatusError { status: 429, .. } => {
                "API rate limit reached; wait before triggering the job again".to_string()
            }
            EtlError::ApiStatusError { .. } => {
                "Check the API endpoint and request parameters".to_string()
            }
            EtlError::DatabaseError(_) => {
                "Check that PostgreSQL is reachable and the DB_* settings are correct".to_string()
            }
            EtlError::IoError(_) => "Check file paths and permissions".to_string(),
            EtlError::SerializationError(_) => {
                "The API response format may have changed; inspect the raw response".to_string()
            }
            EtlError::ConfigError { .. } | EtlError::ConfigValidationError { .. } => {
                "Review the configuration file and environment variables".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Set {} in the environment or configuration file", field)
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of {}", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch cryptocurrency data: {}", self),
            ErrorCategory::Database => format!("Could not store cryptocurrency data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Process exit code for the one-shot CLI run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_status_classification() {
        let rate_limited = EtlError::ApiStatusError {
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        assert_eq!(rate_limited.category(), ErrorCategory::Network);
        assert_eq!(rate_limited.severity(), ErrorSeverity::Medium);
        assert!(rate_limited.is_retryable());
        assert_eq!(rate_limited.exit_code(), 2);

        let unauthorized = EtlError::ApiStatusError {
            status: 401,
            message: "API key missing".to_string(),
        };
        assert_eq!(unauthorized.severity(), ErrorSeverity::Critical);
        assert!(!unauthorized.is_retryable());
        assert!(unauthorized
            .recovery_suggestion()
            .contains("COINMARKETCAP_API_KEY"));

        let bad_request = EtlError::ApiStatusError {
            status: 400,
            message: "invalid limit".to_string(),
        };
        assert_eq!(bad_request.severity(), ErrorSeverity::High);
        assert!(!bad_request.is_retryable());
        assert_eq!(bad_request.exit_code(), 1);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = EtlError::MissingConfigError {
            field: "DB_PASSWORD".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 3);
        assert!(err.recovery_suggestion().contains("DB_PASSWORD"));
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_database_error_category() {
        let err = EtlError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert_eq!(err.category(), ErrorCategory::Database);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(!err.is_retryable());
    }
}
