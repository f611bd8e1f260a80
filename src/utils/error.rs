use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarktError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template rendering error: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid ISO week {week} for year {year}")]
    InvalidWeek { year: i32, week: i64 },

    #[error("Malformed persisted state in {location}: {message}")]
    MalformedPersistedState { location: String, message: String },

    #[error("Could not persist activations to {location}: {message}")]
    PersistenceWriteFailure { location: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Calendar,
    Persistence,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarktError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarktError::ConfigError { .. }
            | MarktError::ConfigValidationError { .. }
            | MarktError::InvalidConfigValueError { .. }
            | MarktError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MarktError::InvalidWeek { .. } => ErrorCategory::Calendar,
            MarktError::IoError(_)
            | MarktError::SerializationError(_)
            | MarktError::MalformedPersistedState { .. }
            | MarktError::PersistenceWriteFailure { .. } => ErrorCategory::Persistence,
            MarktError::TemplateError(_) => ErrorCategory::Rendering,
        }
    }

    /// 請求層級的錯誤都會被就地恢復，只有配置與渲染錯誤會中斷流程
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MarktError::InvalidWeek { .. } => ErrorSeverity::Low,
            MarktError::MalformedPersistedState { .. } => ErrorSeverity::Medium,
            MarktError::IoError(_)
            | MarktError::SerializationError(_)
            | MarktError::PersistenceWriteFailure { .. } => ErrorSeverity::High,
            MarktError::ConfigError { .. }
            | MarktError::ConfigValidationError { .. }
            | MarktError::InvalidConfigValueError { .. }
            | MarktError::MissingConfigError { .. }
            | MarktError::TemplateError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarktError::ConfigError { message } => format!("Configuration problem: {}", message),
            MarktError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            MarktError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid value for '{}' ({})", value, field, reason)
            }
            MarktError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            MarktError::InvalidWeek { year, week } => {
                format!("Week {} does not exist in {}", week, year)
            }
            MarktError::MalformedPersistedState { location, .. } => {
                format!("Stored activations in {} could not be read", location)
            }
            MarktError::PersistenceWriteFailure { location, .. } => {
                format!("Activations could not be saved to {}", location)
            }
            MarktError::IoError(e) => format!("File system error: {}", e),
            MarktError::SerializationError(e) => format!("Data format error: {}", e),
            MarktError::TemplateError(_) => "The page could not be rendered".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML configuration file and the referenced environment variables"
            }
            ErrorCategory::Calendar => "Use a week number between 1 and 53",
            ErrorCategory::Persistence => {
                "Check that the storage path exists and is writable by the server process"
            }
            ErrorCategory::Rendering => "Check the page template for errors",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarktError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_level_errors_are_low_severity() {
        let err = MarktError::InvalidWeek { year: 2021, week: 53 };
        assert_eq!(err.category(), ErrorCategory::Calendar);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "Week 53 does not exist in 2021");
    }

    #[test]
    fn config_errors_are_critical() {
        let err = MarktError::MissingConfigError {
            field: "vendors".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("TOML"));
    }
}
