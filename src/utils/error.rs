use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplaceError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: String, state: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("No faculty available: {message}")]
    NoCandidates { message: String },

    #[error("No rearrangement possible: {message}")]
    NoOptions { message: String },

    #[error("Not allowed: {message}")]
    NotAllowed { message: String },

    #[error("Stale state: {message}")]
    StaleState { message: String },

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid server response: {message}")]
    ProtocolError { message: String },
}

/// 錯誤分類，用於決定提示給操作員的訊息類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    NoCandidates,
    NoOptions,
    NotAllowed,
    StaleState,
    Network,
    Server,
    Protocol,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorCategory {
    /// 同一分類的嚴重度固定，存下來的失敗摘要也能決定退出碼
    pub fn severity(self) -> ErrorSeverity {
        match self {
            Self::NoCandidates | Self::NoOptions => ErrorSeverity::Low,
            Self::Network | Self::StaleState | Self::Server => ErrorSeverity::Medium,
            Self::Validation | Self::NotFound | Self::NotAllowed | Self::Protocol => {
                ErrorSeverity::High
            }
            Self::Configuration | Self::System => ErrorSeverity::Critical,
        }
    }
}

impl ReplaceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NetworkError(e) if e.is_decode() => ErrorCategory::Protocol,
            Self::NetworkError(_) => ErrorCategory::Network,
            Self::IoError(_) => ErrorCategory::System,
            Self::ProtocolError { .. } => ErrorCategory::Protocol,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } | Self::InvalidTransition { .. } => {
                ErrorCategory::Validation
            }
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::NoCandidates { .. } => ErrorCategory::NoCandidates,
            Self::NoOptions { .. } => ErrorCategory::NoOptions,
            Self::NotAllowed { .. } => ErrorCategory::NotAllowed,
            Self::StaleState { .. } => ErrorCategory::StaleState,
            Self::ServerError { .. } => ErrorCategory::Server,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.category().severity()
    }

    /// 給操作員看的訊息（不含內部細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NetworkError(e) if e.is_timeout() => {
                "The server did not respond in time.".to_string()
            }
            Self::NetworkError(_) => "Network error. Please try again.".to_string(),
            Self::IoError(e) => format!("Could not access a local file: {}", e),
            Self::ProtocolError { .. } => {
                "The server sent a response this client does not understand.".to_string()
            }
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            Self::ValidationError { message } => message.clone(),
            Self::InvalidTransition { action, state } => {
                format!("Cannot {} while {}", action, state)
            }
            Self::NotFound { message }
            | Self::NoCandidates { message }
            | Self::NoOptions { message }
            | Self::NotAllowed { message }
            | Self::StaleState { message } => message.clone(),
            Self::ServerError { status, message } => {
                format!("The server failed ({}): {}", status, message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Fill in date, day, branch, semester, class and time slot, then pick exactly one candidate or option",
            ErrorCategory::NotFound => "Check the branch, semester and class; the class or faculty does not exist on the server",
            ErrorCategory::NoCandidates => "Nobody is free in this slot; try the rearrangement options instead",
            ErrorCategory::NoOptions => "No rearrangement exists for this slot; try a direct replacement or another slot",
            ErrorCategory::NotAllowed => "Pick a different faculty member who is allowed to teach this class",
            ErrorCategory::StaleState => "The schedule changed since the list was fetched; fetch candidates or options again before retrying",
            ErrorCategory::Network => "Check the connection to the server and retry",
            ErrorCategory::Server => "Retry later or contact the timetable administrator",
            ErrorCategory::Protocol => "Check that the client and server versions match",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::System => "Check file permissions and paths",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_state_suggests_refetch() {
        let err = ReplaceError::StaleState {
            message: "Faculty is no longer available".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::StaleState);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("fetch candidates or options again"));
        assert_eq!(err.user_friendly_message(), "Faculty is no longer available");
    }

    #[test]
    fn test_transition_errors_are_validation() {
        let err = ReplaceError::InvalidTransition {
            action: "execute".to_string(),
            state: "idle".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.to_string(), "Cannot execute while idle");
    }

    #[test]
    fn test_empty_results_are_low_severity() {
        let err = ReplaceError::NoOptions {
            message: "none".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(ErrorSeverity::Low < ErrorSeverity::Critical);
    }
}
