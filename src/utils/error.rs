use thiserror::Error;

#[derive(Error, Debug)]
pub enum KitError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("GitHub request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    RegexError(#[from] regex::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Directory walk failed: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {field}")]
    MissingConfigError { field: String },

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("git failed: {message}")]
    GitError { message: String },

    #[error("GitHub API returned HTTP {status} for {url}")]
    GitHubApiError { status: u16, url: String },

    #[error("GitHub API rate limit reached")]
    RateLimited,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Aborted by user")]
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Network,
    Configuration,
    Git,
    Validation,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl KitError {
    pub fn config(message: impl Into<String>) -> Self {
        KitError::ConfigError {
            message: message.into(),
        }
    }

    pub fn not_found(path: impl std::fmt::Display) -> Self {
        KitError::NotFound {
            path: path.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            KitError::IoError(_) | KitError::WalkError(_) | KitError::NotFound { .. } => {
                ErrorCategory::Io
            }
            KitError::HttpError(_)
            | KitError::GitHubApiError { .. }
            | KitError::RateLimited => ErrorCategory::Network,
            KitError::TomlError(_)
            | KitError::ConfigError { .. }
            | KitError::InvalidConfigValueError { .. }
            | KitError::MissingConfigError { .. } => ErrorCategory::Configuration,
            KitError::GitError { .. } => ErrorCategory::Git,
            KitError::SerializationError(_)
            | KitError::RegexError(_)
            | KitError::CsvError(_)
            | KitError::ValidationError { .. } => ErrorCategory::Validation,
            KitError::Aborted => ErrorCategory::User,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KitError::Aborted => ErrorSeverity::Low,
            KitError::HttpError(_) | KitError::RateLimited | KitError::GitHubApiError { .. } => {
                ErrorSeverity::Medium
            }
            KitError::IoError(_) | KitError::WalkError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Io => {
                "Check that the path exists and is readable from the repository root".to_string()
            }
            ErrorCategory::Network => match self {
                KitError::RateLimited => {
                    "Set GITHUB_TOKEN (or GH_TOKEN) for 5,000 requests/hour instead of 60".to_string()
                }
                _ => "Check network access to the GitHub API, or retry with --offline".to_string(),
            },
            ErrorCategory::Configuration => {
                "Review repokit.toml and the command-line flags".to_string()
            }
            ErrorCategory::Git => {
                "Make sure git is installed and the command runs inside a repository".to_string()
            }
            ErrorCategory::Validation => "Fix the reported input and run again".to_string(),
            ErrorCategory::User => "Re-run the command and confirm the prompt".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            KitError::NotFound { path } => format!("{} does not exist", path),
            KitError::RateLimited => {
                "GitHub API rate limit reached (60 requests/hour unauthenticated)".to_string()
            }
            KitError::Aborted => "Aborted.".to_string(),
            other => other.to_string(),
        }
    }

    /// Process exit code for a command that failed with this error.
    pub fn exit_code(&self) -> u8 {
        match self.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, KitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_network_medium() {
        let err = KitError::RateLimited;
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);
        assert!(err.recovery_suggestion().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = KitError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_config_errors_exit_one() {
        let err = KitError::InvalidConfigValueError {
            field: "github.api_base".to_string(),
            value: "ftp://x".to_string(),
            reason: "Unsupported URL scheme: ftp".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("github.api_base"));
    }

    #[test]
    fn test_aborted_is_user_low() {
        let err = KitError::Aborted;
        assert_eq!(err.category(), ErrorCategory::User);
        assert_eq!(err.user_friendly_message(), "Aborted.");
        // declining a prompt still fails the command
        assert_eq!(err.exit_code(), 1);
    }
}
