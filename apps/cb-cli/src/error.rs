//! CLI error types and exit codes

use thiserror::Error;

use crate::batch::ApplyReport;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication required
/// - 3: Network error
/// - 4: Validation error
/// - 5: Server error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No remote configured. Run 'cb-cli init' or 'cb-cli remote put' first.")]
    NoRemote,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection failed: {0}\n\nTroubleshooting:\n  - Check your internet connection\n  - Verify the platform URL of the current remote\n  - Try again in a few moments")]
    ConnectionFailed(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("{operation} failed for {asset}: {source}")]
    Remote {
        operation: String,
        asset: String,
        #[source]
        source: Box<CliError>,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Remote upload version {found} does not support {feature} (requires {required})")]
    Unsupported {
        feature: String,
        found: u32,
        required: u32,
    },

    #[error("Plan is blocked by {0} error(s); nothing was applied")]
    PlanBlocked(usize),

    #[error("{} of {} asset(s) failed", .0.failure_count, .0.total)]
    Partial(Box<ApplyReport>),
}

impl CliError {
    /// Wrap a remote error with the operation and asset it belongs to.
    pub fn remote(operation: impl Into<String>, asset: impl Into<String>, source: CliError) -> Self {
        CliError::Remote {
            operation: operation.into(),
            asset: asset.into(),
            source: Box::new(source),
        }
    }

    /// True if this error (or the error it wraps) means the asset does not exist remotely.
    pub fn is_not_found(&self) -> bool {
        match self {
            CliError::NotFound(_) => true,
            CliError::Api { status, .. } => *status == 404,
            CliError::Remote { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::AuthenticationFailed(_) => 2,
            CliError::Network(_) | CliError::ConnectionFailed(_) => 3,
            CliError::Validation(_) => 4,
            CliError::Server(_) => 5,
            CliError::Conflict(_) | CliError::NotFound(_) => 4,
            CliError::Api { status, .. } => {
                if *status >= 500 {
                    5
                } else if *status == 401 || *status == 403 {
                    2
                } else {
                    4
                }
            }
            CliError::Remote { source, .. } => source.exit_code(),
            CliError::DataIntegrity(_) | CliError::PlanBlocked(_) => 4,
            CliError::Unsupported { .. } => 4,
            CliError::NoRemote
            | CliError::Io(_)
            | CliError::Config(_)
            | CliError::InputError(_)
            | CliError::Archive(_)
            | CliError::Partial(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let CliError::Partial(report) = self {
            for item in report.failed_items() {
                eprintln!(
                    "  - {} {}: {}",
                    item.kind,
                    item.name,
                    item.error.as_deref().unwrap_or("unknown error")
                );
            }
            for message in &report.unattributed {
                eprintln!("  - {message}");
            }
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::NoRemote => Some("Run 'cb-cli remote list' to see configured remotes."),
            CliError::ConnectionFailed(_) => Some("Check your network connection and try again."),
            CliError::AuthenticationFailed(_) => {
                Some("Refresh the dev token with 'cb-cli remote put' and try again.")
            }
            CliError::PlanBlocked(_) => Some("Fix the errors listed in the plan and push again."),
            CliError::Unsupported { .. } => {
                Some("Upgrade the platform or restrict the push to code services and libraries.")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            CliError::ConnectionFailed(e.to_string())
        } else if e.is_timeout() {
            CliError::Network("Request timed out".to_string())
        } else {
            CliError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Validation(format!("JSON error: {}", e))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Config(format!("YAML error: {}", e))
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(e: dialoguer::Error) -> Self {
        CliError::InputError(format!("Dialog error: {}", e))
    }
}

impl From<zip::result::ZipError> for CliError {
    fn from(e: zip::result::ZipError) -> Self {
        CliError::Archive(e.to_string())
    }
}

impl From<walkdir::Error> for CliError {
    fn from(e: walkdir::Error) -> Self {
        CliError::Io(format!("Directory walk failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_network_error() {
        assert_eq!(CliError::Network("test".to_string()).exit_code(), 3);
    }

    #[test]
    fn test_exit_code_validation_error() {
        assert_eq!(CliError::Validation("test".to_string()).exit_code(), 4);
    }

    #[test]
    fn test_exit_code_api_error_5xx() {
        assert_eq!(
            CliError::Api {
                status: 500,
                message: "test".to_string()
            }
            .exit_code(),
            5
        );
    }

    #[test]
    fn test_exit_code_api_error_401() {
        assert_eq!(
            CliError::Api {
                status: 401,
                message: "test".to_string()
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn test_remote_wraps_operation_and_asset() {
        let err = CliError::remote(
            "update service",
            "sayHello",
            CliError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            },
        );
        let text = err.to_string();
        assert!(text.contains("update service"));
        assert!(text.contains("sayHello"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_is_not_found_through_wrapper() {
        let err = CliError::remote("get role", "admin", CliError::NotFound("role".into()));
        assert!(err.is_not_found());
        assert!(!CliError::Conflict("x".into()).is_not_found());
    }

    #[test]
    fn test_plan_blocked_exit_code() {
        assert_eq!(CliError::PlanBlocked(2).exit_code(), 4);
        assert!(CliError::PlanBlocked(2).to_string().contains("2 error(s)"));
    }
}
