use std::io;
use thiserror::Error;

/// Rejection reasons for a repository URL, checked before anything is sent
/// to the backend.
///
/// # Examples
///
/// ```
/// use docugen_core::validator::validate;
/// use docugen_core::ValidationError;
///
/// assert_eq!(validate("   "), Err(ValidationError::EmptyUrl));
/// assert_eq!(
///     validate("https://github.com/../etc/passwd"),
///     Err(ValidationError::PathTraversal)
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a repository URL")]
    EmptyUrl,

    #[error("Dangerous protocol detected in URL")]
    DangerousProtocol,

    #[error("Path traversal sequences are not allowed")]
    PathTraversal,

    #[error("Embedded credentials are not allowed")]
    EmbeddedCredentials,

    #[error("URL contains an unexpected double slash")]
    DoubleSlash,

    #[error("URL is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Please enter a real repository URL, not the placeholder")]
    PlaceholderUrl,

    #[error("Invalid repository URL")]
    InvalidUrl,

    #[error("Unsupported URL protocol: {0}")]
    UnsupportedProtocol(String),
}

/// Failures of a single backend request.
///
/// `Request` carries the message extracted from the backend's structured
/// error payload (or a per-operation fallback). The task endpoints do not
/// expose a payload, so they get a dedicated variant each.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to start analysis (HTTP {status})")]
    StartFailed { status: u16 },

    #[error("Failed to check status (HTTP {status})")]
    StatusCheckFailed { status: u16 },

    #[error("Failed to get results (HTTP {status})")]
    ResultFetchFailed { status: u16 },
}

/// Terminal failures of a polled analysis.
///
/// The `Display` output is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Failed to start analysis")]
    StartFailed(#[source] ApiError),

    #[error("{0}")]
    TaskFailed(String),

    #[error("Connection Lost")]
    ConnectionLost(#[source] ApiError),

    #[error("Failed to get results")]
    ResultFetchFailed(#[source] ApiError),

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Errors raised while writing generated documents to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No documentation generated yet.")]
    NothingToExport,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
