use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the sync job
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(calnotion::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calnotion::config))]
    Config(String),

    #[error("Credential error: {0}")]
    #[diagnostic(code(calnotion::credentials))]
    Credentials(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(calnotion::google_calendar))]
    GoogleCalendar(String),

    #[error("Notion API error: {0}")]
    #[diagnostic(code(calnotion::notion))]
    Notion(String),

    #[error("Notion API error: HTTP {status} - {body}")]
    #[diagnostic(code(calnotion::notion_status))]
    NotionStatus { status: u16, body: String },

    #[error("Malformed event: {0}")]
    #[diagnostic(code(calnotion::normalize))]
    Normalize(String),

    #[error("HTTP transport error: {0}")]
    #[diagnostic(code(calnotion::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(calnotion::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calnotion::serialization))]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether the failed operation is worth another attempt. Mutations are
    /// keyed by external id, so retrying a transient failure is safe.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::NotionStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create credential errors
pub fn credential_error(message: &str) -> Error {
    Error::Credentials(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create Notion errors
pub fn notion_error(message: &str) -> Error {
    Error::Notion(message.to_string())
}

/// Helper to create normalization errors
pub fn normalize_error(message: &str) -> Error {
    Error::Normalize(message.to_string())
}
