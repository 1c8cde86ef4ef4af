/// Shared error type used across all sqlagent crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider {
        provider: String,
        message: String,
        /// HTTP status returned by the provider, when there was one.
        status: Option<u16>,
    },

    /// Missing or invalid configuration. Fatal at startup.
    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    /// The database could not be reached or refused the credentials.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// The database rejected the statement.
    #[error("query failed: {0}")]
    Query(String),

    /// Schema introspection failed; the turn cannot be grounded.
    #[error("schema introspection failed: {0}")]
    Schema(String),

    /// A tool call could not be completed (bad arguments, rejected SQL,
    /// or a wrapped connection/query failure).
    #[error("tool {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a failed model invocation is worth another attempt.
    ///
    /// Timeouts and transport errors are transient, as are HTTP 429 and 5xx
    /// responses. Client errors (bad request, bad key) are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Http(_) => true,
            Error::Provider { status, .. } => {
                matches!(status, Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
