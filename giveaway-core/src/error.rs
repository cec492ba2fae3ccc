use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No prize keys remaining")]
    KeysExhausted,
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Submission not found: {submission_id}")]
    SubmissionNotFound { submission_id: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Request rejected by Reddit: {details}")]
    Rejected { details: String },
}

/// Fatal failures reading or writing the run's backing resources. The run
/// exits non-zero on any of these; the poll loop never continues past a
/// resource it cannot trust.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Could not open the key file {path}: {source}")]
    KeyFileUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not write the key file {path}: {source}")]
    KeyFileUnwritable {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not open the banned-user list {path}: {source}")]
    BanListUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not read the session file {path}: {source}")]
    SessionUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Could not write the session file {path}: {source}")]
    SessionUnwritable {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed session file {path}: {details}")]
    SessionMalformed { path: String, details: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Missing value for template placeholder {{{name}}}")]
    MissingValue { name: String },

    #[error("Unbalanced braces in template")]
    UnbalancedBraces,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Randomized mode requires a wait time")]
    WaitRequired,
}
