use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can make a scenario fail before or besides an assertion.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("invalid configuration value for {key}: {message}")]
    Config { key: String, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body {body:?}: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected status {expected}, got {actual} with body {body:?}")]
    UnexpectedStatus {
        expected: StatusCode,
        actual: StatusCode,
        body: String,
    },

    #[error("prerequisite not met: {0}")]
    Prerequisite(String),

    #[error("failed to start the stub Products API: {0}")]
    Stub(#[from] std::io::Error),
}

/// Failures of the stub's product store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Product with id {0} did not exist")]
    NotFound(i32),

    #[error("{0}")]
    Invalid(String),

    #[error("product store unavailable: {0}")]
    Unavailable(String),
}
