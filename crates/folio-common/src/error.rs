//! Error types shared by folio binaries and the content source client.

use miette::Diagnostic;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    #[diagnostic(
        code(config::missing_env),
        help("set {var} in the environment, .env or .env.local")
    )]
    MissingEnv { var: &'static str },

    #[error("invalid value {value:?} for {var}")]
    #[diagnostic(code(config::invalid_value))]
    InvalidValue {
        var: &'static str,
        value: String,
        message: String,
    },

    #[error("invalid URL {url}: {message}")]
    #[diagnostic(code(config::url_parse))]
    UrlParse { url: String, message: String },

    #[error("failed to parse env file {path}: {message}")]
    #[diagnostic(code(config::env_file))]
    EnvFile { path: String, message: String },
}

/// Errors from the remote content source.
///
/// Any of these is a hard failure for the document being loaded. Callers render
/// an "unavailable" state instead of propagating further.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("request to {endpoint} failed")]
    #[diagnostic(code(source::request))]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    #[diagnostic(code(source::status))]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response shape from {endpoint}")]
    #[diagnostic(code(source::decode))]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no published post matches {slug:?}")]
    #[diagnostic(code(source::not_found))]
    NotFound { slug: String },

    #[error("failed to read local export {path}")]
    #[diagnostic(code(source::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    /// Whether the source reported that the requested content does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            SourceError::NotFound { .. } => true,
            SourceError::Status { status, .. } => *status == 404,
            _ => false,
        }
    }
}
