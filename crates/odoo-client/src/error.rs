//! Client error types.

use odoo_proto::{Fault, Value};
use thiserror::Error;

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL does not parse.
    #[error("invalid server URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Only `http` and `https` are supported.
    #[error("unsupported URL scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    /// The base URL has no host component.
    #[error("server URL {0:?} has no host")]
    MissingHost(String),

    /// A required environment variable is unset.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The port override is not a valid port number.
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// A single remote invocation failed below the application level.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or request failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not a valid XML-RPC response.
    #[error("protocol error: {0}")]
    Protocol(#[from] odoo_proto::Error),

    /// The server reported an XML-RPC fault.
    #[error("remote {0}")]
    Fault(Fault),
}

impl TransportError {
    /// The remote fault, if this error carries one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            TransportError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Authentication failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server accepted the call but returned no usable user id.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The authentication call itself failed.
    #[error("authentication failed: {0}")]
    TransportFailure(#[from] TransportError),
}

/// A response did not have the shape the caller expected.
#[derive(Debug, Error)]
#[error("cannot decode {context}: {message}")]
pub struct DecodeError {
    /// What was being decoded.
    pub context: String,
    /// Why it failed.
    pub message: String,
}

impl DecodeError {
    /// Create a decode error.
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }

    /// A value of the wrong variant was received.
    pub fn unexpected(context: impl Into<String>, expected: &str, found: &Value) -> Self {
        Self::new(context, format!("expected {}, found {}", expected, found.kind()))
    }
}

/// A model-level call failed after authentication.
#[derive(Debug, Error)]
pub enum CallError {
    /// No session: `connect` has not succeeded yet.
    #[error("not connected: authenticate before issuing model calls")]
    NotConnected,

    /// The authenticated user may not read the model.
    #[error("access denied on {model}: {message}")]
    AccessDenied { model: String, message: String },

    /// The call failed in transport or with a non-access fault.
    #[error("{model}.{method} failed: {source}")]
    Transport {
        model: String,
        method: String,
        #[source]
        source: TransportError,
    },

    /// The response had an unexpected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A paginated read never returned an empty page.
    #[error("{model} still returned records after {pages} pages")]
    PageLimitExceeded { model: String, pages: usize },
}

impl CallError {
    /// Classify a transport failure of `model.method`.
    pub fn from_transport(model: &str, method: &str, source: TransportError) -> Self {
        match source {
            TransportError::Fault(fault) if fault.is_access_denied() => CallError::AccessDenied {
                model: model.to_string(),
                message: fault.message,
            },
            source => CallError::Transport {
                model: model.to_string(),
                method: method.to_string(),
                source,
            },
        }
    }

    /// Whether this failure is a permissions problem.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, CallError::AccessDenied { .. })
    }
}

/// Any client error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP transport could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A model call failed.
    #[error(transparent)]
    Call(#[from] CallError),
}
