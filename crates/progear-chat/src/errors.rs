/// Fallback message used when a failed response carries no `detail`.
pub const GENERIC_REQUEST_FAILURE: &str = "Request failed";

/// Errors returned by a `Transport` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be built (bad URL, bad header, etc.).
    #[error("failed to build request: {0}")]
    Build(String),
    /// The request could not be sent or no response arrived.
    #[error("request failed: {0}")]
    Connect(String),
    /// Reading the response body failed part-way through.
    #[error("failed to read response body: {0}")]
    Read(String),
}

impl TransportError {
    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Build(message) | Self::Connect(message) | Self::Read(message) => message,
        }
    }
}

/// Public error type for the chat client API.
///
/// Streaming calls never return this directly; it is delivered through
/// `ChatStreamHandler::on_error` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// No identity token was available; no request was sent.
    #[error("not authenticated")]
    Unauthenticated,
    /// Server answered with a non-success status.
    ///
    /// `message` is the server-provided `detail`, or `Request failed`.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// Response shape was unusable (missing body stream, missing field, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Network or body I/O failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ChatError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated => "not authenticated",
            Self::Http { message, .. }
            | Self::Protocol(message)
            | Self::Transport(message)
            | Self::Config(message)
            | Self::Validation(message) => message,
        }
    }

    /// Returns the HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ChatError {
    fn from(value: TransportError) -> Self {
        ChatError::Transport(value.to_string())
    }
}

/// A data frame that could not be decoded.
///
/// Never surfaced to callers; the frame is logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum FrameError {
    #[error("malformed frame payload: {0}")]
    Malformed(String),
}
