use std::fmt;

/// Failure at the record-source boundary. Nothing downstream of a fetch can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response (connect, timeout, read).
    Transport { detail: String },
    /// Non-2xx HTTP status.
    Status { status: u16, body: String },
    /// The backend answered with an error envelope.
    Backend { message: String },
    /// The response body did not match the expected shape.
    Decode { detail: String },
}

impl FetchError {
    pub fn stage(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "http",
            FetchError::Backend { .. } => "backend",
            FetchError::Decode { .. } => "decode",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport { detail } => write!(f, "ranking fetch failed: {detail}"),
            FetchError::Status { status, body } => {
                write!(f, "ranking fetch failed (HTTP {status}): {body}")
            }
            FetchError::Backend { message } => write!(f, "ranking backend error: {message}"),
            FetchError::Decode { detail } => {
                write!(f, "ranking response could not be decoded: {detail}")
            }
        }
    }
}

impl std::error::Error for FetchError {}
