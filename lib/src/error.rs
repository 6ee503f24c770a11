use std::error;
use std::fmt;

/// All possible snagmail library errors.
///
/// Every variant carries the message we want the portal UI to see;
/// the server hands these back verbatim in the JSON envelope.
#[derive(Clone, Debug)]
pub enum Error {
    /// Required secret/credential missing or malformed.
    /// Raised before any network call is made.
    Config(String),
    /// Socket, TLS, DNS, or HTTP transport failure.
    Transport(String),
    /// Malformed base64 input (attachment payload or key material).
    Encoding(String),
    /// SMTP server rejected our credentials.
    AuthRejected(String),
    /// SMTP server refused the recipient address.
    RecipientRejected(String),
    /// Remote peer returned a negative reply (SMTP) or non-2xx status (HTTP).
    Rejected { code: u16, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref msg) => write!(f, "configuration error: {}", msg),
            Error::Transport(ref msg) => write!(f, "transport error: {}", msg),
            Error::Encoding(ref msg) => write!(f, "encoding error: {}", msg),
            Error::AuthRejected(ref msg) => write!(f, "authentication rejected: {}", msg),
            Error::RecipientRejected(ref msg) => write!(f, "recipient rejected: {}", msg),
            Error::Rejected { code, ref message } => write!(f, "rejected ({}): {}", code, message),
        }
    }
}

impl error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<native_tls::Error> for Error {
    fn from(err: native_tls::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport("request timed out".to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Encoding(err.to_string())
    }
}
