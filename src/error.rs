//! Error types for the IRC client engine.
//!
//! Connection-setup failures are returned as values from
//! [`Client::connect`]; per-line faults during normal operation are
//! reported and swallowed by the receive loop instead of surfacing here.
//!
//! [`Client::connect`]: crate::client::Client::connect

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Transport-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line exceeded maximum allowed length without a terminator.
    #[error("message too long: {0} bytes")]
    MessageTooLong(usize),
}

/// Errors encountered when parsing IRC lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was invalid or missing.
    #[error("invalid command")]
    InvalidCommand,

    /// Line failed the grammar.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Connection-setup failures, reported synchronously to the caller
/// before any transport duty starts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectError {
    /// A live session already exists; disconnect before reconnecting.
    #[error("already connected to a server")]
    AlreadyConnected,

    /// Socket-level connect or handshake I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS was requested but could not be set up.
    #[error("tls error: {0}")]
    Tls(String),

    /// The server closed the stream before registration completed.
    #[error("connection closed during registration")]
    RegistrationAborted,
}

impl From<ProtocolError> for ConnectError {
    fn from(e: ProtocolError) -> ConnectError {
        match e {
            ProtocolError::Io(io) => ConnectError::Io(io),
            other => ConnectError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::MessageTooLong(9000);
        assert_eq!(format!("{}", err), "message too long: 9000 bytes");

        let err = MessageParseError::EmptyMessage;
        assert_eq!(format!("{}", err), "empty message");

        let err = ConnectError::AlreadyConnected;
        assert_eq!(format!("{}", err), "already connected to a server");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: ConnectError = io_err.into();
        assert!(matches!(err, ConnectError::Io(_)));
    }
}
