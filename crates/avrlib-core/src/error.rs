//! Error types for avrlib.
//!
//! Infrastructure that can genuinely fail (opening a port, writing to a
//! closed transport, validating builder parameters) returns [`Result<T>`].
//! The characteristic accessors on [`Receiver`](crate::receiver::Receiver)
//! never surface these errors; they log and fall back to cached state.

/// The error type for all avrlib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open failure, write failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (command text that cannot be framed).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data from the receiver.
    ///
    /// The idle reader treats this as "nothing arrived yet"; it is only an
    /// error for callers that explicitly wait on the transport.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a builder or command constructor.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the receiver has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the receiver was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
