use crate::protocol::{ErrorInfo, ProtocolError};

/// Errors that make the session unusable: the connection could not be
/// established, or a query exchange broke off before a result arrived.
///
/// Server-side statement failures are not errors at this level; they come
/// back as [`ExecOutcome::ServerError`](super::ExecOutcome) with the session
/// still usable.
#[derive(Debug)]
pub enum ClientError {
    /// Transport-level I/O failure.
    Io(std::io::Error),
    /// The peer violated the wire protocol.
    Protocol(ProtocolError),
    /// The server closed the connection mid-exchange.
    ConnectionClosed,
    /// The server asked for an authentication method this client cannot do.
    UnsupportedAuth(i32),
    /// The server refused the connection during startup.
    Rejected(ErrorInfo),
    /// A message that is legal on the wire but nonsensical at this point
    /// of the exchange.
    UnexpectedMessage(&'static str),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Io(e) => write!(f, "I/O error: {}", e),
            ClientError::Protocol(e) => write!(f, "protocol error: {}", e),
            ClientError::ConnectionClosed => write!(f, "connection closed by server"),
            ClientError::UnsupportedAuth(code) => {
                write!(f, "unsupported authentication method: {}", code)
            }
            ClientError::Rejected(info) => write!(f, "connection rejected: {}", info),
            ClientError::UnexpectedMessage(what) => {
                write!(f, "unexpected message from server: {}", what)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Io(e) => Some(e),
            ClientError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        // Framed surfaces transport failures through the codec error type.
        match e {
            ProtocolError::Io(e) => ClientError::Io(e),
            other => ClientError::Protocol(other),
        }
    }
}
