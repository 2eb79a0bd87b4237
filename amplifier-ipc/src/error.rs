//! IPC error types

use thiserror::Error;

/// IPC error types
#[derive(Debug, Error)]
pub enum IpcError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// The worker closed its end of the pipe before we were done
    #[error("Connection closed")]
    ConnectionClosed,
}

impl IpcError {
    /// The peer went away; callers treat this as end-of-conversation rather than a failure
    pub fn is_disconnect(&self) -> bool {
        matches!(self, IpcError::ConnectionClosed)
    }
}

impl From<std::io::Error> for IpcError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => IpcError::ConnectionClosed,
            _ => IpcError::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for IpcError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            IpcError::IoError(err.to_string())
        } else {
            IpcError::SerializationError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_pipe_is_disconnect() {
        let err: IpcError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(err.is_disconnect());

        let err: IpcError = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert!(!err.is_disconnect());
    }
}
