use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session is not open")]
    NotOpen,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    ProtocolFailure,
    Unexpected,
}

impl fmt::Display for ConnectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectErrorKind::ProtocolFailure => write!(f, "protocol failure"),
            ConnectErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

#[derive(Error, Debug)]
#[error("{kind}: {detail}")]
pub struct ConnectError {
    pub kind: ConnectErrorKind,
    pub detail: String,
}

impl ConnectError {
    pub fn protocol(detail: impl Into<String>) -> Self {
        Self {
            kind: ConnectErrorKind::ProtocolFailure,
            detail: detail.into(),
        }
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self {
            kind: ConnectErrorKind::Unexpected,
            detail: detail.into(),
        }
    }
}

#[derive(Error, Debug)]
#[error("Capture command could not be run: {detail}")]
pub struct RunError {
    pub detail: String,
}

#[derive(Error, Debug)]
#[error("Download failed: {detail}")]
pub struct TransferError {
    pub detail: String,
}

#[derive(Error, Debug)]
#[error("Remote cleanup failed: {detail}")]
pub struct CleanupError {
    pub detail: String,
}

/// The two hard gates of a run. Anything else is logged and the run goes on.
#[derive(Error, Debug)]
pub enum AbortReason {
    #[error("Host {0} is not reachable")]
    UnreachableHost(String),

    #[error("Failed to connect: {0}")]
    Connect(#[from] ConnectError),
}
