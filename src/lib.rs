//! Time-bounded packet capture on a remote host over SSH.
//!
//! A run checks the host answers ping, logs in with a password, runs
//! `sudo timeout <n> tcpdump` behind a PTY, pulls the capture file back over
//! SFTP, deletes it on the remote side and disconnects. See
//! [`orchestrator::Orchestrator`].

pub mod capture;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod session;
pub mod ssh;
pub mod status;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use capture::{CaptureCommand, CommandResult, TIMEOUT_EXIT_CODE, capture_succeeded};
pub use config::{
    CaptureSettings, ConnectionParameters, HostKeyPolicy, SecureString, default_output_name,
};
pub use error::{
    AbortReason, CleanupError, ConnectError, ConnectErrorKind, RunError, TransferError,
    TransportError,
};
pub use orchestrator::{Orchestrator, RunReport, RunState, StepOutcome};
pub use probe::{PingProber, Prober};
pub use session::{SessionHandle, SessionState};
pub use ssh::SshConnector;
pub use status::{ConsoleStatus, StatusSink};
