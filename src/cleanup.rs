use crate::error::{CleanupError, TransportError};
use crate::session::{RemoteProcess, SessionHandle, Transport};
use log::debug;
use std::borrow::Cow;

// the delete was sent; whether it worked remotely is unknown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupAck {
    pub command: String,
}

pub fn cleanup_command(remote: &str) -> String {
    format!("rm -f {}", shell_escape::escape(Cow::from(remote)))
}

/// Fire-and-forget `rm -f` of the remote capture file.
pub fn delete_remote<T: Transport>(
    handle: &mut SessionHandle<T>,
    remote: &str,
) -> Result<CleanupAck, CleanupError> {
    let command = cleanup_command(remote);
    debug!("running on {}: {}", handle.hostname(), command);

    let transport = handle.transport_mut().map_err(to_cleanup_error)?;
    let process = transport.launch(&command, false).map_err(to_cleanup_error)?;
    process.detach();

    Ok(CleanupAck { command })
}

fn to_cleanup_error(e: TransportError) -> CleanupError {
    CleanupError {
        detail: e.to_string(),
    }
}
