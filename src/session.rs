//! Remote session lifecycle. [`crate::ssh`] provides the real transport.

use crate::config::SecureString;
use crate::error::{ConnectError, TransportError};
use log::{debug, info};
use std::io::Read;

#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

// launch and feed_input are separate so a sudo prompt can be answered
pub trait RemoteProcess {
    fn feed_input(&mut self, input: &[u8]) -> Result<(), TransportError>;

    fn wait(self) -> Result<ProcessOutput, TransportError>;

    fn detach(self);
}

// dropping it releases the sub-channel
pub trait FileChannel {
    fn open_remote(&mut self, path: &str) -> Result<Box<dyn Read + '_>, TransportError>;
}

pub trait Transport {
    type Process: RemoteProcess;
    type Files: FileChannel;

    fn launch(&mut self, command: &str, pty: bool) -> Result<Self::Process, TransportError>;
    fn open_file_channel(&mut self) -> Result<Self::Files, TransportError>;
    fn disconnect(&mut self) -> Result<(), TransportError>;
}

pub trait Connector {
    type Transport: Transport;

    fn connect(
        &self,
        hostname: &str,
        username: &str,
        secret: &SecureString,
    ) -> Result<Self::Transport, ConnectError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

/// Once closed it stays closed; a new run needs a new handle.
pub struct SessionHandle<T: Transport> {
    hostname: String,
    transport: Option<T>,
    state: SessionState,
}

impl<T: Transport> SessionHandle<T> {
    pub fn unopened(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            transport: None,
            state: SessionState::Unopened,
        }
    }

    pub fn open<C>(
        connector: &C,
        hostname: &str,
        username: &str,
        secret: &SecureString,
    ) -> Result<Self, ConnectError>
    where
        C: Connector<Transport = T>,
    {
        let transport = connector.connect(hostname, username, secret)?;
        info!("session to {} open", hostname);
        Ok(Self {
            hostname: hostname.to_string(),
            transport: Some(transport),
            state: SessionState::Open,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn transport_mut(&mut self) -> Result<&mut T, TransportError> {
        match (self.state, self.transport.as_mut()) {
            (SessionState::Open, Some(transport)) => Ok(transport),
            _ => Err(TransportError::NotOpen),
        }
    }

    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.disconnect() {
                debug!("error while disconnecting from {}: {}", self.hostname, e);
            }
            info!("session to {} closed", self.hostname);
        }
        self.state = SessionState::Closed;
    }
}

impl<T: Transport> Drop for SessionHandle<T> {
    fn drop(&mut self) {
        self.close();
    }
}
