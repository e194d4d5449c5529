//! `ssh2` implementation of the session traits.

use crate::config::{CaptureSettings, HostKeyPolicy, SecureString};
use crate::error::{ConnectError, TransportError};
use crate::session::{Connector, FileChannel, ProcessOutput, RemoteProcess, Transport};
use log::{debug, warn};
use ssh2::{
    Channel, CheckResult, DisconnectCode, ErrorCode, KnownHostFileKind, Session, Sftp,
};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

// libssh2 codes that mean the socket went away rather than the peer saying no
const LIBSSH2_ERROR_SOCKET_NONE: i32 = -1;
const LIBSSH2_ERROR_SOCKET_SEND: i32 = -7;
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_SOCKET_DISCONNECT: i32 = -13;
const LIBSSH2_ERROR_SOCKET_TIMEOUT: i32 = -30;
const LIBSSH2_ERROR_SOCKET_RECV: i32 = -43;

pub struct SshConnector {
    port: u16,
    timeout: Duration,
    host_key_policy: HostKeyPolicy,
    known_hosts: Option<PathBuf>,
}

impl SshConnector {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            port: settings.port,
            timeout: Duration::from_secs(settings.connect_timeout_secs),
            host_key_policy: settings.host_key_policy,
            known_hosts: settings.known_hosts_path(),
        }
    }

    fn verify_host_key(&self, session: &Session, hostname: &str) -> Result<(), ConnectError> {
        match self.host_key_policy {
            HostKeyPolicy::AutoAccept => {
                warn!(
                    "host key policy is auto-accept: the identity of {} is not verified",
                    hostname
                );
                Ok(())
            }
            HostKeyPolicy::KnownHosts => {
                let path = self.known_hosts.as_deref().ok_or_else(|| {
                    ConnectError::unexpected("no known_hosts file configured")
                })?;
                let mut known = session.known_hosts().map_err(classify_ssh_error)?;
                known
                    .read_file(path, KnownHostFileKind::OpenSSH)
                    .map_err(|e| {
                        ConnectError::unexpected(format!(
                            "unable to read {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                let (key, _) = session
                    .host_key()
                    .ok_or_else(|| ConnectError::protocol("server presented no host key"))?;
                check_result(known.check_port(hostname, self.port, key), hostname, path)
            }
        }
    }
}

fn check_result(result: CheckResult, hostname: &str, path: &Path) -> Result<(), ConnectError> {
    match result {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(ConnectError::protocol(format!(
            "host key for {} not found in {}",
            hostname,
            path.display()
        ))),
        CheckResult::Mismatch => Err(ConnectError::protocol(format!(
            "host key for {} does not match {}",
            hostname,
            path.display()
        ))),
        CheckResult::Failure => Err(ConnectError::protocol(format!(
            "host key check for {} failed",
            hostname
        ))),
    }
}

/// Socket-level libssh2 failures are unexpected; the rest are the peer
/// refusing us.
fn classify_ssh_error(e: ssh2::Error) -> ConnectError {
    match e.code() {
        ErrorCode::Session(
            LIBSSH2_ERROR_SOCKET_NONE
            | LIBSSH2_ERROR_SOCKET_SEND
            | LIBSSH2_ERROR_TIMEOUT
            | LIBSSH2_ERROR_SOCKET_DISCONNECT
            | LIBSSH2_ERROR_SOCKET_TIMEOUT
            | LIBSSH2_ERROR_SOCKET_RECV,
        ) => ConnectError::unexpected(e.to_string()),
        _ => ConnectError::protocol(e.to_string()),
    }
}

impl Connector for SshConnector {
    type Transport = SshTransport;

    fn connect(
        &self,
        hostname: &str,
        username: &str,
        secret: &SecureString,
    ) -> Result<SshTransport, ConnectError> {
        let addr = (hostname, self.port)
            .to_socket_addrs()
            .map_err(|e| ConnectError::unexpected(format!("unable to resolve {}: {}", hostname, e)))?
            .next()
            .ok_or_else(|| ConnectError::unexpected(format!("no address for {}", hostname)))?;

        debug!("connecting to {} ({})", hostname, addr);
        let tcp = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| ConnectError::unexpected(format!("connect to {} failed: {}", addr, e)))?;

        let mut session = Session::new().map_err(classify_ssh_error)?;
        session.set_tcp_stream(tcp);
        session.set_timeout(self.timeout.as_millis().min(u32::MAX as u128) as u32);
        session.handshake().map_err(classify_ssh_error)?;

        self.verify_host_key(&session, hostname)?;

        session
            .userauth_password(username, secret.expose())
            .map_err(classify_ssh_error)?;
        if !session.authenticated() {
            return Err(ConnectError::protocol("Authentication failed"));
        }

        // the capture blocks until the remote bound fires
        session.set_timeout(0);
        Ok(SshTransport { session })
    }
}

pub struct SshTransport {
    session: Session,
}

impl Transport for SshTransport {
    type Process = SshProcess;
    type Files = SshFiles;

    fn launch(&mut self, command: &str, pty: bool) -> Result<SshProcess, TransportError> {
        let mut channel = self.session.channel_session()?;
        if pty {
            channel.request_pty("xterm", None, None)?;
        }
        channel.exec(command)?;
        Ok(SshProcess { channel })
    }

    fn open_file_channel(&mut self) -> Result<SshFiles, TransportError> {
        Ok(SshFiles {
            sftp: self.session.sftp()?,
        })
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        self.session
            .disconnect(Some(DisconnectCode::ByApplication), "capture finished", None)?;
        Ok(())
    }
}

pub struct SshProcess {
    channel: Channel,
}

impl RemoteProcess for SshProcess {
    fn feed_input(&mut self, input: &[u8]) -> Result<(), TransportError> {
        self.channel.write_all(input)?;
        self.channel.flush()?;
        Ok(())
    }

    fn wait(mut self) -> Result<ProcessOutput, TransportError> {
        let mut stdout = Vec::new();
        self.channel.read_to_end(&mut stdout)?;
        let mut stderr = Vec::new();
        self.channel.stderr().read_to_end(&mut stderr)?;
        self.channel.wait_close()?;
        let exit_code = self.channel.exit_status()?;

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    fn detach(mut self) {
        if let Err(e) = self.channel.send_eof() {
            debug!("send_eof on detached channel failed: {}", e);
        }
    }
}

/// SFTP sub-channel; the subsystem shuts down when this is dropped.
pub struct SshFiles {
    sftp: Sftp,
}

impl FileChannel for SshFiles {
    fn open_remote(&mut self, path: &str) -> Result<Box<dyn Read + '_>, TransportError> {
        let file = self.sftp.open(Path::new(path))?;
        Ok(Box::new(file))
    }
}
