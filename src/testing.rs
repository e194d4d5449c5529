//! In-memory transport used by the unit tests.

use crate::config::SecureString;
use crate::error::{ConnectError, ConnectErrorKind, TransportError};
use crate::session::{Connector, FileChannel, ProcessOutput, RemoteProcess, Transport};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct CallLog {
    pub connects: usize,
    pub disconnects: usize,
    pub launched: Vec<(String, bool)>,
    pub fed: Vec<Vec<u8>>,
    pub waited: usize,
    pub detached: usize,
    pub file_channels_opened: usize,
    pub file_channels_released: usize,
    pub files_requested: Vec<String>,
}

#[derive(Clone, Default)]
struct Script {
    refuse: Option<(ConnectErrorKind, String)>,
    exit_code: i32,
    stdout: String,
    stderr: String,
    fail_launch: Option<String>,
    fail_file_channel: bool,
    remote_files: HashMap<String, Vec<u8>>,
    broken_files: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockConnector {
    script: Script,
    log: Rc<RefCell<CallLog>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> CallLog {
        self.log.borrow().clone()
    }

    pub fn refuse_with(mut self, err: ConnectError) -> Self {
        self.script.refuse = Some((err.kind, err.detail));
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.script.exit_code = code;
        self
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.script.stdout = text.to_string();
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.script.stderr = text.to_string();
        self
    }

    pub fn fail_launch(mut self, detail: &str) -> Self {
        self.script.fail_launch = Some(detail.to_string());
        self
    }

    pub fn fail_file_channel(mut self) -> Self {
        self.script.fail_file_channel = true;
        self
    }

    pub fn remote_file(mut self, name: &str, contents: &[u8]) -> Self {
        self.script
            .remote_files
            .insert(name.to_string(), contents.to_vec());
        self
    }

    /// A remote file whose read fails after the first few bytes.
    pub fn broken_remote_file(mut self, name: &str) -> Self {
        self.script.broken_files.push(name.to_string());
        self
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn connect(
        &self,
        _hostname: &str,
        _username: &str,
        _secret: &SecureString,
    ) -> Result<MockTransport, ConnectError> {
        if let Some((kind, detail)) = &self.script.refuse {
            return Err(ConnectError {
                kind: *kind,
                detail: detail.clone(),
            });
        }
        self.log.borrow_mut().connects += 1;
        Ok(MockTransport {
            script: self.script.clone(),
            log: Rc::clone(&self.log),
        })
    }
}

pub struct MockTransport {
    script: Script,
    log: Rc<RefCell<CallLog>>,
}

impl Transport for MockTransport {
    type Process = MockProcess;
    type Files = MockFiles;

    fn launch(&mut self, command: &str, pty: bool) -> Result<MockProcess, TransportError> {
        if let Some(detail) = &self.script.fail_launch {
            return Err(TransportError::Other(detail.clone()));
        }
        self.log
            .borrow_mut()
            .launched
            .push((command.to_string(), pty));
        Ok(MockProcess {
            output: ProcessOutput {
                exit_code: self.script.exit_code,
                stdout: self.script.stdout.clone(),
                stderr: self.script.stderr.clone(),
            },
            log: Rc::clone(&self.log),
        })
    }

    fn open_file_channel(&mut self) -> Result<MockFiles, TransportError> {
        if self.script.fail_file_channel {
            return Err(TransportError::Other("subsystem request failed".to_string()));
        }
        self.log.borrow_mut().file_channels_opened += 1;
        Ok(MockFiles {
            files: self.script.remote_files.clone(),
            broken: self.script.broken_files.clone(),
            log: Rc::clone(&self.log),
        })
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        self.log.borrow_mut().disconnects += 1;
        Ok(())
    }
}

pub struct MockProcess {
    output: ProcessOutput,
    log: Rc<RefCell<CallLog>>,
}

impl RemoteProcess for MockProcess {
    fn feed_input(&mut self, input: &[u8]) -> Result<(), TransportError> {
        self.log.borrow_mut().fed.push(input.to_vec());
        Ok(())
    }

    fn wait(self) -> Result<ProcessOutput, TransportError> {
        self.log.borrow_mut().waited += 1;
        Ok(self.output)
    }

    fn detach(self) {
        self.log.borrow_mut().detached += 1;
    }
}

pub struct MockFiles {
    files: HashMap<String, Vec<u8>>,
    broken: Vec<String>,
    log: Rc<RefCell<CallLog>>,
}

impl FileChannel for MockFiles {
    fn open_remote(&mut self, path: &str) -> Result<Box<dyn Read + '_>, TransportError> {
        self.log
            .borrow_mut()
            .files_requested
            .push(path.to_string());
        if self.broken.iter().any(|name| name == path) {
            return Ok(Box::new(BrokenReader { sent: false }));
        }
        match self.files.get(path) {
            Some(contents) => Ok(Box::new(Cursor::new(contents.clone()))),
            None => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no such file",
            ))),
        }
    }
}

impl Drop for MockFiles {
    fn drop(&mut self) {
        self.log.borrow_mut().file_channels_released += 1;
    }
}

struct BrokenReader {
    sent: bool,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        self.sent = true;
        let n = buf.len().min(4);
        buf[..n].copy_from_slice(&b"\xd4\xc3\xb2\xa1"[..n]);
        Ok(n)
    }
}
