use crate::config::{CaptureSettings, SecureString};
use crate::error::RunError;
use crate::session::{RemoteProcess, SessionHandle, Transport};
use crate::status::redact;
use log::debug;
use std::borrow::Cow;

// what `timeout` exits with when it had to stop the child
pub const TIMEOUT_EXIT_CODE: i32 = 124;

pub fn capture_succeeded(exit_code: i32) -> bool {
    exit_code == 0 || exit_code == TIMEOUT_EXIT_CODE
}

#[derive(Debug, Clone)]
pub struct CaptureCommand {
    pub tool: String,
    pub interface: String,
    pub bound_seconds: u64,
    pub output: String,
}

impl CaptureCommand {
    pub fn new(settings: &CaptureSettings, output: impl Into<String>) -> Self {
        Self {
            tool: settings.capture_tool.clone(),
            interface: settings.interface.clone(),
            bound_seconds: settings.bound_seconds,
            output: output.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "sudo timeout {} {} -i {} -w {}",
            self.bound_seconds,
            shell_escape::escape(Cow::from(self.tool.as_str())),
            shell_escape::escape(Cow::from(self.interface.as_str())),
            shell_escape::escape(Cow::from(self.output.as_str())),
        )
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub error_text: String,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        capture_succeeded(self.exit_code)
    }
}

/// Run the capture under sudo, answering the password prompt through the PTY.
pub fn run_privileged<T: Transport>(
    handle: &mut SessionHandle<T>,
    command: &CaptureCommand,
    secret: &SecureString,
) -> Result<CommandResult, RunError> {
    let rendered = command.render();
    debug!("running on {}: {}", handle.hostname(), rendered);

    let transport = handle.transport_mut().map_err(to_run_error)?;
    let mut process = transport.launch(&rendered, true).map_err(to_run_error)?;

    let mut answer = Vec::with_capacity(secret.expose().len() + 1);
    answer.extend_from_slice(secret.expose().as_bytes());
    answer.push(b'\n');
    process.feed_input(&answer).map_err(to_run_error)?;

    let output = process.wait().map_err(to_run_error)?;
    debug!("capture command exited with {}", output.exit_code);

    // with a PTY stderr is merged into stdout
    let error_text = if output.stderr.trim().is_empty() {
        output.stdout.trim()
    } else {
        output.stderr.trim()
    };

    Ok(CommandResult {
        exit_code: output.exit_code,
        error_text: redact(error_text, secret),
    })
}

fn to_run_error(e: crate::error::TransportError) -> RunError {
    RunError {
        detail: e.to_string(),
    }
}
