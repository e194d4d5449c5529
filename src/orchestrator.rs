//! Reachability and connection are hard gates; every later step is best
//! effort and the session is always closed.

use crate::capture::{CaptureCommand, run_privileged};
use crate::cleanup::delete_remote;
use crate::config::{CaptureSettings, ConnectionParameters};
use crate::error::AbortReason;
use crate::probe::Prober;
use crate::session::{Connector, SessionHandle};
use crate::status::{StatusSink, redact};
use crate::transfer::download;
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Probed,
    Connected,
    Captured,
    Downloaded,
    Cleaned,
    Closed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    pub trail: Vec<RunState>,
    pub abort: Option<AbortReason>,
    pub capture: Option<StepOutcome>,
    pub download: Option<StepOutcome>,
    pub cleanup: Option<StepOutcome>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            state: RunState::Init,
            trail: vec![RunState::Init],
            abort: None,
            capture: None,
            download: None,
            cleanup: None,
        }
    }

    fn advance(&mut self, state: RunState) {
        self.state = state;
        self.trail.push(state);
    }

    pub fn exit_code(&self) -> i32 {
        match self.state {
            RunState::Aborted => 1,
            _ => 0,
        }
    }
}

pub struct Orchestrator<P, C, S> {
    prober: P,
    connector: C,
    status: S,
    settings: CaptureSettings,
}

impl<P, C, S> Orchestrator<P, C, S>
where
    P: Prober,
    C: Connector,
    S: StatusSink,
{
    pub fn new(prober: P, connector: C, status: S, settings: CaptureSettings) -> Self {
        Self {
            prober,
            connector,
            status,
            settings,
        }
    }

    pub fn run(&mut self, params: &ConnectionParameters) -> RunReport {
        let mut report = RunReport::new();

        self.say(params, "Verifying if the remote host is reachable...");
        if !self.prober.probe(&params.hostname) {
            let reason = AbortReason::UnreachableHost(params.hostname.clone());
            self.say(
                params,
                &format!("{}. Please check the connectivity and/or credentials. Exiting...", reason),
            );
            return self.abort(params, report, reason);
        }
        self.say(params, &format!("Host {} is reachable.", params.hostname));
        report.advance(RunState::Probed);

        self.say(
            params,
            &format!("Connecting to {} as {}...", params.hostname, params.username),
        );
        let mut handle = match SessionHandle::open(
            &self.connector,
            &params.hostname,
            &params.username,
            &params.secret,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                self.say(params, &format!("Failed to connect to {}: {}", params.hostname, e));
                self.say(params, "Failed to connect to the remote host. Exiting...");
                return self.abort(params, report, AbortReason::Connect(e));
            }
        };
        self.say(params, "Successfully connected to the remote host.");
        report.advance(RunState::Connected);

        self.say(params, "Collecting pcap traces...");
        let command = CaptureCommand::new(&self.settings, params.remote_path.as_str());
        let captured = match run_privileged(&mut handle, &command, &params.secret) {
            Ok(result) if result.succeeded() => {
                self.say(
                    params,
                    &format!(
                        "Successfully collected pcap traces and saved to {}.",
                        params.remote_path
                    ),
                );
                StepOutcome::Succeeded
            }
            Ok(result) => {
                self.warn(
                    params,
                    &format!(
                        "Failed to collect pcap traces. Command exited with status {}.",
                        result.exit_code
                    ),
                );
                if !result.error_text.is_empty() {
                    self.say(params, &result.error_text);
                }
                StepOutcome::Failed
            }
            Err(e) => {
                self.warn(
                    params,
                    &format!("An error occurred while collecting pcap traces: {}", e.detail),
                );
                StepOutcome::Failed
            }
        };
        report.capture = Some(captured);
        report.advance(RunState::Captured);

        let downloaded = match download(&mut handle, &params.remote_path, &params.local_path) {
            Ok(bytes) => {
                self.say(
                    params,
                    &format!(
                        "Successfully downloaded {} to {} ({} bytes).",
                        params.remote_path,
                        params.local_path.display(),
                        bytes
                    ),
                );
                StepOutcome::Succeeded
            }
            Err(e) => {
                self.warn(
                    params,
                    &format!("Failed to download {}: {}", params.remote_path, e.detail),
                );
                StepOutcome::Failed
            }
        };
        report.download = Some(downloaded);
        report.advance(RunState::Downloaded);

        let cleaned = match delete_remote(&mut handle, &params.remote_path) {
            Ok(_) => {
                self.say(
                    params,
                    &format!(
                        "Requested deletion of {} on the remote host (not confirmed).",
                        params.remote_path
                    ),
                );
                StepOutcome::Succeeded
            }
            Err(e) => {
                self.warn(
                    params,
                    &format!(
                        "Failed to delete {} from the remote host: {}",
                        params.remote_path, e.detail
                    ),
                );
                StepOutcome::Failed
            }
        };
        report.cleanup = Some(cleaned);
        report.advance(RunState::Cleaned);

        handle.close();
        self.say(params, "SSH connection closed successfully.");
        report.advance(RunState::Closed);

        report
    }

    fn abort(
        &mut self,
        params: &ConnectionParameters,
        mut report: RunReport,
        reason: AbortReason,
    ) -> RunReport {
        error!("run aborted: {}", redact(&reason.to_string(), &params.secret));
        report.abort = Some(reason);
        report.advance(RunState::Aborted);
        report
    }

    fn say(&mut self, params: &ConnectionParameters, line: &str) {
        let line = redact(line, &params.secret);
        info!("{}", line);
        self.status.emit(&line);
    }

    fn warn(&mut self, params: &ConnectionParameters, line: &str) {
        let line = redact(line, &params.secret);
        warn!("{}", line);
        self.status.emit(&line);
    }
}
