use log::debug;
use std::process::{Command, Stdio};

pub trait Prober {
    /// True iff the host answered. Never fails any other way.
    fn probe(&self, hostname: &str) -> bool;
}

pub struct PingProber {
    program: String,
    count: u32,
}

const PROBE_COUNT: u32 = 2;

impl PingProber {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            count: PROBE_COUNT,
        }
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for PingProber {
    fn probe(&self, hostname: &str) -> bool {
        let status = Command::new(&self.program)
            .arg("-c")
            .arg(self.count.to_string())
            .arg(hostname)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) => {
                debug!("{} {} exited with {}", self.program, hostname, status);
                status.success()
            }
            Err(e) => {
                debug!("failed to run {}: {}", self.program, e);
                false
            }
        }
    }
}
