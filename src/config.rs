use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// `Debug` never shows the content.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(secret: impl Into<String>) -> Self {
        SecureString(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(*** {} bytes ***)", self.0.len())
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    pub hostname: String,
    pub username: String,
    pub secret: SecureString,
    pub remote_path: String,
    pub local_path: PathBuf,
}

impl ConnectionParameters {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        secret: SecureString,
        file_name: impl Into<String>,
    ) -> Self {
        let remote_path = file_name.into();
        Self {
            hostname: hostname.into(),
            username: username.into(),
            secret,
            local_path: PathBuf::from(&remote_path),
            remote_path,
        }
    }

    pub fn with_local_path(mut self, local_path: impl Into<PathBuf>) -> Self {
        self.local_path = local_path.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    // insecure: trusts whatever key the server presents
    AutoAccept,
    KnownHosts,
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto-accept" => Ok(HostKeyPolicy::AutoAccept),
            "known-hosts" => Ok(HostKeyPolicy::KnownHosts),
            other => Err(format!(
                "unsupported host key policy: {other} (expected auto-accept or known-hosts)"
            )),
        }
    }
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKeyPolicy::AutoAccept => write!(f, "auto-accept"),
            HostKeyPolicy::KnownHosts => write!(f, "known-hosts"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub port: u16,
    pub bound_seconds: u64,
    pub capture_tool: String,
    pub interface: String,
    pub connect_timeout_secs: u64,
    pub host_key_policy: HostKeyPolicy,
    pub known_hosts_file: Option<PathBuf>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            port: 22,
            bound_seconds: 30,
            capture_tool: "tcpdump".to_string(),
            interface: "any".to_string(),
            connect_timeout_secs: 15,
            host_key_policy: HostKeyPolicy::AutoAccept,
            known_hosts_file: None,
        }
    }
}

impl CaptureSettings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Unable to read settings file: {}", path.display()))?;
        let settings: CaptureSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed settings file: {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings file: {}", path.display()))?;
        Ok(settings)
    }

    // `timeout 0` never stops the child, so a zero bound would capture forever
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bound_seconds == 0 {
            anyhow::bail!("bound_seconds must be at least 1");
        }
        if self.capture_tool.trim().is_empty() {
            anyhow::bail!("capture_tool must not be empty");
        }
        Ok(())
    }

    pub fn known_hosts_path(&self) -> Option<PathBuf> {
        self.known_hosts_file.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| Path::new(&home).join(".ssh").join("known_hosts"))
        })
    }
}

pub fn default_output_name() -> String {
    let now: DateTime<Local> = Local::now();
    format!("capture_{}.pcap", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_settings_default() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.port, 22);
        assert_eq!(settings.bound_seconds, 30);
        assert_eq!(settings.capture_tool, "tcpdump");
        assert_eq!(settings.interface, "any");
        assert_eq!(settings.host_key_policy, HostKeyPolicy::AutoAccept);
    }

    #[test]
    fn test_settings_file_overrides_subset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "bound_seconds": 10, "host_key_policy": "known-hosts" }"#,
        )
        .unwrap();

        let settings = CaptureSettings::from_file(&path).unwrap();
        assert_eq!(settings.bound_seconds, 10);
        assert_eq!(settings.host_key_policy, HostKeyPolicy::KnownHosts);
        assert_eq!(settings.port, 22);
    }

    #[test]
    fn test_zero_bound_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "bound_seconds": 0 }"#).unwrap();

        let err = CaptureSettings::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bound_seconds"));

        let settings = CaptureSettings {
            bound_seconds: 0,
            ..CaptureSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(CaptureSettings::default().validate().is_ok());
    }

    #[test]
    fn test_settings_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CaptureSettings::from_file(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_secure_string_debug_is_redacted() {
        let secret = SecureString::new("hunter2");
        let shown = format!("{:?}", secret);
        assert!(!shown.contains("hunter2"));

        let params = ConnectionParameters::new("h", "u", secret, "out.pcap");
        assert!(!format!("{:?}", params).contains("hunter2"));
    }

    #[test]
    fn test_local_path_defaults_to_remote_name() {
        let params = ConnectionParameters::new("h", "u", SecureString::new("x"), "trace.pcap");
        assert_eq!(params.remote_path, "trace.pcap");
        assert_eq!(params.local_path, PathBuf::from("trace.pcap"));

        let params = params.with_local_path("/tmp/elsewhere.pcap");
        assert_eq!(params.remote_path, "trace.pcap");
        assert_eq!(params.local_path, PathBuf::from("/tmp/elsewhere.pcap"));
    }

    #[test]
    fn test_host_key_policy_parse() {
        assert_eq!("auto-accept".parse::<HostKeyPolicy>(), Ok(HostKeyPolicy::AutoAccept));
        assert_eq!("Known-Hosts".parse::<HostKeyPolicy>(), Ok(HostKeyPolicy::KnownHosts));
        assert!("pin".parse::<HostKeyPolicy>().is_err());
    }

    #[test]
    fn test_default_output_name() {
        let name = default_output_name();
        assert!(name.starts_with("capture_"));
        assert!(name.ends_with(".pcap"));
    }
}
