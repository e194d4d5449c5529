use anyhow::{Context, Result};
use clap::Parser;
use remote_pcap::{
    CaptureSettings, ConnectionParameters, ConsoleStatus, HostKeyPolicy, Orchestrator, PingProber,
    SecureString, SshConnector, default_output_name,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// anything left out on the command line is prompted for
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hostname or IP address of the remote machine
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// SSH username
    #[arg(short, long)]
    user: Option<String>,

    /// Capture file name, used on the remote host and locally
    #[arg(short, long)]
    output: Option<String>,

    /// Save the download somewhere other than the capture file name
    #[arg(short, long)]
    local_path: Option<PathBuf>,

    /// Capture duration in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    bound_seconds: Option<u64>,

    /// SSH port
    #[arg(short, long)]
    port: Option<u16>,

    /// auto-accept or known-hosts
    #[arg(long)]
    host_key_policy: Option<HostKeyPolicy>,

    /// known_hosts file for the known-hosts policy
    #[arg(long)]
    known_hosts: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Environment variable holding the password
    #[arg(long, default_value = "REMOTE_PCAP_PASSWORD")]
    password_env: String,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    // command line wins over the settings file
    let mut settings = match &args.config_file {
        Some(path) => CaptureSettings::from_file(path)?,
        None => CaptureSettings::default(),
    };
    if let Some(bound) = args.bound_seconds {
        settings.bound_seconds = bound;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(policy) = args.host_key_policy {
        settings.host_key_policy = policy;
    }
    if args.known_hosts.is_some() {
        settings.known_hosts_file = args.known_hosts.clone();
    }
    settings.validate()?;

    welcome_message();

    println!("Please enter the details to connect to the remote host.");
    let hostname = match args.host {
        Some(host) => host,
        None => prompt_required("Enter the hostname or IP address of the remote machine: ")?,
    };
    let username = match args.user {
        Some(user) => user,
        None => prompt_required("Enter your username: ")?,
    };
    let secret = match std::env::var(&args.password_env) {
        Ok(secret) => SecureString::new(secret),
        Err(_) => SecureString::new(
            rpassword::prompt_password("Enter your password: ")
                .context("failed to read password")?,
        ),
    };
    let file_name = match args.output {
        Some(output) => output,
        None => {
            let entered = prompt("Enter the filename to save the pcap trace (blank for a timestamped name): ")?;
            if entered.is_empty() {
                default_output_name()
            } else {
                entered
            }
        }
    };
    println!();

    let mut params = ConnectionParameters::new(hostname, username, secret, file_name);
    if let Some(local_path) = args.local_path {
        params = params.with_local_path(local_path);
    }

    let report = Orchestrator::new(
        PingProber::new(),
        SshConnector::new(&settings),
        ConsoleStatus,
        settings,
    )
    .run(&params);

    if report.exit_code() == 0 {
        println!("Capture run finished.");
    }
    std::process::exit(report.exit_code());
}

fn welcome_message() {
    println!();
    println!("******************************************************");
    println!("*  remote-pcap - pcap trace collection over SSH      *");
    println!("*  Version: {:<41}*", VERSION);
    println!("******************************************************");
    println!();
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("failed to read from stdin")?;
    Ok(input.trim().to_string())
}

fn prompt_required(message: &str) -> Result<String> {
    let value = prompt(message)?;
    if value.is_empty() {
        anyhow::bail!("a value is required: {}", message.trim_end_matches([':', ' ']));
    }
    Ok(value)
}
