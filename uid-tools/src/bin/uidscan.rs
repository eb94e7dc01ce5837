//! `uidscan`: discover every device UID under one or more prefixes
//!
//! Probes go out on stdout (or a serial port) and replies come back on
//! stdin. Results and logs are written to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::error;
use uid_protocol::{Bus, Prefix};
use uid_scan::{
    list_ports, parse_prefixes, ScanConfig, ScanError, ScanReport, Scanner, SerialBus, StdioBus,
};
use uid_tools::{logging, settings, usage_exit};

#[derive(Debug, Parser)]
#[command(name = "uidscan", version, about = "Discover device UIDs on a shared line")]
struct Cli {
    /// Two-character prefixes to scan, in order
    #[arg(required_unless_present = "list_ports")]
    prefixes: Vec<String>,

    /// Reply timeout per probe, in milliseconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Serial port to scan instead of stdin/stdout
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print the full scan report as JSON
    #[arg(long)]
    json: bool,

    /// Skip the full-length check on confirmed UIDs
    #[arg(long)]
    no_verify: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Config file values with command-line overrides applied
    fn scan_config(&self) -> Result<ScanConfig, settings::SettingsError> {
        let mut config: ScanConfig = settings::load(self.config.as_deref())?;
        if let Some(timeout) = self.timeout {
            config.timeout_ms = timeout;
        }
        if self.no_verify {
            config.verify_exact = false;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return usage_exit(e),
    };

    logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("uidscan: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.list_ports {
        for port in list_ports()? {
            println!("{}", port.describe());
        }
        return Ok(());
    }

    let config = cli.scan_config()?;
    let prefixes = parse_prefixes(&cli.prefixes)?;

    let report = match &cli.port {
        Some(port) => {
            let bus = SerialBus::open(port, cli.baud)?;
            discover(bus, config, &prefixes)
        }
        None => {
            let bus = StdioBus::stdio().context("failed to start stdio transport")?;
            discover(bus, config, &prefixes)
        }
    }?;

    print_report(&report, cli.json)
}

fn discover<B: Bus>(
    bus: B,
    config: ScanConfig,
    prefixes: &[Prefix],
) -> Result<ScanReport, ScanError> {
    let mut scanner = Scanner::with_config(bus, config);
    scanner.scan(prefixes)
}

fn print_report(report: &ScanReport, json: bool) -> anyhow::Result<()> {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();

    for uid in report.found() {
        writeln!(out, "FOUND: {uid}")?;
    }

    if json {
        serde_json::to_writer_pretty(&mut out, report)?;
        writeln!(out)?;
        return Ok(());
    }

    let totals = report.totals();
    writeln!(
        out,
        "{} UID(s) found under {} prefix(es) with {} probes",
        report.total_found(),
        report.prefixes.len(),
        totals.probes
    )?;
    for prefix in &report.prefixes {
        for uid in &prefix.duplicates {
            writeln!(out, "DUPLICATE: {uid}")?;
        }
        for pattern in &prefix.unresolved {
            writeln!(out, "UNRESOLVED: {pattern}")?;
        }
        if !prefix.complete {
            writeln!(out, "INCOMPLETE: {}", prefix.prefix)?;
        }
    }
    if report.channel_closed {
        writeln!(out, "channel closed before the scan finished")?;
    }
    Ok(())
}
