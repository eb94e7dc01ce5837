//! `uidresp`: simulate a set of devices answering discovery probes
//!
//! Reads commands and probes on stdin (or a serial port) and writes each
//! reply on stdout. Logs go to stderr.

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::{error, info};
use uid_sim::{serve, CollisionPolicy, Responder, ResponderConfig};
use uid_tools::{logging, settings, usage_exit};

#[derive(Debug, Parser)]
#[command(name = "uidresp", version, about = "Answer UID discovery probes for a set of devices")]
struct Cli {
    /// Device UIDs to answer for
    #[arg(required = true)]
    uids: Vec<String>,

    /// Collision rendering: vendor, empty or mixture
    #[arg(long)]
    collision: Option<CollisionPolicy>,

    /// Seed for collision mixtures
    #[arg(long)]
    seed: Option<u64>,

    /// Serial port to serve instead of stdin/stdout
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Config file values with command-line overrides applied
    fn responder_config(&self) -> Result<ResponderConfig, settings::SettingsError> {
        let mut config: ResponderConfig = settings::load(self.config.as_deref())?;
        if let Some(policy) = self.collision {
            config.collision_policy = policy;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
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
            eprintln!("uidresp: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.responder_config()?;
    info!("Collision policy: {}", config.collision_policy);
    let mut responder = Responder::with_config(cli.uids.iter().cloned(), config);

    let lines = match &cli.port {
        Some(port) => {
            let reader = serialport::new(port, cli.baud)
                .timeout(Duration::from_millis(100))
                .open()
                .with_context(|| format!("failed to open {port}"))?;
            let writer = reader
                .try_clone()
                .with_context(|| format!("failed to clone {port}"))?;
            serve(&mut responder, BufReader::new(reader), writer)?
        }
        None => serve(&mut responder, io::stdin().lock(), io::stdout().lock())?,
    };

    info!("Served {} line(s)", lines);
    Ok(())
}
