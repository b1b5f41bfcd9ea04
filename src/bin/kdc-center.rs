//! Key distribution center binary
//!
//! Runs one center session: a Diffie-Hellman exchange and pair key prompt
//! with each party, then distribution of the shared key through party A.
//!
//! ## Usage
//!
//! ```bash
//! kdc-center thor.keys ironman.keys
//! kdc-center --config center.toml
//! ```

use clap::Parser;
use kdc_protocol::with_context;
use kdc_protocol::{CenterConfig, Error, DhParameters, ExponentiationMode, KeyDistributionCenter};
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Key distribution center for the KDC protocol
#[derive(Parser, Debug)]
#[command(name = "kdc-center")]
#[command(version)]
#[command(about = "Key distribution center: pairs two parties over a shared session key", long_about = None)]
struct Args {
    /// Key file (`P G`) of party A
    key_file_a: Option<PathBuf>,

    /// Key file (`P G`) of party B
    key_file_b: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Bind port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Use exact integer exponentiation
    #[arg(long)]
    exact: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Generate sample configuration file
    #[arg(long)]
    generate_config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    if let Some(path) = args.generate_config {
        CenterConfig::default().save_to_file(&path)?;
        println!("Generated sample configuration at: {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            CenterConfig::load_from_file(path)?
        }
        None => CenterConfig::default(),
    };

    if let Some(port) = args.port {
        config.port = port;
    }
    if args.exact {
        config.exponentiation = ExponentiationMode::Exact;
    }
    match (&args.key_file_a, &args.key_file_b) {
        (Some(a), Some(b)) => {
            config.party_a.params = DhParameters::load(a)?;
            config.party_b.params = DhParameters::load(b)?;
        }
        (None, None) if args.config.is_some() => {}
        _ => {
            error!("Two key files are required unless a configuration file is given");
            return Err("usage: kdc-center <key-file-a> <key-file-b>".into());
        }
    }

    info!("Configuration:");
    info!("  Bind: {}:{}", config.host, config.port);
    info!("  Exponentiation: {}", config.exponentiation);
    info!(
        "  {}: P={} G={}",
        config.party_a.name, config.party_a.params.modulus, config.party_a.params.generator
    );
    info!(
        "  {}: P={} G={}",
        config.party_b.name, config.party_b.params.modulus, config.party_b.params.generator
    );

    let mut center = match KeyDistributionCenter::bind(config) {
        Ok(center) => center,
        Err(e) => {
            let e = with_context!(e, "center setup");
            error!("{}", e);
            return Err(e.into());
        }
    };

    match center.run() {
        Ok(outcome) => {
            info!(
                "Shared key {} distributed at {}",
                outcome.shared_key, outcome.timestamp_ms
            );
            Ok(())
        }
        Err(e) => {
            if let Error::Parse(parse) = &e {
                error!("Rejected a malformed {} payload", parse.kind());
            }
            error!("Center error: {}", e);
            Err(e.into())
        }
    }
}
