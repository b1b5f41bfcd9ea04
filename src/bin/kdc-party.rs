//! Party binary
//!
//! Establishes a shared key through the center, then chats with the peer
//! party over it until standard input closes.
//!
//! ## Usage
//!
//! ```bash
//! kdc-party thor.keys
//! kdc-party --role responder ironman.keys
//! ```

use clap::{Parser, ValueEnum};
use kdc_protocol::core::message::parse_hex_key;
use kdc_protocol::with_context;
use kdc_protocol::{
    DhParameters, Error, ExponentiationMode, PairKeySource, Party, PartyConfig, PartyRole,
    StdinOperator,
};
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    /// Party A: talks to the center and relays for B
    Initiator,
    /// Party B: receives the key relayed by A
    Responder,
}

impl From<RoleArg> for PartyRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Initiator => PartyRole::Initiator,
            RoleArg::Responder => PartyRole::Responder,
        }
    }
}

/// Party of the KDC protocol
#[derive(Parser, Debug)]
#[command(name = "kdc-party")]
#[command(version)]
#[command(about = "Party of the KDC protocol: obtain a shared key, then chat", long_about = None)]
struct Args {
    /// Key file (`P G`) with this party's public parameters
    key_file: Option<PathBuf>,

    /// Role in the protocol
    #[arg(short = 'r', long, value_enum, default_value_t = RoleArg::Initiator)]
    role: RoleArg,

    /// Configuration file path
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Display name
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Bind port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Pair key (hex) to submit instead of typing one
    #[arg(long, conflicts_with = "generate_key")]
    pair_key: Option<String>,

    /// Submit a randomly generated pair key
    #[arg(long)]
    generate_key: bool,

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

    let role = PartyRole::from(args.role);

    if let Some(path) = args.generate_config {
        PartyConfig::for_role(role).save_to_file(&path)?;
        println!("Generated sample configuration at: {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            PartyConfig::load_from_file(path)?
        }
        None => PartyConfig::for_role(role),
    };

    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.exact {
        config.exponentiation = ExponentiationMode::Exact;
    }
    match &args.key_file {
        Some(path) => config.params = DhParameters::load(path)?,
        None if args.config.is_some() => {}
        None => {
            error!("A key file is required unless a configuration file is given");
            return Err("usage: kdc-party <key-file>".into());
        }
    }

    let source = match (&args.pair_key, args.generate_key) {
        (Some(hex), _) => PairKeySource::Fixed(parse_hex_key(hex.as_bytes())?),
        (None, true) => PairKeySource::Random,
        (None, false) => PairKeySource::Operator,
    };

    info!("Configuration:");
    info!("  {} ({}) on {}:{}", config.name, config.role, config.host, config.port);
    info!("  Center port: {}, peer port: {}", config.center_port, config.peer_port);
    info!("  P={} G={}", config.params.modulus, config.params.generator);

    let mut party = match Party::bind(config) {
        Ok(party) => party.with_key_source(source),
        Err(e) => {
            let e = with_context!(e, "party setup");
            error!("{}", e);
            return Err(e.into());
        }
    };
    let mut operator = StdinOperator::spawn();

    let shared_key = match party.establish(&mut operator) {
        Ok(key) => key,
        Err(e) => {
            if let Error::Parse(parse) = &e {
                error!("Rejected a malformed {} payload", parse.kind());
            }
            error!("Key establishment failed: {}", e);
            return Err(e.into());
        }
    };
    info!("Shared key established: {}", shared_key);

    let stats = party.run_messaging(&mut operator)?;
    info!(
        "Session closed: {} sent, {} received, {} idle periods",
        stats.sent, stats.received, stats.idle_periods
    );
    Ok(())
}
