/*!
Configuration for the center and party processes.

Both configurations have working defaults (the loopback ports and names the
protocol was designed with) and can be loaded from or saved to TOML.
*/

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::constants::{self, keys, names, ports, timing};
use crate::core::crypto::{DhParameters, ExponentiationMode};
use crate::core::error::{Error, Result};
use crate::core::session::PartyRole;

/// Sample parameters used when no key file is given
const SAMPLE_PARAMS: DhParameters = DhParameters {
    modulus: 23,
    generator: 5,
};

/// How the center reaches one party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyEndpoint {
    /// Display name used in prompts and logs
    pub name: String,
    /// Port the party is bound to
    pub port: u16,
    /// The party's public Diffie-Hellman parameters
    pub params: DhParameters,
}

/// Key distribution center configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterConfig {
    /// Host to bind and to address parties on
    pub host: String,
    /// Port the center binds
    pub port: u16,
    /// Center's Diffie-Hellman private exponent
    pub private_exponent: i64,
    /// Exponentiation used for both exchanges
    pub exponentiation: ExponentiationMode,
    /// Party A (initiator)
    pub party_a: PartyEndpoint,
    /// Party B (responder)
    pub party_b: PartyEndpoint,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: ports::CENTER,
            private_exponent: keys::CENTER_PRIVATE_EXPONENT,
            exponentiation: ExponentiationMode::default(),
            party_a: PartyEndpoint {
                name: names::PARTY_A.to_string(),
                port: ports::PARTY_A,
                params: SAMPLE_PARAMS,
            },
            party_b: PartyEndpoint {
                name: names::PARTY_B.to_string(),
                port: ports::PARTY_B,
                params: SAMPLE_PARAMS,
            },
        }
    }
}

impl CenterConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        save_toml(self, path)
    }

    /// Address the center binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port cannot be 0".into()));
        }
        for party in [&self.party_a, &self.party_b] {
            if party.port == 0 || party.port == self.port {
                return Err(Error::Config(format!(
                    "{} needs its own non-zero port",
                    party.name
                )));
            }
            if party.params.modulus == 0 {
                return Err(Error::Config(format!("{} has a zero modulus", party.name)));
            }
        }
        if self.party_a.port == self.party_b.port {
            return Err(Error::Config("parties cannot share a port".into()));
        }
        Ok(())
    }
}

/// Party configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    /// Display name
    pub name: String,
    /// Name of the party on the other end
    pub peer_name: String,
    /// Initiator (A) or responder (B)
    pub role: PartyRole,
    /// Host to bind and to address the center and peer on
    pub host: String,
    /// Port this party binds
    pub port: u16,
    /// Center's port
    pub center_port: u16,
    /// Peer party's port
    pub peer_port: u16,
    /// This party's Diffie-Hellman private exponent
    pub private_exponent: i64,
    /// Exponentiation used for the exchange
    pub exponentiation: ExponentiationMode,
    /// Messaging idle window in microseconds
    pub idle_timeout_us: u64,
    /// Relayed timestamps older than this are reported as stale (seconds)
    pub max_timestamp_age_secs: u64,
    /// This party's public Diffie-Hellman parameters
    pub params: DhParameters,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self::initiator()
    }
}

impl PartyConfig {
    /// Defaults for party A
    pub fn initiator() -> Self {
        Self {
            name: names::PARTY_A.to_string(),
            peer_name: names::PARTY_B.to_string(),
            role: PartyRole::Initiator,
            host: constants::DEFAULT_HOST.to_string(),
            port: ports::PARTY_A,
            center_port: ports::CENTER,
            peer_port: ports::PARTY_B,
            params: SAMPLE_PARAMS,
            private_exponent: keys::PARTY_PRIVATE_EXPONENT,
            exponentiation: ExponentiationMode::default(),
            idle_timeout_us: timing::IDLE_TIMEOUT.as_micros() as u64,
            max_timestamp_age_secs: timing::MAX_TIMESTAMP_AGE.as_secs(),
        }
    }

    /// Defaults for party B
    pub fn responder() -> Self {
        Self {
            name: names::PARTY_B.to_string(),
            peer_name: names::PARTY_A.to_string(),
            role: PartyRole::Responder,
            port: ports::PARTY_B,
            peer_port: ports::PARTY_A,
            ..Self::initiator()
        }
    }

    /// Defaults for the given role
    pub fn for_role(role: PartyRole) -> Self {
        match role {
            PartyRole::Initiator => Self::initiator(),
            PartyRole::Responder => Self::responder(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        load_toml(path)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        save_toml(self, path)
    }

    /// Address this party binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }

    /// Messaging idle window
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_micros(self.idle_timeout_us)
    }

    /// Freshness window for relayed timestamps
    pub fn max_timestamp_age(&self) -> Duration {
        Duration::from_secs(self.max_timestamp_age_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 || self.center_port == 0 || self.peer_port == 0 {
            return Err(Error::Config("ports cannot be 0".into()));
        }
        if self.port == self.center_port || self.port == self.peer_port {
            return Err(Error::Config(format!(
                "port {} collides with the center or peer port",
                self.port
            )));
        }
        if self.params.modulus == 0 {
            return Err(Error::Config("modulus cannot be 0".into()));
        }
        if self.idle_timeout_us == 0 {
            return Err(Error::Config("idle_timeout_us cannot be 0".into()));
        }
        Ok(())
    }
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| Error::Config(format!("invalid address {}:{}: {}", host, port, e)))
}

fn load_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Setup(format!("failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

fn save_toml<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(value)
        .map_err(|e| Error::Config(e.to_string()))?;

    std::fs::write(path, content)?;
    Ok(())
}
