/*!
Center side of the KDC protocol.

[`KeyDistributionCenter`] is an explicit state machine over [`CenterPhase`].
Party A is served completely (exchange, then prompt) before party B. Every
receive blocks without a timeout; a phase only advances once its work has
succeeded, so a parse failure leaves the center where it was.
*/

use std::fmt;

use tracing::{debug, info};

use crate::{
    core::{
        config::{CenterConfig, PartyEndpoint},
        crypto::{BlockCipher, KeyExchange, SessionKey, SharedSessionKey},
        error::{Error, Result},
        message::{MessageKind, initiator_prompt, parse_hex_key, responder_prompt},
        session::CenterPhase,
    },
    invalid_state_err,
    protocol::{
        shared::{crypto, traits::Transport, utils::unix_millis},
        transport::{Link, UdpTransport},
    },
};

/// One of the two parties the center serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartySlot {
    /// Party A, the initiator
    A,
    /// Party B, the responder
    B,
}

impl fmt::Display for PartySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartySlot::A => write!(f, "A"),
            PartySlot::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Pairing {
    session_key: Option<SessionKey>,
    pair_key: Option<u16>,
}

/// What a completed run handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CenterOutcome {
    /// Key minted for the two parties
    pub shared_key: SharedSessionKey,
    /// Timestamp sent along for party B, in Unix milliseconds
    pub timestamp_ms: u64,
}

/// Key distribution center for a single run
pub struct KeyDistributionCenter<T: Transport> {
    config: CenterConfig,
    link: Link<T>,
    phase: CenterPhase,
    party_a: Pairing,
    party_b: Pairing,
    outcome: Option<CenterOutcome>,
    clock: fn() -> u64,
}

impl KeyDistributionCenter<UdpTransport> {
    /// Bind the configured UDP port and create a center on it.
    pub fn bind(config: CenterConfig) -> Result<Self> {
        config.validate()?;
        let transport = UdpTransport::bind(config.bind_addr()?)?;
        Self::new(config, transport)
    }
}

impl<T: Transport> KeyDistributionCenter<T> {
    /// Create a center over an existing transport.
    pub fn new(config: CenterConfig, transport: T) -> Result<Self> {
        config.validate()?;
        info!(
            "Center ready on port {} for {} ({}) and {} ({})",
            transport.local_port(),
            config.party_a.name,
            config.party_a.port,
            config.party_b.name,
            config.party_b.port
        );

        Ok(Self {
            config,
            link: Link::new(transport),
            phase: CenterPhase::Init,
            party_a: Pairing::default(),
            party_b: Pairing::default(),
            outcome: None,
            clock: unix_millis,
        })
    }

    /// Replace the clock used for the distributed timestamp
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Current phase
    pub fn phase(&self) -> CenterPhase {
        self.phase
    }

    /// Configuration in use
    pub fn config(&self) -> &CenterConfig {
        &self.config
    }

    /// Session key agreed with a party, once exchanged
    pub fn session_key(&self, slot: PartySlot) -> Option<SessionKey> {
        self.pairing(slot).session_key
    }

    /// Pair key a party submitted, once received
    pub fn pair_key(&self, slot: PartySlot) -> Option<u16> {
        self.pairing(slot).pair_key
    }

    /// Result of the run, once distributed
    pub fn outcome(&self) -> Option<CenterOutcome> {
        self.outcome
    }

    /// Perform the next phase's work and move to it.
    pub fn advance(&mut self) -> Result<CenterPhase> {
        let Some(next) = self.phase.next() else {
            return invalid_state_err!("a phase before Done", self.phase);
        };

        match next {
            CenterPhase::ExchangeWithPartyA => self.exchange(PartySlot::A)?,
            CenterPhase::PromptPartyAForPairKey => self.prompt(PartySlot::A)?,
            CenterPhase::ExchangeWithPartyB => self.exchange(PartySlot::B)?,
            CenterPhase::PromptPartyBForPairKey => self.prompt(PartySlot::B)?,
            CenterPhase::DistributeSharedKey => self.distribute()?,
            CenterPhase::Done => info!("Center run complete"),
            CenterPhase::Init => {
                return Err(Error::Internal("Init has no predecessor".into()));
            }
        }

        debug!("Center phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(next)
    }

    /// Drive the run to completion.
    pub fn run(&mut self) -> Result<CenterOutcome> {
        while !self.phase.is_terminal() {
            self.advance()?;
        }
        self.outcome
            .ok_or_else(|| Error::Internal("run finished without an outcome".into()))
    }

    fn pairing(&self, slot: PartySlot) -> &Pairing {
        match slot {
            PartySlot::A => &self.party_a,
            PartySlot::B => &self.party_b,
        }
    }

    fn pairing_mut(&mut self, slot: PartySlot) -> &mut Pairing {
        match slot {
            PartySlot::A => &mut self.party_a,
            PartySlot::B => &mut self.party_b,
        }
    }

    fn endpoint(&self, slot: PartySlot) -> &PartyEndpoint {
        match slot {
            PartySlot::A => &self.config.party_a,
            PartySlot::B => &self.config.party_b,
        }
    }

    fn exchange(&mut self, slot: PartySlot) -> Result<()> {
        let endpoint = self.endpoint(slot);
        let port = endpoint.port;
        let exchange = KeyExchange::with_mode(
            endpoint.params,
            self.config.private_exponent,
            self.config.exponentiation,
        );

        info!("Waiting for {}'s public value", endpoint.name);
        let key = crypto::answer_exchange(&mut self.link, &exchange, port)?;
        self.pairing_mut(slot).session_key = Some(key);
        Ok(())
    }

    fn prompt(&mut self, slot: PartySlot) -> Result<()> {
        let Some(key) = self.pairing(slot).session_key else {
            return invalid_state_err!(format!("session key for party {}", slot), self.phase);
        };
        let (a, b) = (&self.config.party_a.name, &self.config.party_b.name);
        let (text, port) = match slot {
            PartySlot::A => (initiator_prompt(a, b), self.config.party_a.port),
            PartySlot::B => (responder_prompt(b, a), self.config.party_b.port),
        };

        let cipher = key.cipher();
        self.link.send(port, &crypto::seal(&cipher, &text), MessageKind::Prompt);

        let reply = self.link.receive(MessageKind::PairKey);
        let pair_key = parse_hex_key(&cipher.decrypt(&reply))?;

        info!("Received pair key from {}", self.endpoint(slot).name);
        self.pairing_mut(slot).pair_key = Some(pair_key);
        Ok(())
    }

    fn distribute(&mut self) -> Result<()> {
        let (Some(key_a), Some(key_b), Some(pair_a), Some(pair_b)) = (
            self.party_a.session_key,
            self.party_b.session_key,
            self.party_a.pair_key,
            self.party_b.pair_key,
        ) else {
            return invalid_state_err!(CenterPhase::PromptPartyBForPairKey, self.phase);
        };

        let shared_key = key_a.combine(key_b);
        let timestamp_ms = (self.clock)();
        let cipher_a = BlockCipher::new(pair_a);
        let cipher_b = BlockCipher::new(pair_b);
        let port = self.config.party_a.port;
        let shared_text = shared_key.to_string();

        // all three go to A; the last two are relayed to B untouched
        self.link.send(port, &crypto::seal(&cipher_a, &shared_text), MessageKind::SharedKey);
        self.link.send(port, &crypto::seal(&cipher_b, &shared_text), MessageKind::SharedKey);
        self.link.send(
            port,
            &crypto::seal(&cipher_b, &timestamp_ms.to_string()),
            MessageKind::Timestamp,
        );

        info!("Distributed shared key to {}", self.config.party_a.name);
        self.outcome = Some(CenterOutcome {
            shared_key,
            timestamp_ms,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::DhParameters;
    use crate::core::message::parse_decimal;
    use crate::protocol::transport::{MemoryNetwork, MemoryTransport};
    use std::thread;

    const FIXED_MS: u64 = 1_700_000_000_000;

    fn config() -> CenterConfig {
        let mut config = CenterConfig::default();
        config.party_b.params = DhParameters {
            modulus: 353,
            generator: 3,
        };
        config
    }

    /// Play one party's half of the exchange and prompt by hand
    fn play_party(
        link: &mut Link<MemoryTransport>,
        params: DhParameters,
        pair_key: &str,
    ) -> (SessionKey, String) {
        let key = crypto::open_exchange(link, &KeyExchange::new(params, 3), 5000).unwrap();
        let prompt = crypto::open(&key.cipher(), &link.receive(MessageKind::Prompt));
        link.send(5000, &crypto::seal(&key.cipher(), pair_key), MessageKind::PairKey);
        (key, prompt)
    }

    #[test]
    fn test_full_run_against_scripted_parties() {
        let network = MemoryNetwork::new();
        let center = KeyDistributionCenter::new(config(), network.bind(5000))
            .unwrap()
            .with_clock(|| FIXED_MS);
        let mut party_a = Link::new(network.bind(5001));
        let mut party_b = Link::new(network.bind(5002));

        let handle = thread::spawn(move || {
            let mut center = center;
            let outcome = center.run().unwrap();
            (center, outcome)
        });

        let (key_a, prompt_a) = play_party(&mut party_a, config().party_a.params, "1a3");
        let (key_b, prompt_b) = play_party(&mut party_b, config().party_b.params, "2d7");
        let (center, outcome) = handle.join().unwrap();

        assert_eq!(key_a.value(), 1003);
        assert!(prompt_a.starts_with("Hello Thor,provide secret key"));
        assert!(prompt_b.starts_with("Hello Iron Man, Thor wants"));
        assert_eq!(center.phase(), CenterPhase::Done);
        assert_eq!(center.session_key(PartySlot::A), Some(key_a));
        assert_eq!(center.session_key(PartySlot::B), Some(key_b));
        assert_eq!(center.pair_key(PartySlot::A), Some(0x1a3));
        assert_eq!(center.pair_key(PartySlot::B), Some(0x2d7));
        assert_eq!(outcome.shared_key, key_a.combine(key_b));
        assert_eq!(outcome.timestamp_ms, FIXED_MS);

        // distribution goes to A only, in a fixed order
        assert_eq!(network.pending(5001), 3);
        assert_eq!(network.pending(5002), 0);
        let cipher_a = BlockCipher::new(0x1a3);
        let cipher_b = BlockCipher::new(0x2d7);
        let for_a: u16 = parse_decimal(&cipher_a.decrypt(&party_a.receive(MessageKind::SharedKey)), "shared key").unwrap();
        let for_b: u16 = parse_decimal(&cipher_b.decrypt(&party_a.receive(MessageKind::SharedKey)), "shared key").unwrap();
        let stamp: u64 = parse_decimal(&cipher_b.decrypt(&party_a.receive(MessageKind::Timestamp)), "timestamp").unwrap();
        assert_eq!(for_a, outcome.shared_key.value());
        assert_eq!(for_b, outcome.shared_key.value());
        assert_eq!(stamp, FIXED_MS);
    }

    #[test]
    fn test_malformed_public_value_keeps_phase() {
        let network = MemoryNetwork::new();
        let mut center = KeyDistributionCenter::new(config(), network.bind(5000)).unwrap();
        network.deliver(5000, "not a number".into()).unwrap();

        let result = center.advance();
        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(center.phase(), CenterPhase::Init);
        assert_eq!(center.session_key(PartySlot::A), None);
    }

    #[test]
    fn test_malformed_pair_key_keeps_phase() {
        let network = MemoryNetwork::new();
        let mut center = KeyDistributionCenter::new(config(), network.bind(5000)).unwrap();
        let mut party_a = Link::new(network.bind(5001));

        network.deliver(5000, "10".into()).unwrap();
        assert_eq!(center.advance().unwrap(), CenterPhase::ExchangeWithPartyA);
        assert_eq!(&party_a.receive(MessageKind::PublicValue)[..], b"11");

        let key = center.session_key(PartySlot::A).unwrap();
        network
            .deliver(5000, crypto::seal(&key.cipher(), "xyz").into())
            .unwrap();
        assert!(matches!(center.advance(), Err(Error::Parse(_))));
        assert_eq!(center.phase(), CenterPhase::ExchangeWithPartyA);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.party_a.params.modulus = 0;
        let result = KeyDistributionCenter::new(config, MemoryNetwork::new().bind(5000));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
