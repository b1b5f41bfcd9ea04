/*!
Party establishment.

[`Party`] walks [`PartyPhase`] for its [`PartyRole`]. The initiator receives
the shared key from the center together with two payloads for the responder,
which it forwards without being able to read them. The responder takes its
copy of the shared key and the center's timestamp from those payloads.

The relayed payloads carry no integrity tag; a tampered relay is not
detected.
*/

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    core::{
        config::PartyConfig,
        constants::{keys::MAX_PAIR_KEY, timing::POLL_SLICE},
        crypto::{BlockCipher, KeyExchange, SessionKey, SharedSessionKey},
        error::{Error, Result},
        message::{MessageKind, format_hex_key, parse_decimal, parse_hex_key},
        session::{PartyPhase, PartyRole},
    },
    invalid_state_err,
    protocol::{
        shared::{
            crypto,
            traits::{Operator, Transport},
            utils::{printable, timestamp_age, unix_millis},
        },
        transport::{Link, UdpTransport},
    },
};

/// Where a party's pair key comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairKeySource {
    /// Typed by the operator in answer to the center's prompt
    #[default]
    Operator,
    /// Drawn at random from the three hex digit range
    Random,
    /// A fixed key
    Fixed(u16),
}

/// One party of a KDC run
pub struct Party<T: Transport> {
    pub(crate) config: PartyConfig,
    pub(crate) link: Link<T>,
    pub(crate) phase: PartyPhase,
    pub(crate) poll_slice: Duration,
    key_source: PairKeySource,
    session_key: Option<SessionKey>,
    pair_key: Option<u16>,
    shared_key: Option<SharedSessionKey>,
    relayed_timestamp: Option<u64>,
    prompt: Option<String>,
    clock: fn() -> u64,
}

impl Party<UdpTransport> {
    /// Bind the configured UDP port and create a party on it.
    pub fn bind(config: PartyConfig) -> Result<Self> {
        config.validate()?;
        let transport = UdpTransport::bind(config.bind_addr()?)?;
        Self::new(config, transport)
    }
}

impl<T: Transport> Party<T> {
    /// Create a party over an existing transport.
    pub fn new(config: PartyConfig, transport: T) -> Result<Self> {
        config.validate()?;
        info!(
            "{} ({}) ready on port {}",
            config.name,
            config.role,
            transport.local_port()
        );

        Ok(Self {
            config,
            link: Link::new(transport),
            phase: PartyPhase::Init,
            poll_slice: POLL_SLICE,
            key_source: PairKeySource::default(),
            session_key: None,
            pair_key: None,
            shared_key: None,
            relayed_timestamp: None,
            prompt: None,
            clock: unix_millis,
        })
    }

    /// Choose where the pair key comes from
    pub fn with_key_source(mut self, source: PairKeySource) -> Self {
        self.key_source = source;
        self
    }

    /// Replace the clock used to age relayed timestamps
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Set how long the messaging loop waits on the socket per turn
    pub fn with_poll_slice(mut self, slice: Duration) -> Self {
        self.poll_slice = slice.max(Duration::from_millis(1));
        self
    }

    /// Current phase
    pub fn phase(&self) -> PartyPhase {
        self.phase
    }

    /// Initiator or responder
    pub fn role(&self) -> PartyRole {
        self.config.role
    }

    /// Configuration in use
    pub fn config(&self) -> &PartyConfig {
        &self.config
    }

    /// Key agreed with the center
    pub fn session_key(&self) -> Option<SessionKey> {
        self.session_key
    }

    /// Pair key submitted to the center
    pub fn pair_key(&self) -> Option<u16> {
        self.pair_key
    }

    /// Key shared with the peer
    pub fn shared_key(&self) -> Option<SharedSessionKey> {
        self.shared_key
    }

    /// Timestamp relayed from the center (responder only)
    pub fn relayed_timestamp(&self) -> Option<u64> {
        self.relayed_timestamp
    }

    /// The center's decrypted prompt
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Perform the next phase's work and move to it.
    pub fn advance<O: Operator>(&mut self, operator: &mut O) -> Result<PartyPhase> {
        let Some(next) = self.phase.next(self.config.role) else {
            return invalid_state_err!("a phase before Messaging", self.phase);
        };

        match next {
            PartyPhase::ExchangeWithCenter => self.exchange()?,
            PartyPhase::AwaitPrompt => self.await_prompt(operator)?,
            PartyPhase::SubmitPairKey => self.submit_pair_key(operator)?,
            PartyPhase::ReceiveSharedKey => self.receive_shared_key()?,
            PartyPhase::RelayPeerPayload => self.relay_peer_payload(),
            PartyPhase::AcceptRelayedKey => self.accept_relayed_key()?,
            PartyPhase::Messaging => info!("{} ready to message {}", self.config.name, self.config.peer_name),
            PartyPhase::Init => {
                return Err(Error::Internal("Init has no predecessor".into()));
            }
        }

        debug!("{} phase {} -> {}", self.config.name, self.phase, next);
        self.phase = next;
        Ok(next)
    }

    /// Advance until the shared key is known and messaging can start.
    pub fn establish<O: Operator>(&mut self, operator: &mut O) -> Result<SharedSessionKey> {
        while self.phase != PartyPhase::Messaging {
            self.advance(operator)?;
        }
        self.shared_key
            .ok_or_else(|| Error::Internal("established without a shared key".into()))
    }

    fn exchange(&mut self) -> Result<()> {
        let exchange = KeyExchange::with_mode(
            self.config.params,
            self.config.private_exponent,
            self.config.exponentiation,
        );
        let key = crypto::open_exchange(&mut self.link, &exchange, self.config.center_port)?;
        self.session_key = Some(key);
        Ok(())
    }

    fn session_cipher(&self) -> Result<BlockCipher> {
        match self.session_key {
            Some(key) => Ok(key.cipher()),
            None => invalid_state_err!(PartyPhase::ExchangeWithCenter, self.phase),
        }
    }

    fn pair_cipher(&self) -> Result<BlockCipher> {
        match self.pair_key {
            Some(key) => Ok(BlockCipher::new(key)),
            None => invalid_state_err!(PartyPhase::SubmitPairKey, self.phase),
        }
    }

    fn await_prompt<O: Operator>(&mut self, operator: &mut O) -> Result<()> {
        let cipher = self.session_cipher()?;
        let payload = self.link.receive(MessageKind::Prompt);
        let text = crypto::open(&cipher, &payload);

        operator.display(&text);
        self.prompt = Some(text);
        Ok(())
    }

    fn submit_pair_key<O: Operator>(&mut self, operator: &mut O) -> Result<()> {
        let cipher = self.session_cipher()?;
        let key_text = match self.key_source {
            PairKeySource::Operator => operator.read_line()?.unwrap_or_default(),
            PairKeySource::Random => {
                let key = rand::rng().random_range(0..=MAX_PAIR_KEY);
                info!("Generated pair key {}", format_hex_key(key));
                format_hex_key(key)
            }
            PairKeySource::Fixed(key) => format_hex_key(key),
        };
        let key_text = key_text.trim();

        // the center sees whatever was typed, valid or not
        self.link.send(
            self.config.center_port,
            &crypto::seal(&cipher, key_text),
            MessageKind::PairKey,
        );
        let pair_key = parse_hex_key(key_text.as_bytes())?;

        info!("{} submitted pair key", self.config.name);
        self.pair_key = Some(pair_key);
        Ok(())
    }

    fn receive_shared_key(&mut self) -> Result<()> {
        let cipher = self.pair_cipher()?;
        let payload = self.link.receive(MessageKind::SharedKey);
        let value: u16 = parse_decimal(&cipher.decrypt(&payload), "shared key")?;

        info!("{} received the shared key", self.config.name);
        self.shared_key = Some(SharedSessionKey::from_value(value));
        Ok(())
    }

    fn relay_peer_payload(&mut self) {
        let port = self.config.peer_port;
        for kind in [MessageKind::SharedKey, MessageKind::Timestamp] {
            let payload = self.link.receive(kind);
            debug!("Relaying {} to port {}: {}", kind, port, printable(&payload));
            self.link.send(port, &payload, kind);
        }
        info!("Relayed {}'s payloads", self.config.peer_name);
    }

    fn accept_relayed_key(&mut self) -> Result<()> {
        let cipher = self.pair_cipher()?;

        let payload = self.link.receive(MessageKind::SharedKey);
        let value: u16 = parse_decimal(&cipher.decrypt(&payload), "shared key")?;
        let payload = self.link.receive(MessageKind::Timestamp);
        let timestamp: u64 = parse_decimal(&cipher.decrypt(&payload), "timestamp")?;

        let age = timestamp_age(timestamp, (self.clock)());
        if age > self.config.max_timestamp_age() {
            warn!(
                "Relayed key is stale: issued {:?} ago, limit {:?}",
                age,
                self.config.max_timestamp_age()
            );
        } else {
            info!("Relayed key issued {:?} ago", age);
        }

        self.shared_key = Some(SharedSessionKey::from_value(value));
        self.relayed_timestamp = Some(timestamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::console::ScriptedOperator;
    use crate::protocol::transport::{MemoryNetwork, MemoryTransport};

    const NOW_MS: u64 = 1_700_000_000_000;

    fn center_link(network: &MemoryNetwork) -> Link<MemoryTransport> {
        Link::new(network.bind(5000))
    }

    #[test]
    fn test_initiator_steps() {
        let network = MemoryNetwork::new();
        let mut center = center_link(&network);
        let mut peer = Link::new(network.bind(5002));
        let mut party = Party::new(PartyConfig::initiator(), network.bind(5001)).unwrap();
        let mut operator = ScriptedOperator::with_lines(["1a3"]);

        // the center's answer can be queued before the party speaks
        network.deliver(5001, "11".into()).unwrap();
        assert_eq!(party.advance(&mut operator).unwrap(), PartyPhase::ExchangeWithCenter);
        assert_eq!(&center.receive(MessageKind::PublicValue)[..], b"10");
        let session = party.session_key().unwrap();
        assert_eq!(session.value(), 1003);

        network
            .deliver(5001, crypto::seal(&session.cipher(), "Hello Thor").into())
            .unwrap();
        party.advance(&mut operator).unwrap();
        assert_eq!(party.prompt(), Some("Hello Thor"));
        assert_eq!(operator.displayed(), &["Hello Thor".to_string()]);

        party.advance(&mut operator).unwrap();
        assert_eq!(party.pair_key(), Some(0x1a3));
        let submitted = center.receive(MessageKind::PairKey);
        assert_eq!(crypto::open(&session.cipher(), &submitted), "1a3");

        let pair = BlockCipher::new(0x1a3);
        network.deliver(5001, crypto::seal(&pair, "42").into()).unwrap();
        network.deliver(5001, bytes::Bytes::from_static(&[0x6D, 0x00, 0xFB])).unwrap();
        network.deliver(5001, bytes::Bytes::from_static(b"opaque")).unwrap();

        party.advance(&mut operator).unwrap();
        assert_eq!(party.shared_key(), Some(SharedSessionKey::from_value(42)));

        assert_eq!(party.advance(&mut operator).unwrap(), PartyPhase::RelayPeerPayload);
        assert_eq!(&peer.receive(MessageKind::SharedKey)[..], &[0x6D, 0x00, 0xFB]);
        assert_eq!(&peer.receive(MessageKind::Timestamp)[..], b"opaque");

        assert_eq!(party.advance(&mut operator).unwrap(), PartyPhase::Messaging);
        assert!(matches!(
            party.advance(&mut operator),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_responder_accepts_relay() {
        let network = MemoryNetwork::new();
        let _center = center_link(&network);
        let mut party = Party::new(PartyConfig::responder(), network.bind(5002))
            .unwrap()
            .with_key_source(PairKeySource::Fixed(0x2d7))
            .with_clock(|| NOW_MS);
        let mut operator = ScriptedOperator::default();

        let session = SessionKey::derive(20);
        network.deliver(5002, "11".into()).unwrap();
        network
            .deliver(5002, crypto::seal(&session.cipher(), "Hello Iron Man").into())
            .unwrap();

        let pair = BlockCipher::new(0x2d7);
        let issued = NOW_MS - 500;
        network.deliver(5002, crypto::seal(&pair, "617").into()).unwrap();
        network
            .deliver(5002, crypto::seal(&pair, &issued.to_string()).into())
            .unwrap();

        let shared = party.establish(&mut operator).unwrap();
        assert_eq!(shared.value(), 617);
        assert_eq!(party.relayed_timestamp(), Some(issued));
        assert_eq!(party.phase(), PartyPhase::Messaging);
    }

    #[test]
    fn test_bad_pair_key_is_still_sent() {
        let network = MemoryNetwork::new();
        let mut center = center_link(&network);
        let mut party = Party::new(PartyConfig::initiator(), network.bind(5001)).unwrap();
        let mut operator = ScriptedOperator::with_lines(["zzz"]);

        let session = SessionKey::derive(20);
        network.deliver(5001, "11".into()).unwrap();
        network
            .deliver(5001, crypto::seal(&session.cipher(), "prompt").into())
            .unwrap();
        party.advance(&mut operator).unwrap();
        party.advance(&mut operator).unwrap();
        center.receive(MessageKind::PublicValue);

        assert!(matches!(party.advance(&mut operator), Err(Error::Parse(_))));
        assert_eq!(party.phase(), PartyPhase::AwaitPrompt);
        assert_eq!(crypto::open(&session.cipher(), &center.receive(MessageKind::PairKey)), "zzz");
    }

    #[test]
    fn test_random_pair_key_in_range() {
        let network = MemoryNetwork::new();
        let _center = center_link(&network);
        let mut party = Party::new(PartyConfig::initiator(), network.bind(5001))
            .unwrap()
            .with_key_source(PairKeySource::Random);
        let mut operator = ScriptedOperator::default();

        network.deliver(5001, "11".into()).unwrap();
        network
            .deliver(5001, crypto::seal(&SessionKey::derive(20).cipher(), "prompt").into())
            .unwrap();
        for _ in 0..3 {
            party.advance(&mut operator).unwrap();
        }
        assert!(party.pair_key().unwrap() <= MAX_PAIR_KEY);
    }

    #[test]
    fn test_malformed_center_value_keeps_phase() {
        let network = MemoryNetwork::new();
        let _center = center_link(&network);
        let mut party = Party::new(PartyConfig::initiator(), network.bind(5001)).unwrap();

        network.deliver(5001, "eleven".into()).unwrap();
        let result = party.advance(&mut ScriptedOperator::default());
        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(party.phase(), PartyPhase::Init);
    }
}
