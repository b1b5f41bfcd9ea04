/*!
Protocol phases for the KDC protocol.

Both orchestrators are explicit state machines. A phase names the last step
that completed; advancing performs the work of the following phase.
*/

use std::fmt;

/// Center progress through a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CenterPhase {
    /// Nothing exchanged yet
    Init,
    /// Session key agreed with party A
    ExchangeWithPartyA,
    /// Party A's pair key received
    PromptPartyAForPairKey,
    /// Session key agreed with party B
    ExchangeWithPartyB,
    /// Party B's pair key received
    PromptPartyBForPairKey,
    /// Shared key and timestamp sent to party A
    DistributeSharedKey,
    /// Run complete; not restartable
    Done,
}

impl CenterPhase {
    /// The phase that follows, or `None` once done
    pub fn next(self) -> Option<Self> {
        match self {
            CenterPhase::Init => Some(CenterPhase::ExchangeWithPartyA),
            CenterPhase::ExchangeWithPartyA => Some(CenterPhase::PromptPartyAForPairKey),
            CenterPhase::PromptPartyAForPairKey => Some(CenterPhase::ExchangeWithPartyB),
            CenterPhase::ExchangeWithPartyB => Some(CenterPhase::PromptPartyBForPairKey),
            CenterPhase::PromptPartyBForPairKey => Some(CenterPhase::DistributeSharedKey),
            CenterPhase::DistributeSharedKey => Some(CenterPhase::Done),
            CenterPhase::Done => None,
        }
    }

    /// Whether the run has finished
    pub fn is_terminal(self) -> bool {
        self == CenterPhase::Done
    }
}

impl fmt::Display for CenterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CenterPhase::Init => write!(f, "Init"),
            CenterPhase::ExchangeWithPartyA => write!(f, "ExchangeWithPartyA"),
            CenterPhase::PromptPartyAForPairKey => write!(f, "PromptPartyAForPairKey"),
            CenterPhase::ExchangeWithPartyB => write!(f, "ExchangeWithPartyB"),
            CenterPhase::PromptPartyBForPairKey => write!(f, "PromptPartyBForPairKey"),
            CenterPhase::DistributeSharedKey => write!(f, "DistributeSharedKey"),
            CenterPhase::Done => write!(f, "Done"),
        }
    }
}

/// Which side of the pair a party plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    /// Party A: talks to the center first and relays B's payloads
    Initiator,
    /// Party B: receives its copy of the shared key from A
    Responder,
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyRole::Initiator => write!(f, "Initiator"),
            PartyRole::Responder => write!(f, "Responder"),
        }
    }
}

/// Party progress up to the messaging loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyPhase {
    /// Nothing exchanged yet
    Init,
    /// Session key agreed with the center
    ExchangeWithCenter,
    /// Center's prompt decrypted
    AwaitPrompt,
    /// Pair key submitted
    SubmitPairKey,
    /// Shared key decrypted (initiator)
    ReceiveSharedKey,
    /// Peer's payloads forwarded (initiator)
    RelayPeerPayload,
    /// Relayed shared key and timestamp decrypted (responder)
    AcceptRelayedKey,
    /// Ready for the messaging loop
    Messaging,
}

impl PartyPhase {
    /// The phase that follows for `role`, or `None` once messaging
    pub fn next(self, role: PartyRole) -> Option<Self> {
        match (self, role) {
            (PartyPhase::Init, _) => Some(PartyPhase::ExchangeWithCenter),
            (PartyPhase::ExchangeWithCenter, _) => Some(PartyPhase::AwaitPrompt),
            (PartyPhase::AwaitPrompt, _) => Some(PartyPhase::SubmitPairKey),
            (PartyPhase::SubmitPairKey, PartyRole::Initiator) => Some(PartyPhase::ReceiveSharedKey),
            (PartyPhase::SubmitPairKey, PartyRole::Responder) => Some(PartyPhase::AcceptRelayedKey),
            (PartyPhase::ReceiveSharedKey, PartyRole::Initiator) => Some(PartyPhase::RelayPeerPayload),
            (PartyPhase::RelayPeerPayload, PartyRole::Initiator) => Some(PartyPhase::Messaging),
            (PartyPhase::AcceptRelayedKey, PartyRole::Responder) => Some(PartyPhase::Messaging),
            _ => None,
        }
    }
}

impl fmt::Display for PartyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyPhase::Init => write!(f, "Init"),
            PartyPhase::ExchangeWithCenter => write!(f, "ExchangeWithCenter"),
            PartyPhase::AwaitPrompt => write!(f, "AwaitPrompt"),
            PartyPhase::SubmitPairKey => write!(f, "SubmitPairKey"),
            PartyPhase::ReceiveSharedKey => write!(f, "ReceiveSharedKey"),
            PartyPhase::RelayPeerPayload => write!(f, "RelayPeerPayload"),
            PartyPhase::AcceptRelayedKey => write!(f, "AcceptRelayedKey"),
            PartyPhase::Messaging => write!(f, "Messaging"),
        }
    }
}
