/*!
Messaging between the two parties once they share a key.

The loop waits on two sources: datagrams from the peer and lines from the
operator. It alternates between them in short slices so neither starves.
Inbound datagrams are decrypted under the shared key and displayed; operator
lines are encrypted and sent to the peer. When nothing happens for the idle
window the loop logs it and keeps waiting. It ends when operator input closes.
*/

use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    core::{
        crypto::BlockCipher,
        error::{Error, Result},
        message::MessageKind,
        session::PartyPhase,
    },
    invalid_state_err,
    protocol::shared::{
        crypto,
        traits::{Operator, OperatorInput, Transport},
    },
};

use super::endpoint::Party;

/// Counters for one messaging session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagingStats {
    /// Lines sent to the peer
    pub sent: usize,
    /// Datagrams received from the peer
    pub received: usize,
    /// Idle windows that passed without activity
    pub idle_periods: usize,
}

enum Activity {
    Datagram(Bytes),
    Line(String),
    Idle,
    Closed,
}

impl<T: Transport> Party<T> {
    /// Exchange messages with the peer until operator input closes.
    pub fn run_messaging<O: Operator>(&mut self, operator: &mut O) -> Result<MessagingStats> {
        if self.phase != PartyPhase::Messaging {
            return invalid_state_err!(PartyPhase::Messaging, self.phase);
        }
        let cipher = self
            .shared_key()
            .map(|key| key.cipher())
            .ok_or_else(|| Error::Internal("messaging without a shared key".into()))?;
        let idle = self.config.idle_timeout();
        let mut stats = MessagingStats::default();

        info!("{} messaging with {}", self.config.name, self.config.peer_name);
        loop {
            match self.wait_for_activity(operator, idle)? {
                Activity::Datagram(payload) => {
                    let text = crypto::open(&cipher, &payload);
                    operator.display(&format!("{}: {}", self.config.peer_name, text));
                    stats.received += 1;
                }
                Activity::Line(line) => {
                    self.send_message(&cipher, &line);
                    stats.sent += 1;
                }
                Activity::Idle => {
                    warn!("No activity for {:?}", idle);
                    stats.idle_periods += 1;
                }
                Activity::Closed => break,
            }
        }

        info!(
            "{} stopped messaging: {} sent, {} received",
            self.config.name, stats.sent, stats.received
        );
        Ok(stats)
    }

    fn send_message(&mut self, cipher: &BlockCipher, line: &str) {
        let payload = crypto::seal(cipher, line);
        debug!("Sending {} bytes to {}", payload.len(), self.config.peer_name);
        self.link.send(self.config.peer_port, &payload, MessageKind::Chat);
    }

    fn wait_for_activity<O: Operator>(&mut self, operator: &mut O, idle: Duration) -> Result<Activity> {
        let started = Instant::now();
        loop {
            if let Some(payload) = self.link.receive_timeout(self.poll_slice, MessageKind::Chat) {
                return Ok(Activity::Datagram(payload));
            }

            match operator.poll_line(Duration::ZERO)? {
                OperatorInput::Line(line) => return Ok(Activity::Line(line)),
                OperatorInput::Closed => return Ok(Activity::Closed),
                OperatorInput::Pending => {}
            }

            if started.elapsed() >= idle {
                return Ok(Activity::Idle);
            }
        }
    }
}
