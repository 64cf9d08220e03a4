//! Channel id allocation and DCEP handshake handling shared by every data
//! channel on a connection.

use std::collections::HashMap;

use util::StateLock;

use crate::channel::DataChannel;
use crate::message::{ChannelAck, ChannelOpen, DcepMessage};

/// What processing one inbound DCEP message produced.
#[derive(Debug, Default)]
pub struct DcepOutcome {
    /// A DCEP message to send back to the peer (an ACK for a fresh OPEN).
    pub response: Option<Vec<u8>>,
    /// A channel that just transitioned to `open` as a result.
    pub opened: Option<DataChannel>,
}

struct Inner {
    next_id: u16,
    channels: HashMap<u16, DataChannel>,
}

/// Tracks every data channel on one association and assigns stream ids with
/// the even/odd parity RFC 8831 uses to keep initiator and responder
/// allocations disjoint.
pub struct ChannelManager {
    inner: StateLock<Inner>,
}

impl ChannelManager {
    /// `is_initiator` selects the starting parity: 0, 2, 4, … for an
    /// initiator, 1, 3, 5, … for a responder.
    pub fn new(is_initiator: bool) -> Self {
        Self {
            inner: StateLock::new(Inner {
                next_id: if is_initiator { 0 } else { 1 },
                channels: HashMap::new(),
            }),
        }
    }

    /// Allocates the next local stream id and records a `connecting`
    /// channel for it, returning the DATA_CHANNEL_OPEN bytes to send.
    pub fn open_channel(&self, label: &str, protocol: &str, ordered: bool) -> (u16, Vec<u8>) {
        self.inner.with(|s| {
            let id = s.next_id;
            s.next_id = s.next_id.wrapping_add(2);

            let channel_type = if ordered {
                crate::message::CHANNEL_TYPE_RELIABLE
            } else {
                crate::message::CHANNEL_TYPE_RELIABLE_UNORDERED
            };
            let open = ChannelOpen {
                channel_type,
                priority: 0,
                reliability_parameter: 0,
                label: label.to_string(),
                protocol: protocol.to_string(),
            };
            s.channels.insert(
                id,
                DataChannel::new(id, label.to_string(), protocol.to_string(), ordered),
            );
            (id, open.encode())
        })
    }

    /// Feeds one DCEP message (PPID 50) received on `stream_id`.
    pub fn process(&self, stream_id: u16, payload: &[u8]) -> Result<DcepOutcome, crate::Error> {
        match DcepMessage::decode(payload)? {
            DcepMessage::Open(open) => Ok(self.handle_open(stream_id, open)),
            DcepMessage::Ack => Ok(self.handle_ack(stream_id)),
        }
    }

    fn handle_open(&self, stream_id: u16, open: ChannelOpen) -> DcepOutcome {
        self.inner.with(|s| {
            let ordered = open.ordered();
            let channel =
                DataChannel::opened_remotely(stream_id, open.label, open.protocol, ordered);
            s.channels.insert(stream_id, channel.clone());
            DcepOutcome {
                response: Some(ChannelAck.encode()),
                opened: Some(channel),
            }
        })
    }

    fn handle_ack(&self, stream_id: u16) -> DcepOutcome {
        self.inner.with(|s| {
            let opened = s.channels.get_mut(&stream_id).map(|channel| {
                channel.acknowledge();
                channel.clone()
            });
            DcepOutcome {
                response: None,
                opened,
            }
        })
    }

    pub fn channel(&self, stream_id: u16) -> Option<DataChannel> {
        self.inner.with(|s| s.channels.get(&stream_id).cloned())
    }

    pub fn close_channel(&self, stream_id: u16) {
        self.inner.with(|s| {
            if let Some(channel) = s.channels.get_mut(&stream_id) {
                channel.close();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiator_ids_are_even() {
        let manager = ChannelManager::new(true);
        let (first, _) = manager.open_channel("a", "", true);
        let (second, _) = manager.open_channel("b", "", true);
        let (third, _) = manager.open_channel("c", "", true);
        assert_eq!([first, second, third], [0, 2, 4]);
    }

    #[test]
    fn responder_ids_are_odd() {
        let manager = ChannelManager::new(false);
        let (first, _) = manager.open_channel("a", "", true);
        let (second, _) = manager.open_channel("b", "", true);
        assert_eq!([first, second], [1, 3]);
    }

    #[test]
    fn remote_open_creates_open_channel_and_emits_ack() {
        let manager = ChannelManager::new(true);
        let open = ChannelOpen {
            channel_type: crate::message::CHANNEL_TYPE_RELIABLE,
            priority: 0,
            reliability_parameter: 0,
            label: "chat".into(),
            protocol: "".into(),
        };
        let outcome = manager.process(1, &open.encode()).unwrap();
        assert_eq!(outcome.response, Some(ChannelAck.encode()));
        let opened = outcome.opened.unwrap();
        assert!(opened.is_open());
        assert_eq!(manager.channel(1).unwrap().state(), opened.state());
    }

    #[test]
    fn ack_transitions_connecting_channel_to_open() {
        let manager = ChannelManager::new(true);
        let (id, _) = manager.open_channel("chat", "", true);
        assert_eq!(
            manager.channel(id).unwrap().state(),
            crate::channel::ChannelState::Connecting
        );

        let outcome = manager.process(id, &ChannelAck.encode()).unwrap();
        assert!(outcome.response.is_none());
        assert!(manager.channel(id).unwrap().is_open());
    }
}
