//! A single logical data channel: one SCTP stream id plus the DCEP
//! handshake state layered on top of it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChannel {
    pub id: u16,
    pub label: String,
    pub protocol: String,
    pub ordered: bool,
    state: ChannelState,
}

impl DataChannel {
    pub fn new(id: u16, label: String, protocol: String, ordered: bool) -> Self {
        Self {
            id,
            label,
            protocol,
            ordered,
            state: ChannelState::Connecting,
        }
    }

    /// A channel created directly from a remote OPEN is already `open`:
    /// the peer only sends OPEN once it is ready to exchange data.
    pub fn opened_remotely(id: u16, label: String, protocol: String, ordered: bool) -> Self {
        Self {
            id,
            label,
            protocol,
            ordered,
            state: ChannelState::Open,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Our local OPEN was acknowledged; only valid from `connecting`.
    pub fn acknowledge(&mut self) {
        if self.state == ChannelState::Connecting {
            self.state = ChannelState::Open;
        }
    }

    pub fn begin_closing(&mut self) {
        if self.state == ChannelState::Open {
            self.state = ChannelState::Closing;
        }
    }

    pub fn close(&mut self) {
        self.state = ChannelState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_open_transitions_on_ack() {
        let mut channel = DataChannel::new(0, "chat".into(), "".into(), true);
        assert_eq!(channel.state(), ChannelState::Connecting);
        channel.acknowledge();
        assert_eq!(channel.state(), ChannelState::Open);
    }

    #[test]
    fn remote_open_starts_open() {
        let channel = DataChannel::opened_remotely(1, "chat".into(), "".into(), true);
        assert!(channel.is_open());
    }

    #[test]
    fn close_is_terminal() {
        let mut channel = DataChannel::opened_remotely(1, "x".into(), "".into(), true);
        channel.begin_closing();
        assert_eq!(channel.state(), ChannelState::Closing);
        channel.close();
        assert_eq!(channel.state(), ChannelState::Closed);
        channel.acknowledge();
        assert_eq!(channel.state(), ChannelState::Closed);
    }
}
