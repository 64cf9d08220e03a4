//! The SCTP association: the four-way cookie handshake, TSN tracking,
//! fragment reassembly, and retransmission in one state machine per peer.

use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use util::{SecureRng, StateLock};

use crate::chunk::sack::Sack;
use crate::chunk::{Chunk, CookieEcho, Data, Heartbeat, Init, InitAck, Shutdown};
use crate::cookie::{Cookie, SECRET_LEN};
use crate::error::Error;
use crate::header::Header;
use crate::packet::Packet;
use crate::reassembly::{AssembledMessage, Reassembler};
use crate::retransmission::RetransmissionQueue;
use crate::state::{AssociationState, Role};
use crate::tsn_tracker::TsnTracker;

const DEFAULT_A_RWND: u32 = 128 * 1024;
const DEFAULT_STREAMS: u16 = 64;
const COOKIE_MAX_AGE_MS: u64 = 60_000;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Everything the caller needs to do after feeding one inbound datagram:
/// packets to send back, and application messages ready for dispatch.
#[derive(Debug, Default)]
pub struct ProcessOutcome {
    pub response_packets: Vec<Vec<u8>>,
    pub delivered: Vec<AssembledMessage>,
}

struct Inner {
    role: Role,
    state: AssociationState,
    local_port: u16,
    remote_port: u16,
    local_verification_tag: u32,
    remote_verification_tag: u32,
    local_initial_tsn: u32,
    next_tsn: u32,
    next_stream_seq: HashMap<u16, u16>,
    peer_a_rwnd: u32,
    outbound_streams: u16,
    inbound_streams: u16,
    tsn_tracker: Option<TsnTracker>,
    reassembler: Reassembler,
    retransmission: RetransmissionQueue,
    cookie_secret: [u8; SECRET_LEN],
    pending_cookie: Option<Vec<u8>>,
}

pub struct Association {
    inner: StateLock<Inner>,
}

impl Association {
    pub fn new(role: Role, local_port: u16, remote_port: u16) -> Self {
        let rng = SecureRng::new();
        let local_verification_tag = rng.random_u32();
        let local_initial_tsn = rng.random_u32();
        let mut cookie_secret = [0_u8; SECRET_LEN];
        rng.fill_bytes(&mut cookie_secret);

        Self {
            inner: StateLock::new(Inner {
                role,
                state: AssociationState::Closed,
                local_port,
                remote_port,
                local_verification_tag,
                remote_verification_tag: 0,
                local_initial_tsn,
                next_tsn: local_initial_tsn,
                next_stream_seq: HashMap::new(),
                peer_a_rwnd: DEFAULT_A_RWND,
                outbound_streams: DEFAULT_STREAMS,
                inbound_streams: DEFAULT_STREAMS,
                tsn_tracker: None,
                reassembler: Reassembler::default(),
                retransmission: RetransmissionQueue::default(),
                cookie_secret,
                pending_cookie: None,
            }),
        }
    }

    pub fn state(&self) -> AssociationState {
        self.inner.with(|s| s.state)
    }

    pub fn role(&self) -> Role {
        self.inner.with(|s| s.role)
    }

    /// The cookie handed to the peer in INIT-ACK, echoed back verbatim in
    /// COOKIE-ECHO; `None` once the handshake completes.
    pub fn pending_cookie(&self) -> Option<Vec<u8>> {
        self.inner.with(|s| s.pending_cookie.clone())
    }

    /// Client role: builds the initial INIT packet and moves to COOKIE-WAIT.
    pub fn initiate(&self) -> Vec<u8> {
        self.inner.with(|s| {
            if s.role != Role::Client {
                warn!("initiate() called on a server-role association");
            }
            let init = Init {
                initiate_tag: s.local_verification_tag,
                a_rwnd: DEFAULT_A_RWND,
                outbound_streams: DEFAULT_STREAMS,
                inbound_streams: DEFAULT_STREAMS,
                initial_tsn: s.local_initial_tsn,
            };
            s.state = AssociationState::CookieWait;
            encode(s.local_port, s.remote_port, 0, vec![Chunk::Init(init)])
        })
    }

    pub fn initiate_shutdown(&self, now: Instant) -> Option<Vec<u8>> {
        self.inner.with(|s| {
            if s.state != AssociationState::Established {
                return None;
            }
            let cumulative = s
                .tsn_tracker
                .as_ref()
                .map(|t| t.cumulative_tsn())
                .unwrap_or(s.local_initial_tsn.wrapping_sub(1));
            s.state = AssociationState::ShutdownSent;
            let _ = now;
            Some(encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::Shutdown(Shutdown {
                    cumulative_tsn_ack: cumulative,
                })],
            ))
        })
    }

    /// Processes one inbound SCTP packet, returning whatever responses and
    /// delivered application messages resulted.
    pub fn process(&self, bytes: &[u8], now: Instant) -> Result<ProcessOutcome, Error> {
        let packet = Packet::decode(bytes, true)?;
        let mut outcome = ProcessOutcome::default();
        let mut needs_sack = false;

        for chunk in packet.chunks {
            match chunk {
                Chunk::Init(init) => self.handle_init(&init, &mut outcome),
                Chunk::InitAck(init_ack) => self.handle_init_ack(&init_ack, &mut outcome),
                Chunk::CookieEcho(echo) => self.handle_cookie_echo(&echo, &mut outcome)?,
                Chunk::CookieAck => self.handle_cookie_ack(),
                Chunk::Data(data) => {
                    self.handle_data(data, &mut outcome);
                    needs_sack = true;
                }
                Chunk::Sack(sack) => self.handle_sack(&sack, now),
                Chunk::Heartbeat(heartbeat) => self.handle_heartbeat(&heartbeat, &mut outcome),
                Chunk::HeartbeatAck(_) => {}
                Chunk::Shutdown(_) => self.handle_shutdown(&mut outcome),
                Chunk::ShutdownAck => self.handle_shutdown_ack(),
                Chunk::Unknown { typ, .. } => {
                    debug!("dropping unrecognized SCTP chunk type {}", typ);
                }
            }
        }

        if needs_sack {
            if let Some(sack_packet) = self.build_sack() {
                outcome.response_packets.push(sack_packet);
            }
        }

        Ok(outcome)
    }

    fn handle_init(&self, init: &Init, outcome: &mut ProcessOutcome) {
        self.inner.with(|s| {
            if s.role != Role::Server {
                return;
            }
            s.remote_verification_tag = init.initiate_tag;
            s.peer_a_rwnd = init.a_rwnd;
            s.outbound_streams = s.outbound_streams.min(init.inbound_streams);
            s.inbound_streams = s.inbound_streams.min(init.outbound_streams);
            s.tsn_tracker = Some(TsnTracker::new(init.initial_tsn));

            let cookie = Cookie {
                timestamp_ms: now_ms(),
                peer_tag: init.initiate_tag,
                local_tag: s.local_verification_tag,
                peer_initial_tsn: init.initial_tsn,
                peer_a_rwnd: init.a_rwnd,
                outbound_streams: s.outbound_streams,
                inbound_streams: s.inbound_streams,
            };
            let cookie_bytes = cookie.encode(&s.cookie_secret).to_vec();

            let init_ack = InitAck {
                initiate_tag: s.local_verification_tag,
                a_rwnd: DEFAULT_A_RWND,
                outbound_streams: s.outbound_streams,
                inbound_streams: s.inbound_streams,
                initial_tsn: s.local_initial_tsn,
                cookie: cookie_bytes,
            };
            outcome.response_packets.push(encode(
                s.local_port,
                s.remote_port,
                init.initiate_tag,
                vec![Chunk::InitAck(init_ack)],
            ));
        });
    }

    fn handle_init_ack(&self, init_ack: &InitAck, outcome: &mut ProcessOutcome) {
        self.inner.with(|s| {
            if s.state != AssociationState::CookieWait {
                return;
            }
            s.remote_verification_tag = init_ack.initiate_tag;
            s.peer_a_rwnd = init_ack.a_rwnd;
            s.outbound_streams = s.outbound_streams.min(init_ack.inbound_streams);
            s.inbound_streams = s.inbound_streams.min(init_ack.outbound_streams);
            s.tsn_tracker = Some(TsnTracker::new(init_ack.initial_tsn));
            s.pending_cookie = Some(init_ack.cookie.clone());
            s.state = AssociationState::CookieEchoed;

            outcome.response_packets.push(encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::CookieEcho(CookieEcho::new(init_ack.cookie.clone()))],
            ));
        });
    }

    fn handle_cookie_echo(&self, echo: &CookieEcho, outcome: &mut ProcessOutcome) -> Result<(), Error> {
        self.inner.with(|s| {
            let cookie = Cookie::decode(&echo.cookie, &s.cookie_secret, now_ms())?;
            let age = now_ms() as i64 - cookie.timestamp_ms as i64;
            if !(0..=COOKIE_MAX_AGE_MS as i64).contains(&age) {
                return Err(Error::CookieExpired);
            }

            s.remote_verification_tag = cookie.peer_tag;
            s.local_verification_tag = cookie.local_tag;
            s.outbound_streams = cookie.outbound_streams;
            s.inbound_streams = cookie.inbound_streams;
            s.tsn_tracker = Some(TsnTracker::new(cookie.peer_initial_tsn));
            s.peer_a_rwnd = cookie.peer_a_rwnd;
            s.state = AssociationState::Established;

            outcome.response_packets.push(encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::CookieAck],
            ));
            Ok(())
        })
    }

    fn handle_cookie_ack(&self) {
        self.inner.with(|s| {
            if s.state == AssociationState::CookieEchoed {
                s.state = AssociationState::Established;
                s.pending_cookie = None;
            }
        });
    }

    fn handle_data(&self, data: Data, outcome: &mut ProcessOutcome) {
        self.inner.with(|s| {
            let tsn = data.tsn;
            let Some(tracker) = s.tsn_tracker.as_mut() else {
                warn!("dropping DATA chunk before the TSN tracker is initialized");
                return;
            };
            if tracker.receive(tsn) {
                let messages = s.reassembler.accept(tsn, data);
                outcome.delivered.extend(messages);
            }
        });
    }

    fn handle_sack(&self, sack: &Sack, now: Instant) {
        self.inner.with(|s| {
            s.retransmission
                .acknowledge(sack.cumulative_tsn_ack, &sack.gap_blocks, now);
        });
    }

    fn handle_heartbeat(&self, heartbeat: &Heartbeat, outcome: &mut ProcessOutcome) {
        self.inner.with(|s| {
            outcome.response_packets.push(encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::HeartbeatAck(heartbeat.clone())],
            ));
        });
    }

    fn handle_shutdown(&self, outcome: &mut ProcessOutcome) {
        self.inner.with(|s| {
            if !matches!(
                s.state,
                AssociationState::Established | AssociationState::ShutdownPending
            ) {
                return;
            }
            s.state = AssociationState::ShutdownAckSent;
            outcome.response_packets.push(encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::ShutdownAck],
            ));
        });
    }

    fn handle_shutdown_ack(&self) {
        self.inner.with(|s| {
            if s.state == AssociationState::ShutdownSent {
                s.state = AssociationState::Closed;
            }
        });
    }

    fn build_sack(&self) -> Option<Vec<u8>> {
        self.inner.with(|s| {
            let tracker = s.tsn_tracker.as_mut()?;
            let sack = Sack {
                cumulative_tsn_ack: tracker.cumulative_tsn(),
                a_rwnd: DEFAULT_A_RWND,
                gap_blocks: tracker.gap_blocks(),
                duplicate_tsns: tracker.take_duplicates(),
            };
            Some(encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::Sack(sack)],
            ))
        })
    }

    /// Encodes `payload` as a single unfragmented DATA chunk, assigning TSN
    /// and (for ordered streams) stream sequence atomically, and enqueues it
    /// for retransmission.
    pub fn send(
        &self,
        stream_id: u16,
        ppid: u32,
        payload: &[u8],
        ordered: bool,
        now: Instant,
    ) -> Vec<u8> {
        self.inner.with(|s| {
            let tsn = s.next_tsn;
            s.next_tsn = s.next_tsn.wrapping_add(1);

            let stream_seq = if ordered {
                let seq = s.next_stream_seq.entry(stream_id).or_insert(0);
                let current = *seq;
                *seq = seq.wrapping_add(1);
                current
            } else {
                0
            };

            let data = Data {
                unordered: !ordered,
                beginning: true,
                ending: true,
                tsn,
                stream_id,
                stream_seq,
                ppid,
                user_data: payload.to_vec(),
            };

            s.retransmission.enqueue(tsn, data.clone(), now);
            encode(
                s.local_port,
                s.remote_port,
                s.remote_verification_tag,
                vec![Chunk::Data(data)],
            )
        })
    }

    pub fn pending_retransmissions(&self, now: Instant) -> Result<Vec<Vec<u8>>, Error> {
        self.inner.with(|s| {
            let due = s.retransmission.pending_retransmissions(now)?;
            Ok(due
                .into_iter()
                .map(|(_, chunk)| {
                    encode(
                        s.local_port,
                        s.remote_port,
                        s.remote_verification_tag,
                        vec![Chunk::Data(chunk)],
                    )
                })
                .collect())
        })
    }
}

fn encode(local_port: u16, remote_port: u16, verification_tag: u32, chunks: Vec<Chunk>) -> Vec<u8> {
    Packet::new(Header::new(local_port, remote_port, verification_tag), chunks).to_bytes()
}
