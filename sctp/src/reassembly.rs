//! Reassembles fragmented SCTP DATA chunks into whole messages and, for
//! ordered streams, redelivers them in strictly increasing stream-sequence
//! order.

use std::collections::{HashMap, VecDeque};

use util::serial::{serial_add, serial_diff};

use crate::chunk::Data;

pub const DEFAULT_GROUP_CAP: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    pub stream_id: u16,
    pub stream_seq: u16,
    pub unordered: bool,
    pub ppid: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    stream_id: u16,
    stream_seq: u16,
    unordered: bool,
}

#[derive(Debug, Default)]
struct FragmentGroup {
    fragments: HashMap<u32, Data>,
    begin_tsn: Option<u32>,
    end_tsn: Option<u32>,
}

impl FragmentGroup {
    fn insert(&mut self, tsn: u32, chunk: Data) {
        if chunk.beginning {
            self.begin_tsn = Some(tsn);
        }
        if chunk.ending {
            self.end_tsn = Some(tsn);
        }
        self.fragments.insert(tsn, chunk);
    }

    /// If the fragment run from `begin_tsn` to `end_tsn` is fully present,
    /// consumes the group and returns the assembled bytes in TSN order.
    fn try_assemble(&mut self) -> Option<(u32, Vec<u8>)> {
        let begin = self.begin_tsn?;
        let end = self.end_tsn?;

        let mut data = Vec::new();
        let mut tsn = begin;
        loop {
            let chunk = self.fragments.get(&tsn)?;
            data.extend_from_slice(&chunk.user_data);
            if tsn == end {
                break;
            }
            tsn = serial_add(tsn, 1);
        }
        Some((begin, data))
    }
}

pub struct Reassembler {
    groups: HashMap<GroupKey, FragmentGroup>,
    group_order: VecDeque<GroupKey>,
    group_cap: usize,
    expected_seq: HashMap<u16, u16>,
    ordered_buffer: HashMap<(u16, u16), AssembledMessage>,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_CAP)
    }
}

impl Reassembler {
    pub fn new(group_cap: usize) -> Self {
        Self {
            groups: HashMap::new(),
            group_order: VecDeque::new(),
            group_cap,
            expected_seq: HashMap::new(),
            ordered_buffer: HashMap::new(),
        }
    }

    /// Feeds one DATA chunk's payload (already accepted by the TSN
    /// tracker), returning every message that becomes deliverable as a
    /// result — zero, one, or several for ordered streams that were
    /// blocked on an earlier gap.
    pub fn accept(&mut self, tsn: u32, chunk: Data) -> Vec<AssembledMessage> {
        if chunk.beginning && chunk.ending {
            let message = AssembledMessage {
                stream_id: chunk.stream_id,
                stream_seq: chunk.stream_seq,
                unordered: chunk.unordered,
                ppid: chunk.ppid,
                data: chunk.user_data,
            };
            return self.deliver(message);
        }

        let key = GroupKey {
            stream_id: chunk.stream_id,
            stream_seq: chunk.stream_seq,
            unordered: chunk.unordered,
        };

        let ppid = chunk.ppid;
        let unordered = chunk.unordered;
        let group = self.groups.entry(key.clone()).or_insert_with(|| {
            self.group_order.push_back(key.clone());
            FragmentGroup::default()
        });
        group.insert(tsn, chunk);

        let assembled = group.try_assemble();
        if let Some((_, data)) = assembled {
            self.groups.remove(&key);
            self.group_order.retain(|k| k != &key);
            let message = AssembledMessage {
                stream_id: key.stream_id,
                stream_seq: key.stream_seq,
                unordered,
                ppid,
                data,
            };
            return self.deliver(message);
        }

        self.evict_if_over_cap();
        Vec::new()
    }

    fn deliver(&mut self, message: AssembledMessage) -> Vec<AssembledMessage> {
        if message.unordered {
            return vec![message];
        }

        let expected = self.expected_seq.entry(message.stream_id).or_insert(0);
        if message.stream_seq != *expected {
            self.ordered_buffer
                .insert((message.stream_id, message.stream_seq), message);
            return Vec::new();
        }

        let mut out = vec![message];
        *expected = expected.wrapping_add(1);
        loop {
            let key = (out[0].stream_id, *expected);
            match self.ordered_buffer.remove(&key) {
                Some(next) => {
                    *expected = expected.wrapping_add(1);
                    out.push(next);
                }
                None => break,
            }
        }
        out
    }

    fn evict_if_over_cap(&mut self) {
        while self.groups.len() > self.group_cap {
            if let Some(oldest) = self.group_order.pop_front() {
                self.groups.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Drops fragment groups whose earliest fragment is more than
    /// `max_distance` TSNs behind `cumulative_tsn` — they can never
    /// complete once the peer has moved that far past them.
    pub fn evict_stale(&mut self, cumulative_tsn: u32, max_distance: u32) {
        let stale: Vec<GroupKey> = self
            .groups
            .iter()
            .filter(|(_, group)| {
                group
                    .fragments
                    .keys()
                    .next()
                    .map(|&tsn| serial_diff(cumulative_tsn, tsn) > max_distance as i32)
                    .unwrap_or(false)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in stale {
            self.groups.remove(&key);
            self.group_order.retain(|k| k != &key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(tsn: u32, b: bool, e: bool, seq: u16, payload: &[u8]) -> (u32, Data) {
        (
            tsn,
            Data {
                unordered: false,
                beginning: b,
                ending: e,
                tsn,
                stream_id: 0,
                stream_seq: seq,
                ppid: 51,
                user_data: payload.to_vec(),
            },
        )
    }

    #[test]
    fn out_of_order_fragments_assemble_once() {
        let mut r = Reassembler::default();
        let pieces = [
            frag(1003, false, true, 0, b"mnop"),
            frag(1001, false, false, 0, b"efgh"),
            frag(1000, true, false, 0, b"abcd"),
            frag(1002, false, false, 0, b"ijkl"),
        ];

        let mut delivered = Vec::new();
        for (tsn, chunk) in pieces {
            delivered.extend(r.accept(tsn, chunk));
        }

        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].data, b"abcdefghijklmnop");
    }

    #[test]
    fn ordered_delivery_buffers_then_drains() {
        let mut r = Reassembler::default();

        let seq0 = AssembledMessage {
            stream_id: 0,
            stream_seq: 0,
            unordered: false,
            ppid: 51,
            data: b"a".to_vec(),
        };
        let seq2 = AssembledMessage {
            stream_id: 0,
            stream_seq: 2,
            unordered: false,
            ppid: 51,
            data: b"c".to_vec(),
        };
        let seq1 = AssembledMessage {
            stream_id: 0,
            stream_seq: 1,
            unordered: false,
            ppid: 51,
            data: b"b".to_vec(),
        };

        assert_eq!(r.deliver(seq0).len(), 1);
        assert!(r.deliver(seq2).is_empty());
        let drained = r.deliver(seq1);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].data, b"b");
        assert_eq!(drained[1].data, b"c");
    }

    #[test]
    fn unordered_delivers_immediately() {
        let mut r = Reassembler::default();
        let msg = AssembledMessage {
            stream_id: 3,
            stream_seq: 0,
            unordered: true,
            ppid: 53,
            data: b"x".to_vec(),
        };
        assert_eq!(r.deliver(msg).len(), 1);
    }
}
