//! Outstanding-chunk tracking, RTT/RTO estimation (RFC 4960 §6.3.1), and
//! slow-start / congestion-avoidance window management.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use util::serial::serial_leq;

use crate::chunk::sack::GapBlock;
use crate::chunk::Data;
use crate::error::Error;

pub const MTU: u32 = 1200;
const MIN_RTO: Duration = Duration::from_secs(1);
const MAX_RTO: Duration = Duration::from_secs(60);
const INITIAL_RTO: Duration = Duration::from_secs(3);
const WINDOW_CAP: u32 = 65535;
pub const DEFAULT_MAX_RETRANSMIT: u32 = 10;

struct RttEstimator {
    srtt: Option<Duration>,
    rttvar: Duration,
    rto: Duration,
}

impl RttEstimator {
    fn new() -> Self {
        Self {
            srtt: None,
            rttvar: Duration::ZERO,
            rto: INITIAL_RTO,
        }
    }

    fn sample(&mut self, r: Duration) {
        let rto = match self.srtt {
            None => {
                self.rttvar = r / 2;
                self.srtt = Some(r);
                r + self.rttvar * 4
            }
            Some(srtt) => {
                let delta = if srtt > r { srtt - r } else { r - srtt };
                self.rttvar = self.rttvar.mul_f64(0.75) + delta.mul_f64(0.25);
                let srtt = srtt.mul_f64(0.875) + r.mul_f64(0.125);
                self.srtt = Some(srtt);
                srtt + self.rttvar * 4
            }
        };
        self.rto = rto.clamp(MIN_RTO, MAX_RTO);
    }

    fn backoff(&mut self) {
        self.rto = (self.rto * 2).min(MAX_RTO);
    }
}

struct Entry {
    chunk: Data,
    first_sent: Instant,
    last_sent: Instant,
    retransmit_count: u32,
    fast_retransmit: bool,
}

pub struct RetransmissionQueue {
    entries: HashMap<u32, Entry>,
    bytes_in_flight: usize,
    highest_sent_tsn: Option<u32>,
    cwnd: u32,
    ssthresh: u32,
    rtt: RttEstimator,
    max_retransmit: u32,
}

impl Default for RetransmissionQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRANSMIT)
    }
}

impl RetransmissionQueue {
    pub fn new(max_retransmit: u32) -> Self {
        Self {
            entries: HashMap::new(),
            bytes_in_flight: 0,
            highest_sent_tsn: None,
            cwnd: (4 * MTU).min(WINDOW_CAP),
            ssthresh: WINDOW_CAP,
            rtt: RttEstimator::new(),
            max_retransmit,
        }
    }

    pub fn bytes_in_flight(&self) -> usize {
        self.bytes_in_flight
    }

    pub fn cwnd(&self) -> u32 {
        self.cwnd
    }

    pub fn rto(&self) -> Duration {
        self.rtt.rto
    }

    pub fn enqueue(&mut self, tsn: u32, chunk: Data, now: Instant) {
        self.bytes_in_flight += chunk.user_data.len();
        self.highest_sent_tsn = Some(tsn);
        self.entries.insert(
            tsn,
            Entry {
                chunk,
                first_sent: now,
                last_sent: now,
                retransmit_count: 0,
                fast_retransmit: false,
            },
        );
    }

    /// Removes every entry with TSN ≤ `cumulative_tsn`, folds the first
    /// non-retransmitted removal into the RTT estimator, and advances the
    /// congestion window. Gap blocks mark chunks still missing below the
    /// highest reported TSN for fast retransmit.
    pub fn acknowledge(&mut self, cumulative_tsn: u32, gaps: &[GapBlock], now: Instant) {
        let acked_tsns: Vec<u32> = self
            .entries
            .keys()
            .copied()
            .filter(|&tsn| serial_leq(tsn, cumulative_tsn))
            .collect();

        let mut acked_bytes = 0usize;
        let mut rtt_sample = None;
        for tsn in acked_tsns {
            if let Some(entry) = self.entries.remove(&tsn) {
                acked_bytes += entry.chunk.user_data.len();
                if entry.retransmit_count == 0 && rtt_sample.is_none() {
                    rtt_sample = Some(now.saturating_duration_since(entry.first_sent));
                }
            }
        }
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(acked_bytes);

        if let Some(sample) = rtt_sample {
            self.rtt.sample(sample);
        }

        if acked_bytes > 0 {
            if (self.bytes_in_flight as u32) < self.ssthresh {
                self.cwnd = (self.cwnd + (acked_bytes as u32).min(MTU)).min(WINDOW_CAP);
            } else {
                let increment = ((MTU as u64 * MTU as u64) / self.cwnd.max(1) as u64) as u32;
                self.cwnd = (self.cwnd + increment.max(1)).min(WINDOW_CAP);
            }
        }

        let covered: Vec<(u32, u32)> = gaps.iter().map(|g| (g.start as u32, g.end as u32)).collect();
        for (tsn, entry) in self.entries.iter_mut() {
            let offset = util::serial::serial_diff(*tsn, cumulative_tsn);
            if offset <= 0 {
                continue;
            }
            let offset = offset as u32;
            let in_gap = covered.iter().any(|&(start, end)| offset >= start && offset <= end);
            if !in_gap {
                entry.fast_retransmit = true;
            }
        }
    }

    /// Chunks due for retransmission: those whose RTO has elapsed or that
    /// were flagged for fast retransmit. Backs off the RTO and halves the
    /// window once per call, matching RFC 4960 §6.3.3.
    pub fn pending_retransmissions(&mut self, now: Instant) -> Result<Vec<(u32, Data)>, Error> {
        let rto = self.rtt.rto;
        let due: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.fast_retransmit || now.saturating_duration_since(entry.last_sent) >= rto)
            .map(|(&tsn, _)| tsn)
            .collect();

        if due.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(due.len());
        for tsn in due {
            let entry = self.entries.get_mut(&tsn).expect("tsn just collected from entries");
            entry.retransmit_count += 1;
            if entry.retransmit_count > self.max_retransmit {
                return Err(Error::MaxRetransmitsExceeded);
            }
            entry.last_sent = now;
            entry.fast_retransmit = false;
            out.push((tsn, entry.chunk.clone()));
        }

        self.rtt.backoff();
        self.ssthresh = (self.bytes_in_flight as u32 / 2).max(MTU);
        self.cwnd = MTU;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(tsn: u32, len: usize) -> Data {
        Data {
            unordered: false,
            beginning: true,
            ending: true,
            tsn,
            stream_id: 0,
            stream_seq: 0,
            ppid: 51,
            user_data: vec![0; len],
        }
    }

    #[test]
    fn acknowledge_clears_bytes_in_flight() {
        let mut queue = RetransmissionQueue::default();
        let now = Instant::now();
        queue.enqueue(1000, data(1000, 100), now);
        queue.enqueue(1001, data(1001, 50), now);

        queue.acknowledge(1001, &[], now + Duration::from_millis(50));

        assert_eq!(queue.bytes_in_flight(), 0);
    }

    #[test]
    fn max_retransmit_is_fatal() {
        let mut queue = RetransmissionQueue::new(1);
        let start = Instant::now();
        queue.enqueue(1000, data(1000, 10), start);

        let past_rto = start + Duration::from_secs(61);
        queue.pending_retransmissions(past_rto).unwrap();
        let err = queue.pending_retransmissions(past_rto + Duration::from_secs(61));
        assert!(matches!(err, Err(Error::MaxRetransmitsExceeded)));
    }
}
