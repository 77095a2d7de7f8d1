//! Per-socket ping bookkeeping.

use std::time::{Duration, Instant};

/// Interval between server pings.
pub const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Latency above which a socket is reported.
pub const HIGH_LATENCY: Duration = Duration::from_millis(1_000);

/// Latency above which a socket is closed.
pub const EXCESSIVE_LATENCY: Duration = Duration::from_millis(10_000);

const PING_HISTORY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    Normal,
    High,
    Excessive,
}

impl LatencyLevel {
    pub fn classify(latency: Duration) -> Self {
        if latency > EXCESSIVE_LATENCY {
            LatencyLevel::Excessive
        } else if latency > HIGH_LATENCY {
            LatencyLevel::High
        } else {
            LatencyLevel::Normal
        }
    }
}

/// Remembers when each of the last [`PING_HISTORY`] pings went out so a pong
/// can be turned into a one-way latency estimate.
pub struct PingTracker {
    sent: Vec<Option<Instant>>,
    next_seq: u64,
}

impl PingTracker {
    pub fn new() -> Self {
        Self {
            sent: vec![None; PING_HISTORY],
            next_seq: 0,
        }
    }

    /// Record a ping sent at `at` and return its sequence number.
    pub fn record_ping(&mut self, at: Instant) -> u64 {
        let seq = self.next_seq;
        self.sent[slot(seq)] = Some(at);
        self.next_seq += 1;
        seq
    }

    /// Half the round trip of ping `seq`, or `None` if it was never sent.
    pub fn latency(&self, seq: u64, now: Instant) -> Option<Duration> {
        self.sent[slot(seq)].map(|sent| now.saturating_duration_since(sent) / 2)
    }
}

impl Default for PingTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(seq: u64) -> usize {
    (seq % PING_HISTORY as u64) as usize
}
