//! Counters for the dispatcher and the broadcaster
//!
//! Updated with relaxed atomics from both tasks; a snapshot is a best-effort
//! view, not a consistent cut across counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live hub counters
#[derive(Debug, Default)]
pub struct HubStats {
    pub(crate) datagrams_received: AtomicU64,
    pub(crate) malformed: AtomicU64,
    pub(crate) subscribes: AtomicU64,
    pub(crate) updates: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) acks_sent: AtomicU64,
    pub(crate) ack_failures: AtomicU64,
    pub(crate) broadcast_cycles: AtomicU64,
    pub(crate) pushes_sent: AtomicU64,
    pub(crate) push_failures: AtomicU64,
    pub(crate) evictions: AtomicU64,
}

/// Plain copy of the hub counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStatsSnapshot {
    /// Datagrams read from the socket
    pub datagrams_received: u64,
    /// Datagrams that failed to decode
    pub malformed: u64,
    /// Subscribe requests (including repeats)
    pub subscribes: u64,
    /// Applied state updates
    pub updates: u64,
    /// Unrecognized or refused requests
    pub rejected: u64,
    /// Acknowledgements sent
    pub acks_sent: u64,
    /// Acknowledgements that failed to send
    pub ack_failures: u64,
    /// Completed broadcast cycles
    pub broadcast_cycles: u64,
    /// State pushes sent
    pub pushes_sent: u64,
    /// State pushes that failed to send
    pub push_failures: u64,
    /// Subscribers evicted as unreachable
    pub evictions: u64,
}

impl HubStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> HubStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);

        HubStatsSnapshot {
            datagrams_received: load(&self.datagrams_received),
            malformed: load(&self.malformed),
            subscribes: load(&self.subscribes),
            updates: load(&self.updates),
            rejected: load(&self.rejected),
            acks_sent: load(&self.acks_sent),
            ack_failures: load(&self.ack_failures),
            broadcast_cycles: load(&self.broadcast_cycles),
            pushes_sent: load(&self.pushes_sent),
            push_failures: load(&self.push_failures),
            evictions: load(&self.evictions),
        }
    }
}

impl HubStatsSnapshot {
    /// Fraction of state pushes that failed (0.0 when nothing was sent)
    pub fn push_failure_rate(&self) -> f64 {
        let total = self.pushes_sent + self.push_failures;
        if total > 0 {
            self.push_failures as f64 / total as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        assert_eq!(HubStats::new().snapshot(), HubStatsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let stats = HubStats::new();
        stats.subscribes.fetch_add(1, Ordering::Relaxed);
        stats.subscribes.fetch_add(1, Ordering::Relaxed);
        stats.pushes_sent.fetch_add(3, Ordering::Relaxed);
        stats.push_failures.fetch_add(1, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.subscribes, 2);
        assert_eq!(snapshot.pushes_sent, 3);
        assert_eq!(snapshot.push_failure_rate(), 0.25);
    }

    #[test]
    fn test_failure_rate_without_traffic() {
        assert_eq!(HubStatsSnapshot::default().push_failure_rate(), 0.0);
    }
}
