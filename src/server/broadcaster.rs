//! Periodic state broadcaster
//!
//! Each cycle snapshots the state and the registry, releases both locks,
//! then sends one state push per subscriber.

use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;

use crate::protocol::WireMessage;
use crate::registry::SubscriberRegistry;
use crate::state::StateStore;
use crate::stats::HubStats;

/// Result of one broadcast cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Subscribers in the snapshot
    pub targets: usize,
    /// Pushes handed to the socket
    pub delivered: usize,
    /// Pushes that failed to send
    pub failed: usize,
    /// Subscribers removed after a permanent failure
    pub evicted: usize,
}

/// Periodic state pusher
pub struct Broadcaster {
    socket: Arc<UdpSocket>,
    registry: Arc<SubscriberRegistry>,
    state: Arc<StateStore>,
    stats: Arc<HubStats>,
    period: Duration,
    evict_unreachable: bool,
}

impl Broadcaster {
    pub fn new(
        socket: Arc<UdpSocket>,
        registry: Arc<SubscriberRegistry>,
        state: Arc<StateStore>,
        stats: Arc<HubStats>,
        period: Duration,
    ) -> Self {
        Self {
            socket,
            registry,
            state,
            stats,
            period,
            evict_unreachable: false,
        }
    }

    /// Remove subscribers whose sends fail permanently
    pub fn evict_unreachable(mut self, evict: bool) -> Self {
        self.evict_unreachable = evict;
        self
    }

    /// Run one broadcast cycle
    pub async fn run_cycle(&self) -> CycleReport {
        let (state, version) = self.state.get_versioned().await;
        let targets = self.registry.snapshot_all().await;

        let mut report = CycleReport {
            targets: targets.len(),
            ..Default::default()
        };

        if targets.is_empty() {
            self.stats.broadcast_cycles.fetch_add(1, Ordering::Relaxed);
            return report;
        }

        let packet = match WireMessage::state(state).encode() {
            Ok(packet) => packet,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode state push");
                return report;
            }
        };

        let mut unreachable = Vec::new();

        for target in targets {
            match self.socket.send_to(&packet, target).await {
                Ok(_) => {
                    report.delivered += 1;
                    tracing::trace!(peer = %target, "State pushed");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(peer = %target, error = %e, "Failed to push state");

                    if self.evict_unreachable && is_permanent(e.kind()) {
                        unreachable.push(target);
                    }
                }
            }
        }

        for target in &unreachable {
            if self.registry.remove(target).await {
                report.evicted += 1;
            }
        }

        self.stats.broadcast_cycles.fetch_add(1, Ordering::Relaxed);
        self.stats.pushes_sent.fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.stats.push_failures.fetch_add(report.failed as u64, Ordering::Relaxed);
        self.stats.evictions.fetch_add(report.evicted as u64, Ordering::Relaxed);

        tracing::debug!(
            version,
            targets = report.targets,
            delivered = report.delivered,
            failed = report.failed,
            evicted = report.evicted,
            "Broadcast cycle complete"
        );

        report
    }

    /// Run cycles forever at the configured period
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            period_ms = self.period.as_millis() as u64,
            evict_unreachable = self.evict_unreachable,
            "Broadcast loop started"
        );

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// Spawn the broadcast loop
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Errors after which sending to the same endpoint is pointless
fn is_permanent(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused | ErrorKind::AddrNotAvailable | ErrorKind::PermissionDenied
    )
}
