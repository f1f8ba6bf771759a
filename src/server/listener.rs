//! Hub server
//!
//! Binds the UDP socket, then runs the dispatcher in the foreground and the
//! broadcaster (plus the optional stats reporter) as background tasks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::registry::SubscriberRegistry;
use crate::server::broadcaster::Broadcaster;
use crate::server::config::ServerConfig;
use crate::server::dispatcher::Dispatcher;
use crate::state::StateStore;
use crate::stats::HubStats;

/// UDP state broadcast hub
///
/// The registry, the state store and the counters are created once here and
/// shared as `Arc` handles with the dispatcher and the broadcaster.
pub struct HubServer {
    config: ServerConfig,
    socket: Arc<UdpSocket>,
    registry: Arc<SubscriberRegistry>,
    state: Arc<StateStore>,
    stats: Arc<HubStats>,
}

impl HubServer {
    /// Validate the configuration and bind the listen socket
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| Error::Bind {
                addr: config.bind_addr,
                source,
            })?;

        let registry = SubscriberRegistry::with_config(config.registry.clone());
        let state = StateStore::new(config.initial_state.clone());

        Ok(Self {
            config,
            socket: Arc::new(socket),
            registry: Arc::new(registry),
            state: Arc::new(state),
            stats: Arc::new(HubStats::new()),
        })
    }

    /// Address the socket is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a reference to the subscriber registry
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Get a reference to the state store
    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Get a reference to the hub counters
    pub fn stats(&self) -> &Arc<HubStats> {
        &self.stats
    }

    /// Run the server
    ///
    /// This method only returns if the local address cannot be read.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        tracing::info!(
            addr = %addr,
            period_ms = self.config.broadcast_period.as_millis() as u64,
            "State hub listening"
        );

        let mut tasks = vec![self.spawn_broadcaster()];
        if let Some(interval) = self.config.stats_interval {
            tasks.push(self.spawn_stats_reporter(interval));
        }

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.socket),
            Arc::clone(&self.registry),
            Arc::clone(&self.state),
            Arc::clone(&self.stats),
        );

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = dispatcher.run() => {}
        }

        for task in tasks {
            task.abort();
        }

        Ok(())
    }

    fn spawn_broadcaster(&self) -> JoinHandle<()> {
        Broadcaster::new(
            Arc::clone(&self.socket),
            Arc::clone(&self.registry),
            Arc::clone(&self.state),
            Arc::clone(&self.stats),
            self.config.broadcast_period,
        )
        .evict_unreachable(self.config.evict_unreachable)
        .spawn()
    }

    fn spawn_stats_reporter(&self, interval: Duration) -> JoinHandle<()> {
        let stats = Arc::clone(&self.stats);
        let registry = Arc::clone(&self.registry);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                // Awaited outside the macro: its value set is not Send
                let subscribers = registry.len().await;
                let s = stats.snapshot();
                tracing::info!(
                    subscribers,
                    received = s.datagrams_received,
                    malformed = s.malformed,
                    updates = s.updates,
                    rejected = s.rejected,
                    cycles = s.broadcast_cycles,
                    pushes = s.pushes_sent,
                    push_failures = s.push_failures,
                    push_failure_rate = s.push_failure_rate(),
                    evictions = s.evictions,
                    "Hub stats"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> ServerConfig {
        ServerConfig::with_addr("127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = HubServer::bind(loopback()).await.unwrap();

        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(&server.state().get().await[..], b"started");
        assert!(server.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = loopback().broadcast_period(Duration::ZERO);

        assert!(matches!(
            HubServer::bind(config).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_bind_conflict_is_bind_error() {
        let first = HubServer::bind(loopback()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let result = HubServer::bind(ServerConfig::with_addr(taken)).await;

        assert!(matches!(result, Err(Error::Bind { addr, .. }) if addr == taken));
    }

    #[tokio::test]
    async fn test_run_until_returns_on_shutdown() {
        let server = HubServer::bind(loopback().initial_state("custom"))
            .await
            .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            server.run_until(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert_eq!(&server.state().get().await[..], b"custom");
    }

    #[tokio::test]
    async fn test_run_with_stats_reporter() {
        let server = HubServer::bind(loopback().stats_interval(Duration::from_millis(10)))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let subscribe = crate::protocol::WireMessage::subscribe().encode().unwrap();
        client.send_to(&subscribe, addr).await.unwrap();

        // Several reporter ticks while the hub keeps serving
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            server.run_until(tokio::time::sleep(Duration::from_millis(80))),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert_eq!(server.registry().len().await, 1);
        assert_eq!(server.stats().snapshot().subscribes, 1);
    }
}
