//! Request dispatcher
//!
//! Receives datagrams, applies their effect on the registry or the state
//! store, and replies with an acknowledgement.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::error::{CodecError, RegistryError};
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::{MessageKind, WireMessage};
use crate::registry::SubscriberRegistry;
use crate::state::StateStore;
use crate::stats::HubStats;

/// Pause after a receive error before reading again
pub const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// What a single datagram did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Source endpoint registered (`added` is false for a repeat)
    Subscribed { added: bool },
    /// Source endpoint refused because the registry is full
    SubscribeRejected,
    /// State replaced with the payload
    Updated,
    /// Kind not accepted from clients; nothing changed
    Rejected(MessageKind),
    /// Datagram did not decode; nothing changed
    Malformed(CodecError),
}

impl DispatchOutcome {
    /// Every decodable request is acknowledged, including rejected ones
    pub fn should_ack(&self) -> bool {
        !matches!(self, DispatchOutcome::Malformed(_))
    }
}

/// Inbound request handler
pub struct Dispatcher {
    socket: Arc<UdpSocket>,
    registry: Arc<SubscriberRegistry>,
    state: Arc<StateStore>,
    stats: Arc<HubStats>,
}

impl Dispatcher {
    pub fn new(
        socket: Arc<UdpSocket>,
        registry: Arc<SubscriberRegistry>,
        state: Arc<StateStore>,
        stats: Arc<HubStats>,
    ) -> Self {
        Self {
            socket,
            registry,
            state,
            stats,
        }
    }

    /// Apply one datagram's effect
    ///
    /// Performs no network I/O; the caller decides whether to acknowledge.
    pub async fn handle_datagram(&self, data: &[u8], source: SocketAddr) -> DispatchOutcome {
        let msg = match WireMessage::decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    peer = %source,
                    len = data.len(),
                    error = %e,
                    "Dropping malformed datagram"
                );
                return DispatchOutcome::Malformed(e);
            }
        };

        match msg.kind {
            MessageKind::Subscribe => {
                self.stats.subscribes.fetch_add(1, Ordering::Relaxed);
                match self.registry.register(source).await {
                    Ok(added) => DispatchOutcome::Subscribed { added },
                    Err(e @ RegistryError::Full { .. }) => {
                        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(peer = %source, error = %e, "Subscribe refused");
                        DispatchOutcome::SubscribeRejected
                    }
                }
            }
            MessageKind::Update => {
                let size = msg.payload.len();
                let version = self.state.set(msg.payload).await;
                self.stats.updates.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(peer = %source, size, version, "State updated");
                DispatchOutcome::Updated
            }
            kind => {
                // Possible misuse or a client speaking a newer protocol
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    peer = %source,
                    kind = %kind,
                    payload_len = msg.payload.len(),
                    "Unexpected message kind, dropping"
                );
                DispatchOutcome::Rejected(kind)
            }
        }
    }

    /// Run the receive loop
    ///
    /// Never returns; receive and send errors are logged and absorbed.
    pub async fn run(&self) {
        // Longer datagrams are truncated here and then fail to decode
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, source) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to receive datagram");
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                    continue;
                }
            };

            self.stats.datagrams_received.fetch_add(1, Ordering::Relaxed);

            let outcome = self.handle_datagram(&buf[..len], source).await;
            if outcome.should_ack() {
                self.send_ack(source).await;
            }
        }
    }

    async fn send_ack(&self, target: SocketAddr) {
        let ack = match WireMessage::ack().encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode ack");
                return;
            }
        };

        match self.send(&ack, target).await {
            Ok(()) => {
                self.stats.acks_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.stats.ack_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(peer = %target, error = %e, "Failed to send ack");
            }
        }
    }

    async fn send(&self, data: &Bytes, target: SocketAddr) -> std::io::Result<()> {
        self.socket.send_to(data, target).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn dispatcher() -> Dispatcher {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Dispatcher::new(
            Arc::new(socket),
            Arc::new(SubscriberRegistry::new()),
            Arc::new(StateStore::default()),
            Arc::new(HubStats::new()),
        )
    }

    fn peer(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn encoded(msg: WireMessage) -> Bytes {
        msg.encode().unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_registers_source() {
        let d = dispatcher().await;

        let first = d.handle_datagram(&encoded(WireMessage::subscribe()), peer(4000)).await;
        let second = d.handle_datagram(&encoded(WireMessage::subscribe()), peer(4000)).await;

        assert_eq!(first, DispatchOutcome::Subscribed { added: true });
        assert_eq!(second, DispatchOutcome::Subscribed { added: false });
        assert_eq!(d.registry.snapshot_all().await, vec![peer(4000)]);
        assert_eq!(d.stats.snapshot().subscribes, 2);
    }

    #[tokio::test]
    async fn test_update_sets_state() {
        let d = dispatcher().await;

        let outcome = d
            .handle_datagram(&encoded(WireMessage::update(&b"newstate"[..])), peer(4000))
            .await;

        assert_eq!(outcome, DispatchOutcome::Updated);
        assert_eq!(&d.state.get().await[..], b"newstate");
        // Updating does not subscribe the sender
        assert!(d.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected_but_acked() {
        let d = dispatcher().await;
        let msg = WireMessage::new(0, MessageKind::Unknown(0x99), &b"x"[..]);

        let outcome = d.handle_datagram(&encoded(msg), peer(4000)).await;

        assert_eq!(outcome, DispatchOutcome::Rejected(MessageKind::Unknown(0x99)));
        assert!(outcome.should_ack());
        assert_eq!(&d.state.get().await[..], b"started");
        assert!(d.registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_server_kinds_from_client_are_rejected() {
        let d = dispatcher().await;

        for msg in [WireMessage::ack(), WireMessage::state(&b"forged"[..])] {
            let kind = msg.kind;
            let outcome = d.handle_datagram(&encoded(msg), peer(4000)).await;
            assert_eq!(outcome, DispatchOutcome::Rejected(kind));
        }
        assert_eq!(&d.state.get().await[..], b"started");
        assert_eq!(d.stats.snapshot().rejected, 2);
    }

    #[tokio::test]
    async fn test_garbage_is_malformed_and_not_acked() {
        let d = dispatcher().await;

        let outcome = d.handle_datagram(b"\xde\xad\xbe\xef garbage", peer(4000)).await;

        assert!(matches!(outcome, DispatchOutcome::Malformed(_)));
        assert!(!outcome.should_ack());
        assert_eq!(&d.state.get().await[..], b"started");
        assert!(d.registry.is_empty().await);
        assert_eq!(d.stats.snapshot().malformed, 1);
    }

    #[tokio::test]
    async fn test_full_registry_rejects_subscribe() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let d = Dispatcher::new(
            Arc::new(socket),
            Arc::new(SubscriberRegistry::with_config(
                crate::registry::RegistryConfig::default().max_subscribers(1),
            )),
            Arc::new(StateStore::default()),
            Arc::new(HubStats::new()),
        );

        d.handle_datagram(&encoded(WireMessage::subscribe()), peer(4000)).await;
        let outcome = d.handle_datagram(&encoded(WireMessage::subscribe()), peer(4001)).await;

        assert_eq!(outcome, DispatchOutcome::SubscribeRejected);
        assert!(outcome.should_ack());
        assert_eq!(d.registry.len().await, 1);
    }
}
