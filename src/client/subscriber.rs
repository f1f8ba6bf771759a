//! UDP hub client

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::error::Result;
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::WireMessage;

/// Client connected to a single hub
///
/// # Example
/// ```no_run
/// use state_hub::HubClient;
///
/// # async fn example() -> state_hub::error::Result<()> {
/// let client = HubClient::connect("127.0.0.1:10001".parse().unwrap()).await?;
/// client.subscribe().await?;
///
/// loop {
///     let msg = client.recv().await?;
///     println!("{}: {:?}", msg.kind, msg.payload);
/// }
/// # }
/// ```
pub struct HubClient {
    socket: UdpSocket,
    hub: SocketAddr,
}

impl HubClient {
    /// Bind an ephemeral local port and connect it to `hub`
    ///
    /// A loopback hub gets a loopback-bound client, so `local_addr()` matches
    /// the endpoint the hub registers.
    pub async fn connect(hub: SocketAddr) -> Result<Self> {
        let local = match hub {
            SocketAddr::V4(v4) if v4.ip().is_loopback() => SocketAddr::from(([127, 0, 0, 1], 0)),
            SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
            SocketAddr::V6(v6) if v6.ip().is_loopback() => {
                SocketAddr::from((std::net::Ipv6Addr::LOCALHOST, 0))
            }
            SocketAddr::V6(_) => SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0)),
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(hub).await?;

        Ok(Self { socket, hub })
    }

    /// Hub address
    pub fn hub_addr(&self) -> SocketAddr {
        self.hub
    }

    /// Local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Ask the hub for state pushes
    pub async fn subscribe(&self) -> Result<()> {
        self.send(&WireMessage::subscribe()).await
    }

    /// Replace the hub's state
    pub async fn update(&self, state: impl Into<Bytes>) -> Result<()> {
        self.send(&WireMessage::update(state)).await
    }

    /// Send an arbitrary message
    pub async fn send(&self, msg: &WireMessage) -> Result<()> {
        let data = msg.encode()?;
        self.send_raw(&data).await
    }

    /// Send raw bytes, bypassing the codec
    pub async fn send_raw(&self, data: &[u8]) -> Result<()> {
        self.socket.send(data).await?;
        Ok(())
    }

    /// Wait for the next message from the hub
    pub async fn recv(&self) -> Result<WireMessage> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let len = self.socket.recv(&mut buf).await?;
        Ok(WireMessage::decode(&buf[..len])?)
    }

    /// Wait up to `timeout` for the next message
    ///
    /// Returns `Ok(None)` if nothing arrived in time.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<Option<WireMessage>> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageKind;

    #[tokio::test]
    async fn test_client_sends_encoded_messages() {
        let hub = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = HubClient::connect(hub.local_addr().unwrap()).await.unwrap();

        client.update(&b"newstate"[..]).await.unwrap();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, from) = hub.recv_from(&mut buf).await.unwrap();
        let msg = WireMessage::decode(&buf[..len]).unwrap();
        assert_eq!(msg.kind, MessageKind::Update);
        assert_eq!(&msg.payload[..], b"newstate");
        assert_eq!(from, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_recv_timeout_expires() {
        let hub = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = HubClient::connect(hub.local_addr().unwrap()).await.unwrap();

        let msg = client.recv_timeout(Duration::from_millis(20)).await.unwrap();
        assert!(msg.is_none());
    }

    #[tokio::test]
    async fn test_recv_decodes_reply() {
        let hub = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = HubClient::connect(hub.local_addr().unwrap()).await.unwrap();
        client.subscribe().await.unwrap();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (_, from) = hub.recv_from(&mut buf).await.unwrap();
        hub.send_to(&WireMessage::ack().encode().unwrap(), from)
            .await
            .unwrap();

        let reply = client.recv().await.unwrap();
        assert_eq!(reply.kind, MessageKind::Ack);
        assert_eq!(&reply.payload[..], b"ok");
    }
}
