//! Datagram transport.

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time;

use crate::config::UdpTarget;

/// Errors raised while sending one datagram.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target host did not resolve to any address.
    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Sends one datagram to a target.
#[async_trait]
pub trait DatagramSender: Send + Sync + 'static {
    async fn send(&self, target: &UdpTarget, payload: &[u8]) -> Result<(), DispatchError>;
}

/// Bound one send by `limit`; expiry becomes [`DispatchError::Timeout`].
pub async fn send_with_timeout<F>(limit: Duration, send: F) -> Result<(), DispatchError>
where
    F: Future<Output = Result<(), DispatchError>>,
{
    time::timeout(limit, send)
        .await
        .map_err(|_| DispatchError::Timeout(limit))?
}

/// Real UDP sender: one ephemeral socket per datagram.
#[derive(Debug, Clone)]
pub struct UdpSender {
    timeout: Duration,
}

impl UdpSender {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn send_once(target: &UdpTarget, payload: &[u8]) -> Result<(), DispatchError> {
        let addr = tokio::net::lookup_host((target.host.as_str(), target.port))
            .await?
            .next()
            .ok_or_else(|| DispatchError::Resolve(target.to_string()))?;

        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.send_to(payload, addr).await?;
        Ok(())
    }
}

impl Default for UdpSender {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl DatagramSender for UdpSender {
    async fn send(&self, target: &UdpTarget, payload: &[u8]) -> Result<(), DispatchError> {
        send_with_timeout(self.timeout, Self::send_once(target, payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sends_single_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let target = UdpTarget { host: "127.0.0.1".into(), port };
        UdpSender::default().send(&target, b"GATE1 OPEN").await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"GATE1 OPEN");
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_an_error() {
        let target = UdpTarget { host: "host.invalid".into(), port: 9 };
        assert!(UdpSender::default().send(&target, b"x").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_send_times_out() {
        let start = time::Instant::now();
        let result = send_with_timeout(Duration::from_secs(5), std::future::pending()).await;

        assert!(matches!(result, Err(DispatchError::Timeout(limit)) if limit == Duration::from_secs(5)));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_inside_limit_passes_through() {
        let refused = send_with_timeout(Duration::from_secs(5), async {
            time::sleep(Duration::from_secs(1)).await;
            Err(DispatchError::Resolve("gate.local:7000".into()))
        })
        .await;
        assert!(matches!(refused, Err(DispatchError::Resolve(_))));
        assert!(send_with_timeout(Duration::from_secs(5), async { Ok(()) }).await.is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = DispatchError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "send timed out after 5s");
    }
}
