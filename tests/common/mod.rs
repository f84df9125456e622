//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use mqtt_udp_bridge::config::{Mapping, MappingTable, UdpSwitch, UdpTarget};
use mqtt_udp_bridge::dispatch::{DatagramSender, DispatchError, Dispatcher, UdpSender};
use mqtt_udp_bridge::observability::{ChannelSink, Notification, NotificationSink};
use mqtt_udp_bridge::Router;

/// Records every datagram instead of sending it.
pub struct RecordingSender {
    tx: mpsc::UnboundedSender<(UdpTarget, String)>,
}

impl RecordingSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(UdpTarget, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DatagramSender for RecordingSender {
    async fn send(&self, target: &UdpTarget, payload: &[u8]) -> Result<(), DispatchError> {
        let _ = self.tx.send((target.clone(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }
}

/// Real UDP sender that refuses a fixed set of ports.
pub struct RefusingPorts {
    pub refused: HashSet<u16>,
    pub inner: UdpSender,
}

#[async_trait]
impl DatagramSender for RefusingPorts {
    async fn send(&self, target: &UdpTarget, payload: &[u8]) -> Result<(), DispatchError> {
        if self.refused.contains(&target.port) {
            return Err(DispatchError::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            )));
        }
        self.inner.send(target, payload).await
    }
}

/// A router wired to `sender` with a channel notification sink.
pub fn router_with(
    mappings: Vec<Mapping>,
    sender: Arc<dyn DatagramSender>,
    udp: UdpSwitch,
) -> (Router, mpsc::UnboundedReceiver<Notification>) {
    let (sink, notes) = ChannelSink::new();
    let sink: Arc<dyn NotificationSink> = Arc::new(sink);
    let dispatcher = Dispatcher::new(sender, udp, sink.clone());
    (Router::new(MappingTable::new(mappings), dispatcher, sink), notes)
}

/// Bind a loopback UDP receiver on an ephemeral port.
pub async fn bind_receiver() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}

/// Receive one datagram or panic after two seconds.
pub async fn recv_datagram(socket: &UdpSocket) -> String {
    let mut buf = vec![0u8; 2048];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("no datagram within 2s")
        .unwrap();
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Wait until a notification of `kind` arrives, skipping others.
pub async fn wait_for(notes: &mut mpsc::UnboundedReceiver<Notification>, kind: &str) -> Notification {
    loop {
        let note = tokio::time::timeout(Duration::from_secs(10), notes.recv())
            .await
            .expect("notification timeout")
            .expect("notification channel closed");
        if note.kind() == kind {
            return note;
        }
    }
}
