//! # Receiver Module
//!
//! Receives sensor datagrams from the wireless side over UDP.
//!
//! This module handles:
//! - Binding the receive socket
//! - Peer registration (optionally accept datagrams only from known senders)
//! - Handing each datagram to the caller exactly once, unmodified
//!
//! Loss, duplication and reordering are not corrected here.

use std::collections::HashSet;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::Result;

/// Receive buffer size; the radio link never carries more than this per datagram
pub const MAX_DATAGRAM_LEN: usize = 250;

/// Set of senders datagrams are accepted from.
///
/// An empty filter accepts every sender.
#[derive(Debug, Clone, Default)]
pub struct PeerFilter {
    peers: HashSet<SocketAddr>,
}

impl PeerFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `peer`. Returns `false` if it was already registered.
    pub fn add_peer(&mut self, peer: SocketAddr) -> bool {
        let added = self.peers.insert(peer);
        if added {
            info!("Peer added: {}", peer);
        }
        added
    }

    /// Removes `peer`. Returns `false` if it was not registered.
    pub fn remove_peer(&mut self, peer: &SocketAddr) -> bool {
        let removed = self.peers.remove(peer);
        if removed {
            info!("Peer removed: {}", peer);
        }
        removed
    }

    /// Whether datagrams from `sender` should be processed.
    #[must_use]
    pub fn allows(&self, sender: &SocketAddr) -> bool {
        self.peers.is_empty() || self.peers.contains(sender)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl FromIterator<SocketAddr> for PeerFilter {
    fn from_iter<I: IntoIterator<Item = SocketAddr>>(iter: I) -> Self {
        Self {
            peers: iter.into_iter().collect(),
        }
    }
}

/// UDP socket delivering sensor datagrams
#[derive(Debug)]
pub struct DatagramReceiver {
    socket: UdpSocket,
    peers: PeerFilter,
}

impl DatagramReceiver {
    /// Bind the receive socket.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the address cannot be bound
    pub async fn bind(addr: SocketAddr, peers: PeerFilter) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Listening for sensor datagrams on {}", socket.local_addr()?);
        Ok(Self { socket, peers })
    }

    /// Address the socket is bound to
    ///
    /// # Errors
    ///
    /// Returns `Io` if the socket address cannot be read
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Registered senders
    pub fn peers(&self) -> &PeerFilter {
        &self.peers
    }

    /// Wait for the next datagram from an accepted sender.
    ///
    /// # Returns
    ///
    /// * `Result<(usize, SocketAddr)>` - Bytes written into `buf` and the sender
    ///
    /// # Errors
    ///
    /// Returns `Io` if the socket fails
    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        loop {
            let (len, sender) = self.socket.recv_from(buf).await?;
            if self.peers.allows(&sender) {
                debug!("Received {} bytes from {}", len, sender);
                return Ok((len, sender));
            }
            debug!("Dropped {} bytes from unregistered peer {}", len, sender);
        }
    }
}
