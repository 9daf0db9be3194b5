//! One-shot UDP round trips to the upstream resolver.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use bytes::Bytes;
use tokio::{
    net::{lookup_host, UdpSocket},
    time::{timeout_at, Instant},
};
use tracing::{debug, trace};

use crate::error::ForwardError;

/// The conventional ceiling for a DNS reply over UDP without EDNS.
pub const DEFAULT_REPLY_BUFFER_SIZE: usize = 512;

/// Sends raw queries to a fixed upstream address.
///
/// Every call to [`UpstreamForwarder::forward`] uses a fresh socket and a single
/// send/receive pair under one deadline. Nothing is retried or reused.
#[derive(Debug, Clone)]
pub struct UpstreamForwarder {
    upstream: String,
    timeout: Duration,
    reply_buffer_size: usize,
}

impl UpstreamForwarder {
    pub fn new(upstream: impl Into<String>, timeout: Duration) -> Self {
        Self {
            upstream: upstream.into(),
            timeout,
            reply_buffer_size: DEFAULT_REPLY_BUFFER_SIZE,
        }
    }

    pub fn with_reply_buffer_size(mut self, reply_buffer_size: usize) -> Self {
        self.reply_buffer_size = reply_buffer_size;
        self
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forwards `query` verbatim and returns the first reply datagram verbatim.
    pub async fn forward(&self, query: &[u8]) -> Result<Bytes, ForwardError> {
        let deadline = Instant::now() + self.timeout;

        let socket = timeout_at(deadline, self.connect())
            .await
            .map_err(|_| self.timed_out())??;

        let sent = timeout_at(deadline, socket.send(query))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|source| ForwardError::UpstreamWriteFailed {
                upstream: self.upstream.clone(),
                source,
            })?;
        trace!(upstream = %self.upstream, bytes_sent = sent, "query sent upstream");

        let mut reply = vec![0u8; self.reply_buffer_size];
        let len = timeout_at(deadline, socket.recv(&mut reply))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|source| ForwardError::UpstreamReadFailed {
                upstream: self.upstream.clone(),
                source,
            })?;
        reply.truncate(len);
        debug!(upstream = %self.upstream, bytes_received = len, "reply received from upstream");

        Ok(Bytes::from(reply))
    }

    async fn connect(&self) -> Result<UdpSocket, ForwardError> {
        let unreachable = |source: io::Error| ForwardError::UpstreamUnreachable {
            upstream: self.upstream.clone(),
            source,
        };

        let address = lookup_host(self.upstream.as_str())
            .await
            .map_err(unreachable)?
            .next()
            .ok_or_else(|| {
                unreachable(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no address found for upstream",
                ))
            })?;

        // Bind to ephemeral port (0 = OS assigns) in the upstream's address family
        let bind_address: SocketAddr = if address.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_address).await.map_err(unreachable)?;
        // Connecting makes the kernel drop datagrams from anyone but the upstream.
        socket.connect(address).await.map_err(unreachable)?;
        Ok(socket)
    }

    fn timed_out(&self) -> ForwardError {
        ForwardError::UpstreamTimeout {
            upstream: self.upstream.clone(),
            timeout: self.timeout,
        }
    }
}
