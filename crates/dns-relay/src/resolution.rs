use std::{net::SocketAddr, time::Instant};

use dns::{forwarder::UpstreamForwarder, serialize::servfail_for};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::diagnostics::log_reply;

/// Relays single client queries to the upstream and the upstream's replies back.
pub struct Relay {
    pub client_socket: UdpSocket,
    forwarder: UpstreamForwarder,
}

impl Relay {
    pub fn new(client_socket: UdpSocket, forwarder: UpstreamForwarder) -> Self {
        Self {
            client_socket,
            forwarder,
        }
    }

    /// Handles one client datagram: forward it, send the upstream's reply bytes to
    /// `client` unmodified, then log what came back.
    ///
    /// If the upstream cannot be reached the client gets a SERVFAIL instead, so it does not
    /// wait for a reply that will never arrive.
    pub async fn process(&self, query: &[u8], client: SocketAddr) {
        let started_at = Instant::now();

        match self.forwarder.forward(query).await {
            Ok(reply) => {
                let elapsed = started_at.elapsed();
                self.send(&reply, client).await;
                log_reply(&reply, elapsed);
            }
            Err(e) => {
                warn!(
                    %client,
                    upstream = self.forwarder.upstream(),
                    timed_out = e.is_timeout(),
                    error = %e,
                    "forwarding query failed"
                );
                match servfail_for(query) {
                    Some(servfail) => self.send(&servfail, client).await,
                    None => debug!(
                        %client,
                        bytes = query.len(),
                        "query too short to answer, dropping it"
                    ),
                }
            }
        }
    }

    // Replies go out through the listening socket, so the client sees them come from the
    // port it sent its query to.
    async fn send(&self, reply: &[u8], client: SocketAddr) {
        if let Err(e) = self.client_socket.send_to(reply, client).await {
            warn!(%client, error = %e, "failed to send reply to client");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dns::{
        forwarder::UpstreamForwarder,
        parse::decode_header,
        protocol::{record_type::RecordType, response_code::ResponseCode},
        serialize::build_query,
    };
    use tokio::{net::UdpSocket, time::timeout};

    use super::Relay;

    const WAIT: Duration = Duration::from_secs(5);

    async fn relay_to(upstream: String, upstream_timeout: Duration) -> Relay {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Relay::new(socket, UpstreamForwarder::new(upstream, upstream_timeout))
    }

    async fn receive(socket: &UdpSocket) -> Vec<u8> {
        let mut buf = [0u8; 1024];
        let (len, _) = timeout(WAIT, socket.recv_from(&mut buf))
            .await
            .expect("no reply from relay")
            .unwrap();
        buf[..len].to_vec()
    }

    #[tokio::test]
    async fn test_process_sends_upstream_reply_verbatim() {
        let query = build_query("example.com", RecordType::A, 0x4242).unwrap();

        // compressed owner name, then a surplus record the header does not announce
        let mut answer = query.clone();
        answer[2..4].copy_from_slice(&0x8180u16.to_be_bytes());
        answer[6..8].copy_from_slice(&1u16.to_be_bytes());
        answer.extend([0xC0, 12, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 93, 184, 216, 34]);
        answer.extend([0xC0, 12, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 10, 0, 0, 1]);

        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_address = upstream.local_addr().unwrap();
        let reply = answer.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (_, from) = upstream.recv_from(&mut buf).await.unwrap();
            upstream.send_to(&reply, from).await.unwrap();
        });

        let relay = relay_to(upstream_address.to_string(), WAIT).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        relay.process(&query, client.local_addr().unwrap()).await;

        assert_eq!(receive(&client).await, answer);
    }

    #[tokio::test]
    async fn test_process_answers_servfail_on_timeout() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let relay = relay_to(silent.local_addr().unwrap().to_string(), Duration::from_millis(50))
            .await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let query = build_query("example.com", RecordType::MX, 7).unwrap();
        relay.process(&query, client.local_addr().unwrap()).await;

        let reply = receive(&client).await;
        let header = decode_header(&reply).unwrap();
        assert_eq!(header.request_id, 7);
        assert_eq!(header.flags.rcode(), ResponseCode::SERVFAIL);
    }

    #[tokio::test]
    async fn test_process_drops_short_query_on_failure() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let relay = relay_to(silent.local_addr().unwrap().to_string(), Duration::from_millis(50))
            .await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        relay.process(&[0u8; 5], client.local_addr().unwrap()).await;

        let mut buf = [0u8; 64];
        assert!(timeout(Duration::from_millis(200), client.recv_from(&mut buf))
            .await
            .is_err());
    }
}
