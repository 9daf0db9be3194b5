use std::{future::Future, sync::Arc};

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::{resolution::Relay, slots::InFlight};

/// Largest query datagram we accept from clients.
const MAX_QUERY_SIZE: usize = 4096;

/// Runs the acceptor loop until `shutdown` resolves.
///
/// A single loop reads from the listening socket and hands every datagram to its own
/// Tokio task, so a slow upstream round trip never holds up other clients. The number
/// of such tasks is bounded by `in_flight`.
pub async fn serve(
    relay: Arc<Relay>,
    in_flight: Arc<InFlight>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut buffer = vec![0u8; MAX_QUERY_SIZE];

    loop {
        let (len, client) = tokio::select! {
            received = relay.client_socket.recv_from(&mut buffer) => match received {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "udp recv error");
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        };
        let query = Bytes::copy_from_slice(&buffer[..len]);

        if in_flight.in_flight() >= in_flight.capacity() {
            if let Some((oldest_client, running)) = in_flight.oldest() {
                warn!(
                    %client,
                    %oldest_client,
                    oldest_ms = running.as_millis() as u64,
                    "all in-flight slots busy, waiting for one to free up"
                );
            }
        }
        let slot = tokio::select! {
            slot = in_flight.acquire(client) => match slot {
                Ok(slot) => slot,
                Err(e) => {
                    error!(error = %e, "in-flight slots closed");
                    break;
                }
            },
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        };
        debug!(
            %client,
            bytes = len,
            slot = slot.index(),
            generation = slot.generation(),
            in_flight = in_flight.in_flight(),
            "accepted query"
        );

        // Dispatch processing of the datagram to an independent Tokio task, so that accepting
        // and processing are decoupled and a slow upstream never blocks accepting new queries
        let relay = Arc::clone(&relay);
        tokio::spawn(async move {
            relay.process(&query, client).await;
            drop(slot);
        });
    }
}
