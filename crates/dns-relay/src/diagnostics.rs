use std::time::Duration;

use dns::parse::DnsParser;
use tracing::{debug, enabled, info, trace, warn, Level};

/// Decodes an upstream reply purely to log what it contains.
///
/// Nothing here can fail the request: a reply this crate cannot decode is still relayed.
pub fn log_reply(reply: &[u8], elapsed: Duration) {
    let packet = match DnsParser::new(reply).parse() {
        Ok(packet) => packet,
        Err(e) => {
            warn!(error = %e, bytes = reply.len(), "could not decode upstream reply");
            return;
        }
    };

    info!(
        header = %packet.header,
        elapsed_ms = elapsed.as_millis() as u64,
        "relayed reply"
    );
    if packet.trailing_bytes > 0 {
        warn!(
            trailing_bytes = packet.trailing_bytes,
            records = packet.header.record_count(),
            "upstream reply carries more data than its header counts announce"
        );
    }
    for question in &packet.questions {
        info!(%question, "question");
    }
    for record in packet.records() {
        debug!(%record, rdlength = record.meta.len, "record");
    }

    if enabled!(Level::TRACE) {
        match serde_json::to_string(&packet) {
            Ok(json) => trace!(packet = %json, "decoded reply"),
            Err(e) => warn!(error = %e, "could not serialize decoded reply"),
        }
    }
}
