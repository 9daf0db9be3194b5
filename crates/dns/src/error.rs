use std::{io, time::Duration};

use thiserror::Error;

use crate::protocol::record_type::RecordType;

/// Everything that can go wrong while decoding a DNS message from wire format.
///
/// Decode errors are always local to a single message. A relay surfaces them in its
/// diagnostics but never lets them influence what gets sent back to a client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message is truncated")]
    TruncatedMessage,

    #[error("invalid label length {0}, labels must be 1-63 bytes")]
    InvalidLabelLength(u8),

    #[error("invalid RDATA length for {record_type} record: expected {expected} bytes, got {actual}")]
    InvalidRDataLength {
        record_type: RecordType,
        expected: usize,
        actual: usize,
    },

    #[error("compression pointer at offset {at} targets offset {target}, which is not before it")]
    InvalidPointer { at: usize, target: usize },

    #[error("name follows more than {limit} compression pointers")]
    PointerChainTooLong { limit: usize },
}

/// Failures of a single round trip to the upstream resolver.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("upstream {upstream} is unreachable: {source}")]
    UpstreamUnreachable {
        upstream: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to send query to upstream {upstream}: {source}")]
    UpstreamWriteFailed {
        upstream: String,
        #[source]
        source: io::Error,
    },

    #[error("upstream {upstream} did not answer within {timeout:?}")]
    UpstreamTimeout { upstream: String, timeout: Duration },

    #[error("failed to read reply from upstream {upstream}: {source}")]
    UpstreamReadFailed {
        upstream: String,
        #[source]
        source: io::Error,
    },
}

impl ForwardError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::UpstreamTimeout { .. })
    }
}
