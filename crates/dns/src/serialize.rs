use crate::{
    error::DecodeError,
    parse::{decode_header, decode_question, name::encode_domain_name},
    protocol::{
        header::{Flags, Header, HEADER_LEN},
        record_type::RecordType,
        response_code::ResponseCode,
    },
};

/// Builds a SERVFAIL reply for `query`, for when the upstream could not be reached.
///
/// The reply copies the query's ID, OPCODE and RD bit and echoes its question when there
/// is exactly one that decodes cleanly. Returns `None` if `query` is too short to even
/// carry a header, since there is no ID to answer to.
pub fn servfail_for(query: &[u8]) -> Option<Vec<u8>> {
    let request = decode_header(query).ok()?;

    let question = if request.question_count == 1 {
        decode_question(query, HEADER_LEN)
            .ok()
            .map(|(_, consumed)| &query[HEADER_LEN..HEADER_LEN + consumed])
    } else {
        None
    };

    let flags = Flags {
        query: false,
        opcode: request.flags.opcode,
        recursion_desired: request.flags.recursion_desired,
        response_code: ResponseCode::SERVFAIL.into(),
        ..Flags::default()
    };

    let header = Header {
        request_id: request.request_id,
        flags,
        question_count: u16::from(question.is_some()),
        ..Header::default()
    };

    let mut packet = Vec::with_capacity(HEADER_LEN + question.map_or(0, <[u8]>::len));
    let h: [u8; HEADER_LEN] = header.into();
    packet.extend_from_slice(&h);
    if let Some(question) = question {
        packet.extend_from_slice(question);
    }
    Some(packet)
}

/// Builds a recursion-desired query for `domain` in class IN.
pub fn build_query(
    domain: &str,
    record_type: RecordType,
    id: u16,
) -> Result<Vec<u8>, DecodeError> {
    let header = Header {
        request_id: id,
        flags: Flags {
            query: true,
            recursion_desired: true,
            ..Flags::default()
        },
        question_count: 1,
        ..Header::default()
    };

    let name = encode_domain_name(domain)?;
    let mut request = Vec::with_capacity(HEADER_LEN + name.len() + 4);
    let h: [u8; HEADER_LEN] = header.into();
    request.extend(h);
    request.extend(name);
    request.extend(u16::from(record_type).to_be_bytes());
    request.extend(1u16.to_be_bytes()); // IN
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::{build_query, servfail_for};
    use crate::{
        parse::DnsParser,
        protocol::{record_type::RecordType, response_code::ResponseCode},
    };

    #[test]
    fn test_build_query() {
        let query = build_query("www.example.com", RecordType::A, 1337).unwrap();
        assert_eq!(&query[..4], &[0x05, 0x39, 0x01, 0x00]);

        let packet = DnsParser::new(&query).parse().unwrap();
        assert!(packet.header.flags.query);
        assert!(packet.header.flags.recursion_desired);
        assert_eq!(packet.questions.len(), 1);
        assert_eq!(packet.questions[0].domain_name, "www.example.com.");
        assert_eq!(packet.questions[0].r#type, RecordType::A);
    }

    #[test]
    fn test_servfail_echoes_id_and_question() {
        let query = build_query("example.org", RecordType::MX, 0x4242).unwrap();
        let reply = servfail_for(&query).unwrap();

        let packet = DnsParser::new(&reply).parse().unwrap();
        assert_eq!(packet.header.request_id, 0x4242);
        assert!(!packet.header.flags.query);
        assert!(packet.header.flags.recursion_desired);
        assert!(!packet.header.flags.recursion_available);
        assert_eq!(packet.header.flags.rcode(), ResponseCode::SERVFAIL);
        assert_eq!(packet.header.record_count(), 0);
        assert_eq!(packet.questions.len(), 1);
        assert_eq!(packet.questions[0].domain_name, "example.org.");
        assert_eq!(packet.questions[0].r#type, RecordType::MX);
        assert_eq!(&reply[12..], &query[12..]);
    }

    #[test]
    fn test_servfail_without_decodable_question() {
        let mut query = build_query("example.org", RecordType::A, 7).unwrap();
        query.truncate(15);
        let reply = servfail_for(&query).unwrap();
        assert_eq!(reply.len(), 12);

        let packet = DnsParser::new(&reply).parse().unwrap();
        assert_eq!(packet.header.request_id, 7);
        assert_eq!(packet.header.question_count, 0);
        assert_eq!(packet.header.flags.rcode(), ResponseCode::SERVFAIL);
    }

    #[test]
    fn test_servfail_needs_a_header() {
        assert_eq!(servfail_for(&[0x12, 0x34, 0x01]), None);
    }
}
