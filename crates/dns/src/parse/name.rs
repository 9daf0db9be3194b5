//! Domain name decoding, see https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
//!
//! Names are rendered dot-joined with a trailing dot (`www.example.com.`), label case
//! preserved. The root name renders as `.`.

use crate::error::DecodeError;

pub const MAX_LABEL_LEN: u8 = 63;

/// Upper bound on compression pointers followed while decoding one name.
pub const DEFAULT_MAX_POINTER_HOPS: usize = 16;

const POINTER_MASK: u8 = 0xC0;

/// Checks whether the byte at `offset` starts a compression pointer and, if so, returns
/// the absolute offset it points to.
///
/// A pointer has to point strictly before the offset it was read from. Anything else
/// can only come from a corrupted or malicious message.
pub fn pointer_target(buf: &[u8], offset: usize) -> Result<Option<usize>, DecodeError> {
    let first = *buf.get(offset).ok_or(DecodeError::TruncatedMessage)?;
    if first & POINTER_MASK != POINTER_MASK {
        return Ok(None);
    }
    let second = *buf.get(offset + 1).ok_or(DecodeError::TruncatedMessage)?;
    let target = usize::from(u16::from_be_bytes([first & !POINTER_MASK, second]));
    if target >= offset {
        return Err(DecodeError::InvalidPointer { at: offset, target });
    }
    Ok(Some(target))
}

/// Decodes the name starting at `offset` in the full message `buf`.
///
/// Returns the name and the number of bytes it occupies at `offset`. When the name is
/// (or ends in) a compression pointer, only the bytes up to and including that first
/// pointer count, no matter how long the name it points to is.
pub fn read_name(
    buf: &[u8],
    offset: usize,
    max_pointer_hops: usize,
) -> Result<(String, usize), DecodeError> {
    let mut name = String::new();
    let mut cursor = offset;
    let mut consumed = None;
    let mut hops = 0;

    loop {
        if let Some(target) = pointer_target(buf, cursor)? {
            if consumed.is_none() {
                consumed = Some(cursor + 2 - offset);
            }
            hops += 1;
            if hops > max_pointer_hops {
                return Err(DecodeError::PointerChainTooLong {
                    limit: max_pointer_hops,
                });
            }
            cursor = target;
            continue;
        }

        let len = buf[cursor];
        if len == 0 {
            cursor += 1;
            break;
        }
        if len > MAX_LABEL_LEN {
            return Err(DecodeError::InvalidLabelLength(len));
        }
        let label = buf
            .get(cursor + 1..cursor + 1 + usize::from(len))
            .ok_or(DecodeError::TruncatedMessage)?;
        push_label(&mut name, label);
        name.push('.');
        cursor += 1 + usize::from(len);
    }

    if name.is_empty() {
        name.push('.');
    }
    Ok((name, consumed.unwrap_or_else(|| cursor - offset)))
}

/// Appends a label in presentation format (RFC 4343): `.` and `\` are escaped with a
/// backslash, bytes outside printable ASCII become `\DDD`.
fn push_label(name: &mut String, label: &[u8]) {
    for &c in label {
        match c {
            b'.' | b'\\' => {
                name.push('\\');
                name.push(char::from(c));
            }
            0x21..=0x7E => name.push(char::from(c)),
            _ => name.push_str(&format!("\\{c:03}")),
        }
    }
}

/// Encodes a dotted name into uncompressed wire format. A trailing dot is optional.
pub fn encode_domain_name(domain_name: &str) -> Result<Vec<u8>, DecodeError> {
    let mut encoded = Vec::with_capacity(domain_name.len() + 2);
    let trimmed = domain_name.strip_suffix('.').unwrap_or(domain_name);
    if !trimmed.is_empty() {
        for part in trimmed.split('.') {
            let len = u8::try_from(part.len())
                .ok()
                .filter(|len| (1..=MAX_LABEL_LEN).contains(len))
                .ok_or(DecodeError::InvalidLabelLength(part.len().min(255) as u8))?;
            encoded.push(len);
            encoded.extend(part.as_bytes());
        }
    }
    encoded.push(0);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::{encode_domain_name, pointer_target, read_name, DEFAULT_MAX_POINTER_HOPS};
    use crate::error::DecodeError;

    fn read(buf: &[u8], offset: usize) -> Result<(String, usize), DecodeError> {
        read_name(buf, offset, DEFAULT_MAX_POINTER_HOPS)
    }

    #[test]
    fn test_encode_domain_name() {
        let res = encode_domain_name("www.example.com").unwrap();
        assert_eq!(
            res,
            vec![
                // www.example.com
                3, 0x77, 0x77, 0x77, 7, 0x65, 0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, 3, 0x63, 0x6f,
                0x6d, 0
            ]
        );
        assert_eq!(encode_domain_name("www.example.com.").unwrap(), res);
        assert_eq!(encode_domain_name(".").unwrap(), vec![0]);
    }

    #[test]
    fn test_encode_rejects_bad_labels() {
        assert_eq!(
            encode_domain_name("a..b"),
            Err(DecodeError::InvalidLabelLength(0))
        );
        let long = "a".repeat(64);
        assert_eq!(
            encode_domain_name(&long),
            Err(DecodeError::InvalidLabelLength(64))
        );
    }

    #[test]
    fn test_read_inline_name() {
        let buf = encode_domain_name("www.Example.com").unwrap();
        assert_eq!(read(&buf, 0).unwrap(), ("www.Example.com.".to_string(), 17));
    }

    #[test]
    fn test_read_root_name() {
        assert_eq!(read(&[0], 0).unwrap(), (".".to_string(), 1));
    }

    #[test]
    fn test_decode_encode_roundtrip() {
        let max_label = "x".repeat(63);
        let long = format!("{max_label}.{max_label}.");
        for name in [
            "a.",
            "example.com.",
            "MiXeD.CaSe.org.",
            "a-b.c_d.e1.",
            long.as_str(),
        ] {
            let encoded = encode_domain_name(name).unwrap();
            let (decoded, consumed) = read(&encoded, 0).unwrap();
            assert_eq!(decoded, name);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_pointer_detection() {
        let buf = [0u8, 0, 0, 0, 0xC0, 0x02, 0x03];
        assert_eq!(pointer_target(&buf, 4), Ok(Some(2)));
        assert_eq!(pointer_target(&buf, 6), Ok(None));
        // 14 bit offset uses the low 6 bits of the first byte
        let mut far = vec![0u8; 0x0140];
        far.extend([0xC1, 0x02]);
        assert_eq!(pointer_target(&far, 0x0140), Ok(Some(0x0102)));
    }

    #[test]
    fn test_pointer_resolves_like_target() {
        let mut buf = vec![0xAA, 0xBB];
        buf.extend(encode_domain_name("example.com").unwrap());
        let pointer_at = buf.len();
        buf.extend([0xC0, 0x02]);

        let direct = read(&buf, 2).unwrap();
        let (via_pointer, consumed) = read(&buf, pointer_at).unwrap();
        assert_eq!(via_pointer, direct.0);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_label_prefix_then_pointer() {
        let mut buf = encode_domain_name("example.com").unwrap();
        let start = buf.len();
        buf.extend([3, b'w', b'w', b'w', 0xC0, 0x00]);
        assert_eq!(read(&buf, start).unwrap(), ("www.example.com.".to_string(), 6));
    }

    #[test]
    fn test_pointer_to_itself_is_rejected() {
        let buf = [0xC0, 0x00];
        assert_eq!(
            read(&buf, 0),
            Err(DecodeError::InvalidPointer { at: 0, target: 0 })
        );
    }

    #[test]
    fn test_forward_pointer_is_rejected() {
        let mut buf = vec![0xC0, 0x04, 0, 0];
        buf.extend(encode_domain_name("example.com").unwrap());
        assert_eq!(
            read(&buf, 0),
            Err(DecodeError::InvalidPointer { at: 0, target: 4 })
        );
    }

    #[test]
    fn test_backward_pointer_loop_hits_hop_limit() {
        // offset 0: label "a", then a pointer back to offset 0 -> endless "a.a.a..."
        let buf = [1, b'a', 0xC0, 0x00];
        assert_eq!(
            read(&buf, 0),
            Err(DecodeError::PointerChainTooLong {
                limit: DEFAULT_MAX_POINTER_HOPS
            })
        );
    }

    #[test]
    fn test_pointer_chain_respects_configured_limit() {
        // name at 0, then three chained pointers each pointing at the previous one
        let mut buf = encode_domain_name("a").unwrap(); // 3 bytes
        buf.extend([0xC0, 0x00]); // @3 -> 0
        buf.extend([0xC0, 0x03]); // @5 -> 3
        buf.extend([0xC0, 0x05]); // @7 -> 5

        assert_eq!(read_name(&buf, 7, 3).unwrap(), ("a.".to_string(), 2));
        assert_eq!(
            read_name(&buf, 7, 2),
            Err(DecodeError::PointerChainTooLong { limit: 2 })
        );
    }

    #[test]
    fn test_compressed_owner_after_question() {
        // header-sized padding, question name at 12, then an owner name `C0 0C`
        let mut buf = vec![0u8; 12];
        buf.extend(encode_domain_name("example.com").unwrap());
        buf.extend([0, 1, 0, 1]);
        let owner_at = buf.len();
        buf.extend([0xC0, 12]);
        assert_eq!(read(&buf, owner_at).unwrap(), ("example.com.".to_string(), 2));
    }

    #[test]
    fn test_prefix_pointing_into_earlier_pointer() {
        // "example.com" at 0, "www" + pointer to 0 at 13, "a" + pointer to 13 at 19
        let mut buf = encode_domain_name("example.com").unwrap();
        buf.extend([3, b'w', b'w', b'w', 0xC0, 0x00]);
        let start = buf.len();
        buf.extend([1, b'a', 0xC0, 13]);
        assert_eq!(read(&buf, start).unwrap(), ("a.www.example.com.".to_string(), 4));
    }

    #[test]
    fn test_label_bytes_are_escaped() {
        let buf = [3, b'a', b'.', b'b', 2, b'\\', 0xC3, 2, b' ', 0x07, 0];
        assert_eq!(
            read(&buf, 0).unwrap(),
            (r"a\.b.\\\195.\032\007.".to_string(), buf.len())
        );
    }

    #[test]
    fn test_reserved_label_types_are_rejected() {
        assert_eq!(read(&[0x40, 0], 0), Err(DecodeError::InvalidLabelLength(0x40)));
        assert_eq!(read(&[0x80, 0], 0), Err(DecodeError::InvalidLabelLength(0x80)));
    }

    #[test]
    fn test_truncated_names() {
        assert_eq!(read(&[], 0), Err(DecodeError::TruncatedMessage));
        assert_eq!(read(&[3, b'w', b'w'], 0), Err(DecodeError::TruncatedMessage));
        // label complete but no terminator
        assert_eq!(read(&[1, b'a'], 0), Err(DecodeError::TruncatedMessage));
        assert_eq!(read(&[0xC0], 0), Err(DecodeError::TruncatedMessage));
    }
}
