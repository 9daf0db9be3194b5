//! Decoders for type specific `RDATA` payloads, keyed by record type.

use std::{
    collections::HashMap,
    net::{Ipv4Addr, Ipv6Addr},
    sync::LazyLock,
};

use super::name::read_name;
use crate::{
    error::DecodeError,
    protocol::{record::RData, record_type::RecordType},
};

/// Decodes the payload of one record type.
pub type RDataDecoder = fn(&RDataSlice<'_>) -> Result<RData, DecodeError>;

static STANDARD: LazyLock<RDataRegistry> = LazyLock::new(RDataRegistry::with_standard_decoders);

/// A view on the `RDATA` of one record.
///
/// Decoders see the whole message because names inside `RDATA` may be compressed and
/// point back into earlier parts of it. The parser guarantees `offset + len` is in bounds.
#[derive(Debug, Clone, Copy)]
pub struct RDataSlice<'a> {
    pub record_type: RecordType,
    message: &'a [u8],
    offset: usize,
    len: usize,
    max_pointer_hops: usize,
}

impl<'a> RDataSlice<'a> {
    pub(crate) fn new(
        record_type: RecordType,
        message: &'a [u8],
        offset: usize,
        len: usize,
        max_pointer_hops: usize,
    ) -> Self {
        Self {
            record_type,
            message,
            offset,
            len,
            max_pointer_hops,
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        &self.message[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn length_error(&self, expected: usize) -> DecodeError {
        DecodeError::InvalidRDataLength {
            record_type: self.record_type,
            expected,
            actual: self.len,
        }
    }

    fn fixed<const N: usize>(&self) -> Result<[u8; N], DecodeError> {
        self.bytes()
            .try_into()
            .map_err(|_| self.length_error(N))
    }

    fn u16_at(&self, at: usize) -> Result<u16, DecodeError> {
        self.bytes()
            .get(at..at + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| self.length_error(at + 2))
    }

    fn u32_at(&self, at: usize) -> Result<u32, DecodeError> {
        self.bytes()
            .get(at..at + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| self.length_error(at + 4))
    }

    /// Reads a name at `at` (relative to the start of the `RDATA`) and returns it with the
    /// offset right after it. The name has to end inside the `RDATA`.
    fn name_at(&self, at: usize) -> Result<(String, usize), DecodeError> {
        if at >= self.len {
            return Err(self.length_error(at + 1));
        }
        let (name, consumed) = read_name(self.message, self.offset + at, self.max_pointer_hops)?;
        let end = at + consumed;
        if end > self.len {
            return Err(self.length_error(end));
        }
        Ok((name, end))
    }

    /// Like `name_at`, for names that have to fill the rest of the `RDATA` exactly.
    fn trailing_name_at(&self, at: usize) -> Result<String, DecodeError> {
        let (name, end) = self.name_at(at)?;
        if end != self.len {
            return Err(self.length_error(end));
        }
        Ok(name)
    }
}

/// Maps record types to their `RDATA` decoder.
///
/// Types without a decoder are never an error: they decode to [`RData::Unsupported`]
/// carrying the raw bytes.
#[derive(Debug, Clone, Default)]
pub struct RDataRegistry {
    decoders: HashMap<RecordType, RDataDecoder>,
}

impl RDataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry with every decoder this crate ships, built once.
    pub fn standard() -> &'static RDataRegistry {
        &STANDARD
    }

    pub fn with_standard_decoders() -> Self {
        let mut registry = Self::new();
        // A https://datatracker.ietf.org/doc/html/rfc1035#section-3.4.1
        registry.register(RecordType::A, decode_a);
        // NS https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.11
        registry.register(RecordType::NS, decode_ns);
        // CNAME https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.1
        registry.register(RecordType::CNAME, decode_cname);
        // SOA https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
        registry.register(RecordType::SOA, decode_soa);
        // PTR https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.12
        registry.register(RecordType::PTR, decode_ptr);
        // MX https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.9
        registry.register(RecordType::MX, decode_mx);
        // TXT https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.14
        registry.register(RecordType::TXT, decode_txt);
        // AAAA https://datatracker.ietf.org/doc/html/rfc3596#section-2.2
        registry.register(RecordType::AAAA, decode_aaaa);
        registry
    }

    pub fn register(&mut self, record_type: RecordType, decoder: RDataDecoder) {
        self.decoders.insert(record_type, decoder);
    }

    pub fn decode(&self, rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
        match self.decoders.get(&rdata.record_type) {
            Some(decoder) => decoder(rdata),
            None => Ok(RData::Unsupported {
                record_type: rdata.record_type,
                raw: rdata.bytes().to_vec(),
            }),
        }
    }
}

fn decode_a(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    Ok(RData::A {
        ipv4: Ipv4Addr::from(rdata.fixed::<4>()?),
    })
}

fn decode_aaaa(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    Ok(RData::AAAA {
        ipv6: Ipv6Addr::from(rdata.fixed::<16>()?),
    })
}

fn decode_ns(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    Ok(RData::NS {
        ns: rdata.trailing_name_at(0)?,
    })
}

fn decode_cname(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    Ok(RData::CNAME {
        cname: rdata.trailing_name_at(0)?,
    })
}

fn decode_ptr(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    Ok(RData::PTR {
        domain_name: rdata.trailing_name_at(0)?,
    })
}

fn decode_mx(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    let preference = rdata.u16_at(0)?;
    let exchange = rdata.trailing_name_at(2)?;
    Ok(RData::MX {
        preference,
        exchange,
    })
}

fn decode_soa(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    let (mname, at) = rdata.name_at(0)?;
    let (rname, at) = rdata.name_at(at)?;
    if at + 20 != rdata.len() {
        return Err(rdata.length_error(at + 20));
    }
    Ok(RData::SOA {
        mname,
        rname,
        serial: rdata.u32_at(at)?,
        refresh: rdata.u32_at(at + 4)?,
        retry: rdata.u32_at(at + 8)?,
        expire: rdata.u32_at(at + 12)?,
        minimum: rdata.u32_at(at + 16)?,
    })
}

fn decode_txt(rdata: &RDataSlice<'_>) -> Result<RData, DecodeError> {
    let bytes = rdata.bytes();
    let mut strings = Vec::new();
    let mut at = 0;
    while at < bytes.len() {
        let len = usize::from(bytes[at]);
        let s = bytes
            .get(at + 1..at + 1 + len)
            .ok_or_else(|| rdata.length_error(at + 1 + len))?;
        strings.push(String::from_utf8_lossy(s).into_owned());
        at += 1 + len;
    }
    Ok(RData::TXT { strings })
}
