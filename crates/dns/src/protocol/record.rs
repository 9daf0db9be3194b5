use std::{
    fmt::{self, Write},
    net::{Ipv4Addr, Ipv6Addr},
};

use serde::{Serialize, Serializer};

use super::{record_class::RecordClass, record_type::RecordType};
use crate::error::DecodeError;

/// The fields every resource record shares, regardless of its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordMeta {
    pub name: String,
    pub r#type: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub len: u16,
}

// Resource record format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.3
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub meta: RecordMeta,
    /// The decoded `RDATA`. A record whose payload failed to decode still occupies its
    /// slot in the section, so the error is kept here instead of failing the section.
    #[serde(serialize_with = "serialize_rdata")]
    pub data: Result<RData, DecodeError>,
}

impl ResourceRecord {
    pub fn new(meta: RecordMeta, data: Result<RData, DecodeError>) -> Self {
        Self { meta, data }
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = &self.meta;
        write!(f, "{} {} {} {} ", meta.name, meta.ttl, meta.class, meta.r#type)?;
        match &self.data {
            Ok(data) => write!(f, "{data}"),
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

fn serialize_rdata<S: Serializer>(
    data: &Result<RData, DecodeError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Invalid {
        error: String,
    }

    match data {
        Ok(data) => data.serialize(serializer),
        Err(e) => Invalid {
            error: e.to_string(),
        }
        .serialize(serializer),
    }
}

/// Type specific `RDATA` payloads.
///
/// See Section 3.3 Standard RRs (https://datatracker.ietf.org/doc/html/rfc1035#section-3.3)
/// for the layout of each variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum RData {
    A {
        ipv4: Ipv4Addr,
    },
    AAAA {
        ipv6: Ipv6Addr,
    },
    NS {
        ns: String,
    },
    CNAME {
        cname: String,
    },
    MX {
        preference: u16,
        exchange: String,
    },
    PTR {
        domain_name: String,
    },
    SOA {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    TXT {
        strings: Vec<String>,
    },
    /// A type we have no decoder for. Not an error, the raw payload is kept as is.
    Unsupported {
        record_type: RecordType,
        raw: Vec<u8>,
    },
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A { ipv4 } => write!(f, "{ipv4}"),
            RData::AAAA { ipv6 } => write!(f, "{ipv6}"),
            RData::NS { ns } => f.write_str(ns),
            RData::CNAME { cname } => f.write_str(cname),
            RData::MX {
                preference,
                exchange,
            } => write!(f, "{preference} {exchange}"),
            RData::PTR { domain_name } => f.write_str(domain_name),
            RData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => write!(
                f,
                "{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}"
            ),
            RData::TXT { strings } => {
                for (i, s) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{s:?}")?;
                }
                Ok(())
            }
            // Unknown RR presentation format https://datatracker.ietf.org/doc/html/rfc3597#section-5
            RData::Unsupported { raw, .. } => {
                write!(f, "\\# {}", raw.len())?;
                if !raw.is_empty() {
                    f.write_char(' ')?;
                    for byte in raw {
                        write!(f, "{byte:02x}")?;
                    }
                }
                Ok(())
            }
        }
    }
}
