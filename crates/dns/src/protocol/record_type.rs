use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
/// This enum models all record types this crate knows a mnemonic for.
///
/// The record type determines how the `RDATA` field in the respective resource record
/// has to be parsed. Other than that `RDATA` field, all other resource record data occurrs
/// in a shared format.
///
/// Question entries may carry `QTYPE`s (e.g. `AXFR`, `ANY`) that never show up in answers.
/// We model both in one enum since only the `RDATA` decoders care about the difference.
///
/// Codes without a mnemonic are kept verbatim in `Unknown` and render as `TYPE<n>`,
/// following https://datatracker.ietf.org/doc/html/rfc3597#section-5.
pub enum RecordType {
    // RFC 1035 defines
    // - 16 TYPEs, see https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.2
    A,     // 1 a host address
    NS,    // 2 an authoritative name server
    MD,    // 3 a mail destination (Obsolete - use MX)
    MF,    // 4 a mail forwarder (Obsolete - use MX)
    CNAME, // 5 the canonical name for an alias
    SOA,   // 6 marks the start of a zone of authority
    MB,    // 7 a mailbox domain name (EXPERIMENTAL)
    MG,    // 8 a mail group member (EXPERIMENTAL)
    MR,    // 9 a mail rename domain name (EXPERIMENTAL)
    NULL,  // 10 a null RR (EXPERIMENTAL)
    WKS,   // 11 a well known service description
    PTR,   // 12 a domain name pointer
    HINFO, // 13 host information
    MINFO, // 14 mailbox or mail list information
    MX,    // 15 mail exchange
    TXT,   // 16 text strings
    // - 4 QTYPEs, see https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.3
    AXFR,  // 252 A request for a transfer of an entire zone
    MAILB, // 253 A request for mailbox-related records (MB, MG or MR)
    MAILA, // 254 A request for mail agent RRs (Obsolete - see MX)
    ANY,   // 255 A request for all records
    // Pseudo RR type - see https://en.wikipedia.org/wiki/List_of_DNS_record_types
    OPT, // 41 A pseudo record type to support EDNS.
    // Later Extensions
    AAAA,   // 28 IPv6 host address, RFC 3596
    SRV,    // 33 service locator, RFC 2782
    NAPTR,  // 35 naming authority pointer, RFC 3403
    DS,     // 43 delegation signer, RFC 4034
    DNSKEY, // 48 DNSSEC key, RFC 4034
    TLSA,   // 52 TLSA certificate association, RFC 6698
    HTTPS,  // 65 HTTPS & SVCB extension, RFC 9460
    CAA,    // 257 certification authority authorization, RFC 8659
    // Fallback
    Unknown(u16),
}

impl RecordType {
    /// The presentation mnemonic, if this type has one.
    pub fn mnemonic(&self) -> Option<&'static str> {
        let name = match self {
            RecordType::A => "A",
            RecordType::NS => "NS",
            RecordType::MD => "MD",
            RecordType::MF => "MF",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::MB => "MB",
            RecordType::MG => "MG",
            RecordType::MR => "MR",
            RecordType::NULL => "NULL",
            RecordType::WKS => "WKS",
            RecordType::PTR => "PTR",
            RecordType::HINFO => "HINFO",
            RecordType::MINFO => "MINFO",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::AXFR => "AXFR",
            RecordType::MAILB => "MAILB",
            RecordType::MAILA => "MAILA",
            RecordType::ANY => "ANY",
            RecordType::OPT => "OPT",
            RecordType::AAAA => "AAAA",
            RecordType::SRV => "SRV",
            RecordType::NAPTR => "NAPTR",
            RecordType::DS => "DS",
            RecordType::DNSKEY => "DNSKEY",
            RecordType::TLSA => "TLSA",
            RecordType::HTTPS => "HTTPS",
            RecordType::CAA => "CAA",
            RecordType::Unknown(_) => return None,
        };
        Some(name)
    }
}

impl From<u16> for RecordType {
    fn from(input: u16) -> Self {
        match input {
            // TYPE
            1 => Self::A,
            2 => Self::NS,
            3 => Self::MD,
            4 => Self::MF,
            5 => Self::CNAME,
            6 => Self::SOA,
            7 => Self::MB,
            8 => Self::MG,
            9 => Self::MR,
            10 => Self::NULL,
            11 => Self::WKS,
            12 => Self::PTR,
            13 => Self::HINFO,
            14 => Self::MINFO,
            15 => Self::MX,
            16 => Self::TXT,
            // QTYPE
            252 => Self::AXFR,
            253 => Self::MAILB,
            254 => Self::MAILA,
            255 => Self::ANY,
            // Other
            41 => Self::OPT,
            // Extensions
            28 => Self::AAAA,
            33 => Self::SRV,
            35 => Self::NAPTR,
            43 => Self::DS,
            48 => Self::DNSKEY,
            52 => Self::TLSA,
            65 => Self::HTTPS,
            257 => Self::CAA,
            _ => Self::Unknown(input),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::MD => 3,
            RecordType::MF => 4,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::MB => 7,
            RecordType::MG => 8,
            RecordType::MR => 9,
            RecordType::NULL => 10,
            RecordType::WKS => 11,
            RecordType::PTR => 12,
            RecordType::HINFO => 13,
            RecordType::MINFO => 14,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::OPT => 41,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::NAPTR => 35,
            RecordType::DS => 43,
            RecordType::DNSKEY => 48,
            RecordType::TLSA => 52,
            RecordType::HTTPS => 65,
            RecordType::CAA => 257,
            RecordType::AXFR => 252,
            RecordType::MAILB => 253,
            RecordType::MAILA => 254,
            RecordType::ANY => 255,
            RecordType::Unknown(n) => n,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "TYPE{}", u16::from(*self)),
        }
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::RecordType;

    #[test]
    fn test_known_codes_roundtrip() {
        for code in [1u16, 2, 5, 6, 12, 15, 16, 28, 33, 41, 65, 255, 257] {
            let record_type = RecordType::from(code);
            assert!(!matches!(record_type, RecordType::Unknown(_)), "{code}");
            assert_eq!(u16::from(record_type), code);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RecordType::from(1u16).to_string(), "A");
        assert_eq!(RecordType::from(28u16).to_string(), "AAAA");
        assert_eq!(RecordType::from(99u16).to_string(), "TYPE99");
    }
}
