use std::fmt;

use serde::Serialize;

use super::response_code::ResponseCode;

/// Size of the fixed DNS header in bytes.
pub const HEADER_LEN: usize = 12;

// Header section format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize)]
pub struct Header {
    pub request_id: u16,
    pub flags: Flags,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl Header {
    /// Number of resource records announced across the answer, authority and additional sections.
    pub fn record_count(&self) -> usize {
        usize::from(self.answer_count)
            + usize::from(self.authority_count)
            + usize::from(self.additional_count)
    }
}

impl From<Header> for [u8; HEADER_LEN] {
    fn from(header: Header) -> Self {
        let raw_flags: u16 = header.flags.into();
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&header.request_id.to_be_bytes());
        out[2..4].copy_from_slice(&raw_flags.to_be_bytes());
        out[4..6].copy_from_slice(&header.question_count.to_be_bytes());
        out[6..8].copy_from_slice(&header.answer_count.to_be_bytes());
        out[8..10].copy_from_slice(&header.authority_count.to_be_bytes());
        out[10..12].copy_from_slice(&header.additional_count.to_be_bytes());
        out
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} {} qd={} an={} ns={} ar={}",
            self.request_id,
            self.flags,
            self.question_count,
            self.answer_count,
            self.authority_count,
            self.additional_count
        )
    }
}

/// The second 16-bit word of the header, split into its fields.
///
/// Note that `query` is the inverse of the wire QR bit: it is `true` for queries (QR=0).
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize)]
pub struct Flags {
    pub query: bool,
    pub opcode: u8,
    pub authoritative_answer: bool,
    pub truncation: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub z: u8,
    pub response_code: u8,
}

impl Flags {
    pub fn rcode(&self) -> ResponseCode {
        ResponseCode::from(self.response_code)
    }
}

impl From<u16> for Flags {
    fn from(input: u16) -> Self {
        Self {
            query: (input >> 15 & 1) == 0,
            opcode: (input >> 11 & 0xF) as u8,
            authoritative_answer: (input >> 10 & 1) > 0,
            truncation: (input >> 9 & 1) > 0,
            recursion_desired: (input >> 8 & 1) > 0,
            recursion_available: (input >> 7 & 1) > 0,
            z: (input >> 4 & 0x7) as u8,
            response_code: (input & 0xF) as u8,
        }
    }
}

impl From<Flags> for u16 {
    fn from(flags: Flags) -> Self {
        let mut value = 0u16;
        value |= if flags.query { 0 } else { 0x8000 }; // MSB needs to be set
        value |= u16::from(flags.opcode & 0xF) << 11;
        value |= u16::from(flags.authoritative_answer) << 10;
        value |= u16::from(flags.truncation) << 9;
        value |= u16::from(flags.recursion_desired) << 8;
        value |= u16::from(flags.recursion_available) << 7;
        value |= u16::from(flags.z & 0x7) << 4;
        value |= u16::from(flags.response_code & 0xF);
        value
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.query { "query" } else { "response" };
        write!(f, "{kind} opcode={}", self.opcode)?;
        for (set, name) in [
            (self.authoritative_answer, "aa"),
            (self.truncation, "tc"),
            (self.recursion_desired, "rd"),
            (self.recursion_available, "ra"),
        ] {
            if set {
                write!(f, " {name}")?;
            }
        }
        write!(f, " rcode={}", self.rcode())
    }
}
