use std::fmt;

use serde::{Serialize, Serializer};

/// CLASS and QCLASS values, see https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.4
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordClass {
    IN,   // 1 the Internet
    CS,   // 2 the CSNET class (Obsolete)
    CH,   // 3 the CHAOS class
    HS,   // 4 Hesiod
    NONE, // 254 RFC 2136
    ANY,  // 255 any class (QCLASS only)
    Unknown(u16),
}

impl From<u16> for RecordClass {
    fn from(input: u16) -> Self {
        match input {
            1 => Self::IN,
            2 => Self::CS,
            3 => Self::CH,
            4 => Self::HS,
            254 => Self::NONE,
            255 => Self::ANY,
            _ => Self::Unknown(input),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        match value {
            RecordClass::IN => 1,
            RecordClass::CS => 2,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::NONE => 254,
            RecordClass::ANY => 255,
            RecordClass::Unknown(n) => n,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Unknown(n) => write!(f, "CLASS{n}"),
            known => write!(f, "{known:?}"),
        }
    }
}

impl Serialize for RecordClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
