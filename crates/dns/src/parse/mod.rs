pub mod name;
pub mod parser;
pub mod rdata;

pub use parser::{decode_header, decode_question, decode_records, DnsPacket, DnsParser};
