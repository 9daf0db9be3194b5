pub mod error;
pub mod forwarder;
pub mod parse;
pub mod protocol;
pub mod serialize;
