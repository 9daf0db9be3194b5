use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(short, long, default_value_t = String::from("0.0.0.0"))]
    pub bind_address: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 1053)]
    pub port: u16,

    /// DNS server to forward to
    #[arg(short, long, default_value_t = String::from("8.8.8.8:53"))]
    pub upstream: String,

    /// How long to wait for the upstream to answer a single query, in milliseconds
    #[arg(short, long, default_value_t = 2000)]
    pub timeout_ms: u64,

    /// Maximum number of queries forwarded at the same time
    #[arg(short, long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_in_flight: u32,

    /// Size of the buffer an upstream reply is read into, at least a DNS header
    #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u16).range(12..))]
    pub reply_buffer_size: u16,

    /// Whether to only log warnings and errors
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl ServerArgs {
    pub fn from_env() -> Self {
        Self::parse()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
