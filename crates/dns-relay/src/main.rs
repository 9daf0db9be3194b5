mod cli;
mod diagnostics;
mod resolution;
mod server;
mod slots;

use std::sync::Arc;

use anyhow::Context;
use cli::{LogFormat, ServerArgs};
use dns::forwarder::UpstreamForwarder;
use resolution::Relay;
use slots::InFlight;
use tokio::{net::UdpSocket, signal::ctrl_c};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server_args = ServerArgs::from_env();
    init_tracing(&server_args);

    let client_socket = UdpSocket::bind((server_args.bind_address.as_str(), server_args.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                server_args.bind_address, server_args.port
            )
        })?;
    let forwarder =
        UpstreamForwarder::new(server_args.upstream.clone(), server_args.upstream_timeout())
            .with_reply_buffer_size(usize::from(server_args.reply_buffer_size));
    info!(
        listen = %client_socket.local_addr()?,
        upstream = forwarder.upstream(),
        timeout_ms = forwarder.timeout().as_millis() as u64,
        max_in_flight = server_args.max_in_flight,
        "started DNS relay"
    );

    let relay = Arc::new(Relay::new(client_socket, forwarder));
    let in_flight = InFlight::new(server_args.max_in_flight as usize);

    server::serve(relay, in_flight, shutdown_signal()).await;
    Ok(())
}

fn init_tracing(server_args: &ServerArgs) {
    let default_level = if server_args.quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match server_args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}
