//! OSCore Monitor
//!
//! Listens on a UDP port and logs every OSC message whose address matches
//! one of the given patterns.

use anyhow::{bail, Context, Result};
use clap::Parser;
use oscore_core::{Method, OscMessage, OscServer, TypeTag};
use oscore_transport::{OscSocket, SocketConfig};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oscore-monitor")]
#[command(about = "OSC traffic monitor")]
#[command(version)]
struct Cli {
    /// UDP port to listen on
    #[arg(short, long, default_value_t = oscore_core::DEFAULT_PORT)]
    port: u16,

    /// Local interface to bind
    #[arg(short, long, default_value_t = Ipv4Addr::UNSPECIFIED)]
    bind: Ipv4Addr,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = oscore_core::server::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Address pattern to log (repeatable)
    #[arg(short = 'm', long = "pattern", default_values_t = [
        "/*".to_string(),
        "/*/*".to_string(),
        "/*/*/*".to_string(),
        "/*/*/*/*".to_string(),
    ])]
    patterns: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let received = Arc::new(AtomicU64::new(0));
    let server = OscServer::new(cli.buffer_size);

    let log_method = {
        let received = received.clone();
        Method::new(move |msg| {
            received.fetch_add(1, Ordering::Relaxed);
            tracing::info!("{}", describe(msg));
        })
    };
    for pattern in &cli.patterns {
        let added = server
            .try_add_method(pattern, log_method.clone())
            .with_context(|| format!("failed to register {}", pattern))?;
        if !added {
            bail!("not a valid OSC address or pattern: {}", pattern);
        }
    }

    let config = SocketConfig {
        bind_addr: cli.bind,
        port: cli.port,
        ..SocketConfig::default()
    };
    let mut socket = OscSocket::new(config, server)?;
    socket.start()?;

    tracing::info!(
        "Monitoring {} pattern(s), press Ctrl+C to stop",
        cli.patterns.len()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    socket.dispose();
    tokio::task::spawn_blocking(move || socket.join()).await?;

    tracing::info!("{} message(s) received", received.load(Ordering::Relaxed));
    Ok(())
}

/// One-line rendering of a message: address, type tags and values
fn describe(msg: &OscMessage<'_>) -> String {
    let tags: String = msg.elements().iter().map(|e| e.tag.as_char()).collect();
    let values: Vec<String> = (0..msg.element_count())
        .map(|i| describe_element(msg, i))
        .collect();

    let mut line = format!("{} ,{} {}", msg.address(), tags, values.join(" "));
    if let Some(time) = msg.bundle_time() {
        line.push_str(&format!(" @{}", time));
    }
    line
}

fn describe_element(msg: &OscMessage<'_>, index: usize) -> String {
    let Some(tag) = msg.tag(index) else {
        return String::new();
    };
    match tag {
        TypeTag::Int32 => msg.read_int(index).to_string(),
        TypeTag::Float32 => msg.read_float(index).to_string(),
        TypeTag::String | TypeTag::AltString => format!("{:?}", msg.read_string(index)),
        TypeTag::Blob => format!("<{} bytes>", msg.read_blob(index).len()),
        TypeTag::Int64 => msg.read_int64(index).to_string(),
        TypeTag::Float64 => msg.read_float64(index).to_string(),
        TypeTag::TimeTag => msg.read_timestamp(index).to_string(),
        TypeTag::Char => format!("{:?}", msg.read_char(index)),
        TypeTag::Color => {
            let c = msg.read_color(index);
            format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
        }
        TypeTag::Midi => {
            let m = msg.read_midi(index);
            format!(
                "midi({} {:02x} {:02x} {:02x})",
                m.port_id, m.status, m.data1, m.data2
            )
        }
        TypeTag::True | TypeTag::False => msg.read_bool(index).to_string(),
        TypeTag::Nil => "nil".to_string(),
        TypeTag::Infinitum => "inf".to_string(),
        TypeTag::ArrayStart => "[".to_string(),
        TypeTag::ArrayEnd => "]".to_string(),
    }
}
