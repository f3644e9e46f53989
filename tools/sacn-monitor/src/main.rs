// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sacn-monitor - Print merged sACN universe data in real-time
//!
//! # Usage
//!
//! ```bash
//! # Watch universes 1 and 2 on the default interface
//! sacn-monitor -u 1 -u 2
//!
//! # Unicast-only senders, JSON lines
//! sacn-monitor -u 1 --no-multicast --format json
//!
//! # Using configuration file
//! sacn-monitor --config monitor.toml
//! ```

mod config;
mod output;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use config::{MonitorConfig, OutputFormat};
use crossbeam::channel::RecvError;
use crossbeam::select;
use sacn::ReceiverSocket;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Interval at which the Ctrl+C flag is checked while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Print merged sACN universe data
#[derive(Parser, Debug)]
#[command(name = "sacn-monitor")]
#[command(about = "Print merged sACN (E1.31) universe data and receive errors")]
#[command(version)]
struct Args {
    /// Configuration file path (flags override file values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Interface address for multicast membership
    #[arg(short, long)]
    interface: Option<Ipv4Addr>,

    /// Universe to activate (can repeat)
    #[arg(short, long = "universe")]
    universes: Vec<u16>,

    /// Source and universe timeout (milliseconds)
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Do not join multicast groups
    #[arg(long)]
    no_multicast: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "sacn_monitor=debug,sacn=debug"
    } else {
        "sacn_monitor=info,sacn=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = build_config(&args)?;
    run(&config)
}

fn build_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match args.config {
        Some(ref path) => MonitorConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(iface) = args.interface {
        config.interface = Some(iface);
    }
    if !args.universes.is_empty() {
        config.universes = args.universes.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.no_multicast {
        config.multicast = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(config: &MonitorConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let mut receiver = ReceiverSocket::bind(config.receiver_config())
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    for &universe in &config.universes {
        receiver
            .activate(universe)
            .with_context(|| format!("Failed to activate universe {}", universe))?;
    }

    tracing::info!(
        "Listening on {} universes={:?} timeout={}ms multicast={}",
        receiver.local_addr().unwrap_or(config.bind),
        receiver.active_universes(),
        config.timeout_ms,
        config.multicast
    );

    while running.load(Ordering::SeqCst) {
        let closed = select! {
            recv(receiver.data()) -> msg => match msg {
                Ok(packet) => {
                    println!("{}", output::format_data(&packet, config.format, &now()));
                    false
                }
                Err(RecvError) => true,
            },
            recv(receiver.errors()) -> msg => match msg {
                Ok(err) => {
                    println!("{}", output::format_error(&err, config.format, &now()));
                    false
                }
                Err(RecvError) => true,
            },
            default(POLL_INTERVAL) => false,
        };
        if closed {
            tracing::error!("Receive loop ended unexpectedly");
            break;
        }
    }

    receiver.stop();

    tracing::info!(
        "Stopped: {}",
        output::format_summary(&receiver.metrics(), OutputFormat::Text)
    );
    if config.format == OutputFormat::Json {
        println!(
            "{}",
            output::format_summary(&receiver.metrics(), OutputFormat::Json)
        );
    }

    Ok(())
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
