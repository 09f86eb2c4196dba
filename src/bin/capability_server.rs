//! Runs the capability server.
//!
//! Resolves package roots from the argument or `CAPABILITY_PACKAGE_PATH`,
//! builds the index, logs a smoke check of its contents, and then answers
//! requests on stdio (default) or a TCP listener (`--listen`).

use anyhow::{Context, Result};
use capabilities::{CapabilityIndex, CapabilityServer, ServerConfig, Transport, logging};
use clap::Parser;
use std::io;
use std::net::{SocketAddr, TcpListener};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "capability-server", about = "Runs the capability server")]
struct Cli {
    /// Overrides CAPABILITY_PACKAGE_PATH when discovering packages with capabilities
    package_path: Option<String>,

    /// Serve requests over TCP instead of stdin/stdout
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Interface whose providers and semantic interfaces are logged at startup
    #[arg(long, value_name = "NAME")]
    check_interface: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::from_args(
        cli.package_path.as_deref(),
        cli.listen,
        cli.check_interface,
    )?;
    logging::init()?;

    let index = CapabilityIndex::new(config.roots.clone());
    smoke_check(&index, &config.check_interface);

    let server = CapabilityServer::new(&index);
    match config.transport {
        Transport::Stdio => {
            let stdin = io::stdin();
            server.serve(stdin.lock(), io::stdout().lock())
        }
        Transport::Tcp(addr) => {
            let listener =
                TcpListener::bind(addr).with_context(|| format!("binding {addr}"))?;
            server.serve_tcp(listener)
        }
    }
}

fn smoke_check(index: &CapabilityIndex, interface: &str) {
    info!("Capability server created.\n{}", index.describe_all());
    let snapshot = index.snapshot();
    let interfaces: Vec<_> = snapshot.interfaces().map(|i| i.name.as_str()).collect();
    info!("interfaces are {interfaces:?}");
    let providers: Vec<_> = snapshot
        .providers_of(interface)
        .map(|p| p.name.as_str())
        .collect();
    info!("providers of interface {interface} are {providers:?}");
    let semantic: Vec<_> = snapshot
        .semantic_interfaces_of(interface)
        .map(|s| s.name.as_str())
        .collect();
    info!("semantic_interfaces of interface {interface} are {semantic:?}");
}
