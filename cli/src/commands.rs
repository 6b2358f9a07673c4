pub mod mitm;
pub mod scan;
pub mod spoof;

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use satrap_common::config::{DEFAULT_DISCARD_BUDGET, EngineConfig};
use satrap_common::network::interface::{LocalInterface, local_interface};
use satrap_core::cancel::{self, CancelFlag};
use satrap_core::network::transport::EthernetTransport;
use tracing::{info, warn};

use crate::terminal::format;

#[derive(Parser, Debug)]
#[command(name = "satrap")]
#[command(version, about = "ARP host discovery and cache poisoning on the local segment.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Interface to work on; the best wired one is picked when omitted
    #[arg(short, long, global = true, value_name = "IFACE")]
    pub interface: Option<String>,

    /// Non-reply frames tolerated while waiting for one ARP reply
    #[arg(long, global = true, default_value_t = DEFAULT_DISCARD_BUDGET)]
    pub budget: usize,

    /// How long to wait for one ARP reply, in milliseconds
    #[arg(long = "timeout-ms", global = true, default_value_t = 2000)]
    pub timeout_ms: u64,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover live hosts on the local subnet
    #[command(alias = "s")]
    Scan,
    /// Sit between two hosts by poisoning their ARP caches
    #[command(alias = "m")]
    Mitm(MitmArgs),
    /// Send one forged ARP request
    Spoof {
        /// Address asked about in the forged request
        target: Ipv4Addr,
        /// Address claimed to be at our MAC
        impersonate: Ipv4Addr,
    },
}

#[derive(Args, Debug)]
pub struct MitmArgs {
    /// First victim; leave out both victims to choose them from a scan
    #[arg(requires = "target_b")]
    pub target_a: Option<Ipv4Addr>,

    /// Second victim
    pub target_b: Option<Ipv4Addr>,

    /// Enable IPv4 forwarding so the victims keep talking
    #[arg(long)]
    pub forward: bool,

    /// Re-announce the real mappings when stopped with Ctrl-C
    #[arg(long)]
    pub restore: bool,

    /// Pause after each poisoning direction, in milliseconds
    #[arg(long = "interval-ms", default_value_t = 1000)]
    pub interval_ms: u64,
}

impl MitmArgs {
    /// Both victims when given on the command line. A host cannot sit on
    /// both ends of the session.
    pub fn targets(&self) -> anyhow::Result<Option<(Ipv4Addr, Ipv4Addr)>> {
        match self.target_a.zip(self.target_b) {
            Some((a, b)) if a == b => bail!("both victims are {a}, pick two different hosts"),
            targets => Ok(targets),
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut cfg = EngineConfig {
            discard_budget: self.budget,
            reply_timeout: Duration::from_millis(self.timeout_ms),
            ..Default::default()
        };
        if let Commands::Mitm(args) = &self.command {
            cfg.poison_interval = Duration::from_millis(args.interval_ms);
            cfg.restore_on_stop = args.restore;
        }
        cfg
    }
}

/// Resolves the interface and opens a raw channel on it.
pub fn open_link(
    cli: &CommandLine,
    cfg: &EngineConfig,
) -> anyhow::Result<(LocalInterface, EthernetTransport)> {
    if !is_root::is_root() {
        warn!("Not running as root, opening a raw socket will likely fail");
    }

    let local = local_interface(cli.interface.as_deref()).context("selecting an interface")?;
    info!("Using {}", format::interface_line(&local));

    let transport = EthernetTransport::open(&local, cfg)?;
    Ok((local, transport))
}

/// A flag raised by the first Ctrl-C. A second one exits right away.
pub fn cancel_on_ctrl_c() -> CancelFlag {
    let flag = cancel::new_flag();
    let trigger = flag.clone();

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if cancel::is_cancelled(&trigger) {
                std::process::exit(130);
            }
            warn!("Interrupted, stopping (Ctrl-C again to force quit)");
            cancel::cancel(&trigger);
        }
    });
    flag
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
