use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use satrap_common::config::EngineConfig;
use satrap_common::network::host::Host;
use satrap_common::network::interface::LocalInterface;
use satrap_core::cancel::{self, CancelFlag};
use satrap_core::discovery::DiscoveryService;
use satrap_core::network::transport::EthernetTransport;
use satrap_core::vendors::MacOuiRepo;
use tracing::warn;

use crate::commands::{self, CommandLine};
use crate::terminal::{colors, format, print, spinner::ScanSpinner};

pub async fn scan(cli: &CommandLine, cfg: EngineConfig) -> anyhow::Result<()> {
    print::header("starting scanner");
    let (local, transport) = commands::open_link(cli, &cfg)?;
    let cancel = commands::cancel_on_ctrl_c();

    let start_time: Instant = Instant::now();
    let (mut hosts, _) = discover_hosts(&local, transport, cfg, cancel).await?;

    discovery_ends(&mut hosts, start_time.elapsed());
    Ok(())
}

/// Sweeps the subnet of `local` on a blocking thread and hands the transport
/// back for further use.
pub async fn discover_hosts(
    local: &LocalInterface,
    mut transport: EthernetTransport,
    cfg: EngineConfig,
    cancel: CancelFlag,
) -> anyhow::Result<(Vec<Host>, EthernetTransport)> {
    let spinner = ScanSpinner::start(local.scan_range().len());
    let on_probe = spinner.reporter();
    let endpoint = local.endpoint();
    let netmask = local.netmask;
    let interrupted = cancel.clone();

    let (hosts, transport) = tokio::task::spawn_blocking(move || {
        let service = DiscoveryService::new(Box::new(MacOuiRepo), cfg);
        let hosts = service.perform_discovery(&mut transport, endpoint, netmask, cancel, Some(on_probe));
        (hosts, transport)
    })
    .await
    .context("scan task failed")?;
    drop(spinner);

    let hosts = hosts?;
    if cancel::is_cancelled(&interrupted) {
        warn!("Scan interrupted, results are partial");
    }
    Ok((hosts, transport))
}

fn discovery_ends(hosts: &mut [Host], total_time: Duration) {
    if hosts.is_empty() {
        print::header("zero hosts detected");
        print::no_results();
        return;
    }

    print::header("network discovery");
    hosts.sort_by_key(|host| host.ip);
    print_hosts(hosts);
    print_summary(hosts.len(), total_time);
}

pub fn print_hosts(hosts: &[Host]) {
    for (idx, host) in hosts.iter().enumerate() {
        let name = host.vendor.as_deref().unwrap_or("Unknown vendor");
        print::tree_head(idx, name);
        print::as_tree_one_level(format::host_to_details(host));
        if idx + 1 != hosts.len() {
            print::print("");
        }
    }
}

fn print_summary(hosts_len: usize, total_time: Duration) {
    let active_hosts: ColoredString = format!("{hosts_len} active hosts").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: ColoredString = format!("Discovery Complete: {active_hosts} identified in {total_time}")
        .color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
}
