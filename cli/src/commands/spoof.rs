use std::net::Ipv4Addr;

use satrap_common::config::EngineConfig;
use satrap_core::poisoner;

use crate::commands::{self, CommandLine};
use crate::terminal::print;

pub fn spoof(
    cli: &CommandLine,
    target: Ipv4Addr,
    impersonate: Ipv4Addr,
    cfg: EngineConfig,
) -> anyhow::Result<()> {
    print::header("single spoof");
    let (local, mut transport) = commands::open_link(cli, &cfg)?;

    poisoner::spoof_once(&mut transport, local.mac, impersonate, target)?;
    print::print_status(format!("Told the segment that {impersonate} is at {}", local.mac));
    Ok(())
}
