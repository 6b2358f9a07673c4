use std::io::{self, BufRead, Write};
use std::net::Ipv4Addr;

use anyhow::bail;
use colored::*;
use satrap_common::network::host::Host;

use crate::terminal::colors;

/// Asks for a victim on stdin until a valid one is given.
///
/// Accepts either the index shown next to a scanned host or any IPv4 address.
pub fn ask_target(label: &str, hosts: &[Host], taken: Option<Ipv4Addr>) -> anyhow::Result<Ipv4Addr> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} {} ", label.color(colors::PRIMARY), "›".color(colors::SEPARATOR));
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            bail!("no target given");
        };
        match parse_choice(&line?, hosts, taken) {
            Ok(ip) => return Ok(ip),
            Err(reason) => println!("{} {}", "✗".red().bold(), reason),
        }
    }
}

fn parse_choice(input: &str, hosts: &[Host], taken: Option<Ipv4Addr>) -> Result<Ipv4Addr, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("enter an index or an IPv4 address".to_string());
    }

    let ip = if let Ok(idx) = input.parse::<usize>() {
        match hosts.get(idx) {
            Some(host) => host.ip,
            None => return Err(format!("no host with index {idx}")),
        }
    } else {
        input
            .parse::<Ipv4Addr>()
            .map_err(|_| format!("'{input}' is neither an index nor an IPv4 address"))?
    };

    if taken == Some(ip) {
        return Err(format!("{ip} is already the other victim"));
    }
    Ok(ip)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
