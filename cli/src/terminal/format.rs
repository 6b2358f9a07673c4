use colored::*;
use satrap_common::network::host::Host;
use satrap_common::network::interface::LocalInterface;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn host_to_details(host: &Host) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ("IPv4".to_string(), host.ip.to_string().color(colors::IPV4_ADDR)),
        ("MAC".to_string(), host.mac.to_string().color(colors::MAC_ADDR)),
    ];
    if let Some(vendor) = &host.vendor {
        details.push(("Vendor".to_string(), vendor.normal()));
    }
    details
}

/// `eth0 192.168.1.10/24 (aa:bb:cc:dd:ee:ff)`
pub fn interface_line(local: &LocalInterface) -> String {
    let prefix: u32 = u32::from(local.netmask).count_ones();
    format!(
        "{} {}{}{} ({})",
        local.name.color(colors::PRIMARY),
        local.ip.to_string().color(colors::IPV4_ADDR),
        "/".color(colors::SEPARATOR),
        prefix.to_string().color(colors::IPV4_PREFIX),
        local.mac.to_string().color(colors::MAC_ADDR)
    )
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
