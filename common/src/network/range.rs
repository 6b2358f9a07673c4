use std::iter::Map;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Ascending candidates of a [`ScanRange`].
pub type Candidates = Map<RangeInclusive<u32>, fn(u32) -> Ipv4Addr>;

/// The block of addresses a subnet scan walks through.
///
/// Both the network and the broadcast address are part of the range, so a /30
/// yields four candidates rather than the two usable hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanRange {
    pub network: Ipv4Addr,
    pub broadcast: Ipv4Addr,
}

impl ScanRange {
    /// Derives the range from any address on the subnet and its mask.
    pub fn from_netmask(ip: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        let mask: u32 = netmask.into();
        let network: u32 = u32::from(ip) & mask;
        let broadcast: u32 = network | !mask;

        Self {
            network: Ipv4Addr::from(network),
            broadcast: Ipv4Addr::from(broadcast),
        }
    }

    pub fn to_iter(&self) -> Candidates {
        let start: u32 = self.network.into();
        let end: u32 = self.broadcast.into();
        (start..=end).map(<Ipv4Addr as From<u32>>::from as fn(u32) -> Ipv4Addr)
    }

    pub fn len(&self) -> u64 {
        u64::from(u32::from(self.broadcast)) - u64::from(u32::from(self.network)) + 1
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
