use std::net::Ipv4Addr;

use pnet::util::MacAddr;

/// A host that answered an ARP request during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub vendor: Option<String>,
}

impl Host {
    pub fn new(ip: Ipv4Addr, mac: MacAddr) -> Self {
        Self {
            ip,
            mac,
            vendor: None,
        }
    }

    pub fn with_vendor(mut self, vendor: Option<String>) -> Self {
        self.vendor = vendor;
        self
    }
}
