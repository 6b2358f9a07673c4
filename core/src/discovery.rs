//! # Network Discovery Service
//!
//! Runs an ARP sweep and decorates the hosts it finds with vendor names.

use std::net::Ipv4Addr;

use satrap_common::config::EngineConfig;
use satrap_common::network::endpoint::Endpoint;
use satrap_common::network::host::Host;

use crate::cancel::CancelFlag;
use crate::network::transport::LinkTransport;
use crate::scanner::{self, ProbeCallback, ScanError};
use crate::vendors::VendorRepository;

/// Application Service for Network Discovery.
///
/// Orchestrates the discovery process by:
/// 1. delegating the sweep to the [`scanner`].
/// 2. enriching the results with vendor lookups.
pub struct DiscoveryService {
    vendor_repo: Box<dyn VendorRepository + Send>,
    cfg: EngineConfig,
}

impl DiscoveryService {
    pub fn new(vendor_repo: Box<dyn VendorRepository + Send>, cfg: EngineConfig) -> Self {
        Self { vendor_repo, cfg }
    }

    /// Sweeps the subnet of `local` and collects every host that answered.
    ///
    /// A cancelled sweep returns what was found so far.
    pub fn perform_discovery<T: LinkTransport + ?Sized>(
        &self,
        transport: &mut T,
        local: Endpoint,
        netmask: Ipv4Addr,
        cancel: CancelFlag,
        on_probe: Option<ProbeCallback>,
    ) -> Result<Vec<Host>, ScanError> {
        let mut sweep = scanner::scan(transport, local, netmask, &self.cfg).with_cancel(cancel);
        if let Some(cb) = on_probe {
            sweep = sweep.on_probe(cb);
        }

        let hosts = sweep.collect::<Result<Vec<Host>, ScanError>>()?;
        Ok(self.enrich_vendors(hosts))
    }

    fn enrich_vendors(&self, hosts: Vec<Host>) -> Vec<Host> {
        hosts
            .into_iter()
            .map(|host| {
                let vendor = self.vendor_repo.get_vendor(host.mac);
                host.with_vendor(vendor)
            })
            .collect()
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
