use std::net::Ipv4Addr;

use pnet::datalink::{self, NetworkInterface};
use pnet::util::MacAddr;
use thiserror::Error;
use tracing::debug;

#[cfg(target_os = "linux")]
use linux_impl::is_wired;
#[cfg(not(target_os = "linux"))]
use fallback_impl::is_wired;

use crate::network::endpoint::Endpoint;
use crate::network::range::ScanRange;
use crate::utils::interface::NetworkInterfaceExtension;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum InterfaceError {
    #[error("interface {0} not found")]
    NotFound(String),
    #[error("no interface is usable for ARP")]
    NoneViable,
    #[error("interface {name} is unusable: {reason}")]
    NotViable { name: String, reason: ViabilityError },
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    #[error("it is down")]
    IsDown,
    #[error("it is a loopback device")]
    IsLoopback,
    /// The interface does not have a MAC address.
    #[error("it has no MAC address")]
    NoMacAddress,
    /// The interface does not support broadcast (required for ARP).
    #[error("it does not support broadcast")]
    NotBroadcast,
    /// The interface is a point-to-point link (e.g., a VPN).
    #[error("it is a point-to-point link")]
    IsPointToPoint,
    #[error("it has no IPv4 address")]
    NoIpv4Address,
}

/// What the engine needs to know about the interface it runs on.
#[derive(Debug, Clone)]
pub struct LocalInterface {
    pub name: String,
    pub index: u32,
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub netmask: Ipv4Addr,
    /// Kept so a datalink channel can be opened on it.
    pub raw: NetworkInterface,
}

impl LocalInterface {
    /// The real identity of this interface.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.ip, self.mac)
    }

    pub fn scan_range(&self) -> ScanRange {
        ScanRange::from_netmask(self.ip, self.netmask)
    }
}

impl TryFrom<NetworkInterface> for LocalInterface {
    type Error = InterfaceError;

    fn try_from(interface: NetworkInterface) -> Result<Self, Self::Error> {
        let not_viable = |reason| InterfaceError::NotViable {
            name: interface.name.clone(),
            reason,
        };

        is_viable_arp_interface(&interface).map_err(not_viable)?;
        let mac = interface.mac.ok_or_else(|| not_viable(ViabilityError::NoMacAddress))?;
        let net = interface
            .get_ipv4_net()
            .ok_or_else(|| not_viable(ViabilityError::NoIpv4Address))?;

        Ok(Self {
            name: interface.name.clone(),
            index: interface.index,
            ip: net.ip(),
            mac,
            netmask: net.mask(),
            raw: interface,
        })
    }
}

/// Resolves the interface called `name`, or picks the best candidate when no
/// name is given.
pub fn local_interface(name: Option<&str>) -> Result<LocalInterface, InterfaceError> {
    let interfaces: Vec<NetworkInterface> = datalink::interfaces();
    debug!("Identified {} network interface(s)", interfaces.len());

    match name {
        Some(name) => find_by_name(interfaces, name),
        None => select_best_interface(interfaces, is_wired).ok_or(InterfaceError::NoneViable),
    }
}

fn find_by_name(interfaces: Vec<NetworkInterface>, name: &str) -> Result<LocalInterface, InterfaceError> {
    interfaces
        .into_iter()
        .find(|interface| interface.name == name)
        .ok_or_else(|| InterfaceError::NotFound(name.to_string()))
        .and_then(LocalInterface::try_from)
}

fn is_viable_arp_interface(interface: &NetworkInterface) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() {
        return Err(ViabilityError::IsLoopback);
    }
    if interface.mac.is_none() {
        return Err(ViabilityError::NoMacAddress);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if interface.is_point_to_point() {
        return Err(ViabilityError::IsPointToPoint);
    }
    if interface.get_ipv4_net().is_none() {
        return Err(ViabilityError::NoIpv4Address);
    }

    Ok(())
}

fn select_best_interface(
    interfaces: Vec<NetworkInterface>,
    is_wired: impl Fn(&NetworkInterface) -> bool,
) -> Option<LocalInterface> {
    let viable: Vec<LocalInterface> = interfaces
        .into_iter()
        .filter_map(|interface| LocalInterface::try_from(interface).ok())
        .collect();

    let wired = viable.iter().position(|local| is_wired(&local.raw)).unwrap_or(0);
    viable.into_iter().nth(wired)
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::path::Path;

    pub fn is_wired(interface: &NetworkInterface) -> bool {
        let sys = format!("/sys/class/net/{}", interface.name);
        Path::new(&format!("{sys}/device")).exists() && !Path::new(&format!("{sys}/wireless")).exists()
    }
}

#[cfg(not(target_os = "linux"))]
mod fallback_impl {
    use super::*;

    pub fn is_wired(interface: &NetworkInterface) -> bool {
        interface.name.starts_with("en") || interface.name.starts_with("eth")
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
