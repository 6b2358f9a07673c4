use pnet::packet::Packet;
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::util::MacAddr;
use thiserror::Error;

pub const ETH_HDR_LEN: usize = 14;
/// Minimum Ethernet frame size on the wire, without the FCS.
pub const MIN_ETH_FRAME_NO_FCS: usize = 60;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum EthernetError {
    #[error("truncated Ethernet frame ({len} bytes)")]
    Truncated { len: usize },
}

/// An Ethernet frame split into the parts the engine looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    pub source: MacAddr,
    pub destination: MacAddr,
    pub ethertype: EtherType,
    pub payload: Vec<u8>,
}

impl LinkFrame {
    pub fn is_arp(&self) -> bool {
        self.ethertype == EtherTypes::Arp
    }
}

/// Wraps an ARP payload in an Ethernet II header, padded to the minimum frame
/// size.
pub fn wrap_arp(src_mac: MacAddr, dst_mac: MacAddr, payload: &[u8]) -> Vec<u8> {
    let len = (ETH_HDR_LEN + payload.len()).max(MIN_ETH_FRAME_NO_FCS);
    let mut buffer = vec![0u8; len];
    {
        let Some(mut eth) = MutableEthernetPacket::new(&mut buffer) else {
            unreachable!("buffer holds at least an Ethernet header");
        };
        eth.set_destination(dst_mac);
        eth.set_source(src_mac);
        eth.set_ethertype(EtherTypes::Arp);
    }
    buffer[ETH_HDR_LEN..ETH_HDR_LEN + payload.len()].copy_from_slice(payload);
    buffer
}

pub fn parse(bytes: &[u8]) -> Result<LinkFrame, EthernetError> {
    let eth = EthernetPacket::new(bytes).ok_or(EthernetError::Truncated { len: bytes.len() })?;

    Ok(LinkFrame {
        source: eth.get_source(),
        destination: eth.get_destination(),
        ethertype: eth.get_ethertype(),
        payload: eth.payload().to_vec(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
