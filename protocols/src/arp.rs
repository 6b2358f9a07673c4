//! ARP over Ethernet/IPv4: the fixed 28-byte request/reply layout.
//!
//! Encoding always produces the canonical header (hardware type Ethernet,
//! protocol type IPv4, lengths 6 and 4). Decoding is deliberately lax and only
//! checks the size, so any well-sized buffer yields a frame whose fields are
//! whatever was on the wire.

use std::net::Ipv4Addr;

use pnet::packet::arp::{ArpHardwareTypes, ArpOperation, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::EtherTypes;
use pnet::util::MacAddr;
use thiserror::Error;

use satrap_common::network::endpoint::Endpoint;

/// Size of an Ethernet/IPv4 ARP packet.
pub const ARP_LEN: usize = 28;
pub const HW_ADDR_LEN: u8 = 6;
pub const PROTO_ADDR_LEN: u8 = 4;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum DecodeError {
    #[error("ARP payload too short ({len} bytes, need 28)")]
    TooShort { len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Request,
    Reply,
    /// Any other code seen on the wire (RARP, InARP, garbage).
    Other(u16),
}

impl From<ArpOperation> for Operation {
    fn from(op: ArpOperation) -> Self {
        if op == ArpOperations::Request {
            Operation::Request
        } else if op == ArpOperations::Reply {
            Operation::Reply
        } else {
            Operation::Other(op.0)
        }
    }
}

/// A decoded ARP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpFrame {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hw_addr_len: u8,
    pub proto_addr_len: u8,
    pub operation: Operation,
    pub sender_hw_addr: MacAddr,
    pub sender_proto_addr: Ipv4Addr,
    pub target_hw_addr: MacAddr,
    pub target_proto_addr: Ipv4Addr,
}

impl ArpFrame {
    pub fn is_reply(&self) -> bool {
        self.operation == Operation::Reply
    }

    /// The identity the frame claims for its sender.
    pub fn sender(&self) -> Endpoint {
        Endpoint::new(self.sender_proto_addr, self.sender_hw_addr)
    }
}

/// Who-has `target_ip`, tell `sender`. The target hardware address is left
/// zeroed since it is the thing being asked for.
pub fn encode_request(sender: Endpoint, target_ip: Ipv4Addr) -> Vec<u8> {
    encode(
        ArpOperations::Request,
        sender,
        Endpoint::new(target_ip, MacAddr::zero()),
    )
}

/// `sender.ip` is-at `sender.mac`, addressed to `target`.
pub fn encode_reply(sender: Endpoint, target: Endpoint) -> Vec<u8> {
    encode(ArpOperations::Reply, sender, target)
}

fn encode(operation: ArpOperation, sender: Endpoint, target: Endpoint) -> Vec<u8> {
    let mut buffer = vec![0u8; ARP_LEN];
    {
        // The buffer is exactly ARP_LEN, which is the packet's minimum size
        let Some(mut arp) = MutableArpPacket::new(&mut buffer) else {
            unreachable!("ARP buffer is sized to the packet");
        };
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(HW_ADDR_LEN);
        arp.set_proto_addr_len(PROTO_ADDR_LEN);
        arp.set_operation(operation);
        arp.set_sender_hw_addr(sender.mac);
        arp.set_sender_proto_addr(sender.ip);
        arp.set_target_hw_addr(target.mac);
        arp.set_target_proto_addr(target.ip);
    }
    buffer
}

/// Reads the first [`ARP_LEN`] bytes of `bytes` as an ARP packet.
///
/// Trailing bytes, such as Ethernet padding, are ignored.
pub fn decode(bytes: &[u8]) -> Result<ArpFrame, DecodeError> {
    let arp = ArpPacket::new(bytes).ok_or(DecodeError::TooShort { len: bytes.len() })?;

    Ok(ArpFrame {
        hardware_type: arp.get_hardware_type().0,
        protocol_type: arp.get_protocol_type().0,
        hw_addr_len: arp.get_hw_addr_len(),
        proto_addr_len: arp.get_proto_addr_len(),
        operation: arp.get_operation().into(),
        sender_hw_addr: arp.get_sender_hw_addr(),
        sender_proto_addr: arp.get_sender_proto_addr(),
        target_hw_addr: arp.get_target_hw_addr(),
        target_proto_addr: arp.get_target_proto_addr(),
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
