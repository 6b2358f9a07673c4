//! Wire formats spoken by satrap: the ARP packet itself and the Ethernet II
//! header it travels in.

pub mod arp;
pub mod ethernet;
