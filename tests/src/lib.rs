//! End-to-end tests of the ARP engine against a simulated Ethernet segment.
