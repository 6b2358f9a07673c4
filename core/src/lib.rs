//! The ARP engine: link transport, reply listening, subnet sweeps and cache
//! poisoning.
//!
//! Everything here runs on the calling thread. The only blocking call is
//! [`network::transport::LinkTransport::receive`], and every caller bounds it
//! with a deadline.

pub mod cancel;
pub mod discovery;
pub mod listener;
pub mod network;
pub mod poisoner;
pub mod scanner;
pub mod vendors;
