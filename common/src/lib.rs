//! Shared domain types and environment helpers for the satrap workspace.
//!
//! Nothing in here speaks ARP. The [`network`] module holds the addressing
//! model the engine works with, [`config`] holds the tunables and [`system`]
//! wraps the few OS side effects the tool needs.

pub mod config;
pub mod network;
pub mod system;
pub mod utils;
