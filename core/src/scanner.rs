//! Sequential ARP sweep of the local subnet.
//!
//! The sweep is a lazy [`Iterator`]: each call to `next` sends requests and
//! listens until one candidate answers or the range runs out. Nothing is
//! probed until the iterator is driven, and dropping it stops the sweep.
//!
//! Candidates are probed one at a time, in ascending order, from the network
//! address through the broadcast address inclusive. There is no retry: a
//! candidate that stays silent for one listen is skipped.

use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use thiserror::Error;
use tracing::debug;

use satrap_common::config::EngineConfig;
use satrap_common::network::endpoint::Endpoint;
use satrap_common::network::host::Host;
use satrap_common::network::range::{Candidates, ScanRange};
use satrap_protocols::arp;

use crate::cancel::{self, CancelFlag};
use crate::listener::ReplyListener;
use crate::network::transport::{LinkTransport, ReceiveError, SendError};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Receive(#[from] ReceiveError),
}

/// Called with each candidate just before it is probed.
pub type ProbeCallback = Box<dyn FnMut(Ipv4Addr) + Send>;

pub struct HostScanner<'t, T: LinkTransport + ?Sized> {
    transport: &'t mut T,
    listener: ReplyListener,
    local: Endpoint,
    candidates: Candidates,
    cancel: Option<CancelFlag>,
    on_probe: Option<ProbeCallback>,
    done: bool,
}

/// Starts a sweep of the subnet `local.ip`/`netmask`.
pub fn scan<'t, T: LinkTransport + ?Sized>(
    transport: &'t mut T,
    local: Endpoint,
    netmask: Ipv4Addr,
    cfg: &EngineConfig,
) -> HostScanner<'t, T> {
    HostScanner::new(
        transport,
        local,
        ScanRange::from_netmask(local.ip, netmask),
        ReplyListener::from_config(cfg),
    )
}

impl<'t, T: LinkTransport + ?Sized> HostScanner<'t, T> {
    pub fn new(
        transport: &'t mut T,
        local: Endpoint,
        range: ScanRange,
        listener: ReplyListener,
    ) -> Self {
        debug!("scanning {} addresses from {}", range.len(), range.network);
        Self {
            transport,
            listener,
            local,
            candidates: range.to_iter(),
            cancel: None,
            on_probe: None,
            done: false,
        }
    }

    /// Stops the sweep between candidates once the flag is raised.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn on_probe(mut self, callback: ProbeCallback) -> Self {
        self.on_probe = Some(callback);
        self
    }

    fn probe(&mut self, candidate: Ipv4Addr) -> Result<Option<Host>, ScanError> {
        if let Some(cb) = self.on_probe.as_mut() {
            cb(candidate);
        }

        let request = arp::encode_request(self.local, candidate);
        self.transport.send(&request, MacAddr::broadcast())?;
        debug!("sent who-has {candidate}");

        let Some(reply) = self.listener.listen(&mut *self.transport)? else {
            return Ok(None);
        };
        debug!("{} is at {}", reply.sender_proto_addr, reply.sender_hw_addr);
        Ok(Some(Host::new(reply.sender_proto_addr, reply.sender_hw_addr)))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(cancel::is_cancelled)
    }
}

impl<T: LinkTransport + ?Sized> Iterator for HostScanner<'_, T> {
    type Item = Result<Host, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.is_cancelled() {
                debug!("scan cancelled");
                self.done = true;
                break;
            }
            let Some(candidate) = self.candidates.next() else {
                self.done = true;
                break;
            };
            match self.probe(candidate) {
                Ok(Some(host)) => return Some(Ok(host)),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
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
