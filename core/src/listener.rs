use std::time::{Duration, Instant};

use tracing::{debug, trace};

use satrap_common::config::EngineConfig;
use satrap_protocols::arp::{self, ArpFrame};
use satrap_protocols::ethernet::LinkFrame;

use crate::network::transport::{LinkTransport, ReceiveError};

/// Waits for the next ARP reply on a transport.
///
/// Every frame that is not an ARP reply (other ethertypes, undecodable
/// payloads, requests) uses up one slot of the discard budget. The reply is
/// not matched against whatever was asked: the first one seen wins.
#[derive(Debug, Clone, Copy)]
pub struct ReplyListener {
    discard_budget: usize,
    timeout: Duration,
}

impl ReplyListener {
    pub fn new(discard_budget: usize, timeout: Duration) -> Self {
        Self { discard_budget, timeout }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.discard_budget, cfg.reply_timeout)
    }

    /// `Ok(None)` means no reply: the budget ran out or the timeout passed.
    pub fn listen<T: LinkTransport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<Option<ArpFrame>, ReceiveError> {
        let deadline = Instant::now() + self.timeout;
        let mut discarded = 0;

        while discarded < self.discard_budget {
            let Some(link) = transport.receive(Some(deadline))? else {
                debug!("no ARP reply within {:?}", self.timeout);
                return Ok(None);
            };
            match reply_in(&link) {
                Some(reply) => return Ok(Some(reply)),
                None => discarded += 1,
            }
        }

        debug!("discarded {discarded} frames without seeing an ARP reply");
        Ok(None)
    }
}

fn reply_in(link: &LinkFrame) -> Option<ArpFrame> {
    if !link.is_arp() {
        trace!("discarding frame with ethertype {}", link.ethertype);
        return None;
    }
    match arp::decode(&link.payload) {
        Ok(frame) if frame.is_reply() => Some(frame),
        Ok(frame) => {
            trace!("discarding ARP {:?} from {}", frame.operation, frame.sender_proto_addr);
            None
        }
        Err(e) => {
            trace!("discarding frame: {e}");
            None
        }
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
