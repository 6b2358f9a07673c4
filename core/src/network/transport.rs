//! Layer-2 send/receive for ARP payloads.
//!
//! [`LinkTransport`] is the seam between the engine and the wire: the
//! listener, scanner and poisoner only ever talk to it, so tests can drive
//! them with a scripted in-memory transport. [`EthernetTransport`] is the real
//! implementation over a pnet datalink channel.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet::util::MacAddr;
use thiserror::Error;
use tracing::trace;

use satrap_common::config::EngineConfig;
use satrap_common::network::interface::LocalInterface;
use satrap_protocols::ethernet::{self, LinkFrame};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to send frame to {destination}: {source}")]
    Transport {
        destination: MacAddr,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("failed to receive frame: {0}")]
    Transport(#[source] io::Error),
}

pub trait LinkTransport {
    /// Sends an ARP payload in a single frame addressed to `destination`.
    fn send(&mut self, payload: &[u8], destination: MacAddr) -> Result<(), SendError>;

    /// Blocks until a frame arrives or `deadline` passes, in which case
    /// `Ok(None)` is returned. Without a deadline this blocks indefinitely.
    fn receive(&mut self, deadline: Option<Instant>) -> Result<Option<LinkFrame>, ReceiveError>;
}

pub struct EthernetTransport {
    src_mac: MacAddr,
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
}

impl EthernetTransport {
    /// Opens a raw Ethernet channel on the interface. Needs CAP_NET_RAW.
    pub fn open(interface: &LocalInterface, cfg: &EngineConfig) -> anyhow::Result<Self> {
        let (tx, rx) = open_eth_channel(
            &interface.raw,
            &channel_config(cfg.poll_interval),
            datalink::channel,
        )?;
        Ok(Self::from_channel(interface.mac, tx, rx))
    }

    pub fn from_channel(
        src_mac: MacAddr,
        tx: Box<dyn DataLinkSender>,
        rx: Box<dyn DataLinkReceiver>,
    ) -> Self {
        Self { src_mac, tx, rx }
    }
}

impl LinkTransport for EthernetTransport {
    fn send(&mut self, payload: &[u8], destination: MacAddr) -> Result<(), SendError> {
        let frame = ethernet::wrap_arp(self.src_mac, destination, payload);
        match self.tx.send_to(&frame, None) {
            Some(Ok(())) => Ok(()),
            Some(Err(source)) => Err(SendError::Transport { destination, source }),
            None => Err(SendError::Transport {
                destination,
                source: io::Error::other("datalink sender refused the frame"),
            }),
        }
    }

    fn receive(&mut self, deadline: Option<Instant>) -> Result<Option<LinkFrame>, ReceiveError> {
        loop {
            match self.rx.next() {
                Ok(bytes) => match ethernet::parse(bytes) {
                    Ok(frame) => return Ok(Some(frame)),
                    Err(e) => trace!("dropping runt frame: {e}"),
                },
                Err(e) if is_poll_timeout(&e) => {}
                Err(e) => return Err(ReceiveError::Transport(e)),
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(None);
            }
        }
    }
}

fn is_poll_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn open_eth_channel<F>(
    intf: &NetworkInterface,
    cfg: &Config,
    channel_opener: F,
) -> anyhow::Result<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>)>
where
    F: FnOnce(&NetworkInterface, Config) -> io::Result<Channel>,
{
    let ch = channel_opener(intf, *cfg).with_context(|| format!("opening on {}", intf.name))?;
    match ch {
        Channel::Ethernet(tx, rx) => {
            tracing::debug!("datalink channel open on {}", intf.name);
            Ok((tx, rx))
        }
        _ => bail!("non-ethernet channel for {}", intf.name),
    }
}

// Reads wake up every poll interval so deadlines are honoured without
// a dedicated reader thread.
fn channel_config(poll_interval: Duration) -> Config {
    Config {
        read_timeout: Some(poll_interval),
        promiscuous: false,
        ..Default::default()
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
