use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pnet::packet::ethernet::EtherTypes;
use pnet::util::MacAddr;
use satrap_common::network::endpoint::Endpoint;
use satrap_core::cancel::{self, CancelFlag, Cancelled};
use satrap_core::network::transport::{LinkTransport, ReceiveError, SendError};
use satrap_core::poisoner::Pacer;
use satrap_protocols::arp::{self, ArpFrame, Operation};
use satrap_protocols::ethernet::LinkFrame;

pub const LOCAL_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x63);

pub fn local() -> Endpoint {
    Endpoint::new(Ipv4Addr::new(192, 168, 1, 99), LOCAL_MAC)
}

pub fn ip(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, last)
}

pub fn mac(last: u8) -> MacAddr {
    MacAddr::new(0xaa, 0xbb, 0xcc, 0x00, 0x00, last)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Sent { frame: ArpFrame, destination: MacAddr },
    Pause(Duration),
}

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(ArpFrame, MacAddr)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Sent { frame, destination } => Some((frame, destination)),
                Event::Pause(_) => None,
            })
            .collect()
    }
}

/// A broadcast segment where every known host answers ARP requests for its
/// own address, optionally after some unrelated chatter.
pub struct SimLan {
    hosts: HashMap<Ipv4Addr, MacAddr>,
    inbox: VecDeque<LinkFrame>,
    noise_per_reply: usize,
    sends_left: Option<usize>,
    unplugged: bool,
    log: EventLog,
}

impl SimLan {
    pub fn new(log: &EventLog) -> Self {
        Self {
            hosts: HashMap::new(),
            inbox: VecDeque::new(),
            noise_per_reply: 0,
            sends_left: None,
            unplugged: false,
            log: log.clone(),
        }
    }

    pub fn with_host(mut self, ip: Ipv4Addr, mac: MacAddr) -> Self {
        self.hosts.insert(ip, mac);
        self
    }

    /// Queues `n` frames the listener has to throw away before each reply.
    pub fn with_noise(mut self, n: usize) -> Self {
        self.noise_per_reply = n;
        self
    }

    /// Lets `n` frames out, then fails every send.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.sends_left = Some(n);
        self
    }

    /// Keeps sending but fails every read.
    pub fn unplugged(mut self) -> Self {
        self.unplugged = true;
        self
    }

    fn answer(&mut self, request: &ArpFrame, destination: MacAddr) {
        let Some(&host_mac) = self.hosts.get(&request.target_proto_addr) else {
            return;
        };
        if destination != MacAddr::broadcast() && destination != host_mac {
            return;
        }

        for i in 0..self.noise_per_reply {
            self.inbox.push_back(noise(i, host_mac));
        }
        let host = Endpoint::new(request.target_proto_addr, host_mac);
        self.inbox.push_back(LinkFrame {
            source: host_mac,
            destination: request.sender_hw_addr,
            ethertype: EtherTypes::Arp,
            payload: arp::encode_reply(host, request.sender()),
        });
    }
}

/// IPv4 traffic, a runt ARP payload and a stray request, in turn.
fn noise(i: usize, source: MacAddr) -> LinkFrame {
    let stranger = Endpoint::new(Ipv4Addr::new(192, 168, 1, 250), source);
    let (ethertype, payload) = match i % 3 {
        0 => (EtherTypes::Ipv4, vec![0x45; 40]),
        1 => (EtherTypes::Arp, vec![0u8; 12]),
        _ => (EtherTypes::Arp, arp::encode_request(stranger, ip(1))),
    };
    LinkFrame {
        source,
        destination: MacAddr::broadcast(),
        ethertype,
        payload,
    }
}

impl LinkTransport for SimLan {
    fn send(&mut self, payload: &[u8], destination: MacAddr) -> Result<(), SendError> {
        if let Some(left) = self.sends_left.as_mut() {
            if *left == 0 {
                return Err(SendError::Transport {
                    destination,
                    source: io::Error::new(io::ErrorKind::NetworkDown, "link down"),
                });
            }
            *left -= 1;
        }

        let frame = arp::decode(payload).expect("engine sent a malformed ARP payload");
        self.log.push(Event::Sent { frame, destination });
        if frame.operation == Operation::Request {
            self.answer(&frame, destination);
        }
        Ok(())
    }

    fn receive(&mut self, _deadline: Option<Instant>) -> Result<Option<LinkFrame>, ReceiveError> {
        if self.unplugged {
            return Err(ReceiveError::Transport(io::Error::new(io::ErrorKind::NotConnected, "interface gone")));
        }
        Ok(self.inbox.pop_front())
    }
}

/// Logs every pause instead of sleeping and raises the cancel flag once
/// `cancel_after` pauses have been taken.
pub struct RecordingPacer {
    log: EventLog,
    pauses: usize,
    cancel_after: usize,
}

impl RecordingPacer {
    pub fn new(log: &EventLog, cancel_after: usize) -> Self {
        Self {
            log: log.clone(),
            pauses: 0,
            cancel_after,
        }
    }
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, interval: Duration, cancel: &CancelFlag) -> Result<(), Cancelled> {
        self.log.push(Event::Pause(interval));
        self.pauses += 1;
        if self.pauses == self.cancel_after {
            cancel::cancel(cancel);
        }
        Ok(())
    }
}
