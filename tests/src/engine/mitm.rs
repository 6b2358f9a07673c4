use std::time::Duration;

use pnet::util::MacAddr;
use satrap_common::config::EngineConfig;
use satrap_common::network::endpoint::Endpoint;
use satrap_core::cancel;
use satrap_core::poisoner::{CachePoisoner, PoisonError, PoisonSession, spoof_once};
use satrap_protocols::arp::{ArpFrame, Operation};

use super::support::{Event, EventLog, LOCAL_MAC, RecordingPacer, SimLan, ip, local, mac};

fn victims() -> (Endpoint, Endpoint) {
    (Endpoint::new(ip(1), mac(1)), Endpoint::new(ip(20), mac(20)))
}

fn lan(log: &EventLog) -> SimLan {
    let (a, b) = victims();
    SimLan::new(log).with_host(a.ip, a.mac).with_host(b.ip, b.mac)
}

fn assert_forged(event: &Event, op: Operation, claimed: Endpoint, victim: Endpoint) {
    let Event::Sent { frame, destination } = event else {
        panic!("expected a frame, got {event:?}");
    };
    assert_eq!(*destination, victim.mac);
    assert_eq!(frame.operation, op);
    assert_eq!(frame.sender(), claimed);
    assert_eq!(frame.target_proto_addr, victim.ip);
    if op == Operation::Reply {
        assert_eq!(frame.target_hw_addr, victim.mac);
    }
}

#[test]
fn session_resolves_then_poisons_both_directions() {
    let log = EventLog::default();
    let mut lan = lan(&log).with_noise(7);
    let (a, b) = victims();
    let flag = cancel::new_flag();
    let cfg = EngineConfig::default();

    let mut poisoner = CachePoisoner::new(&mut lan, &cfg).with_pacer(RecordingPacer::new(&log, 4));
    let session = poisoner.establish(local(), a.ip, b.ip).unwrap();
    assert_eq!(
        session,
        PoisonSession {
            victim_a: a,
            victim_b: b,
            local_mac: LOCAL_MAC,
            interval: cfg.poison_interval,
            restore_on_stop: false,
        }
    );

    let cycles = poisoner.run(&session, &flag).unwrap();
    assert_eq!(cycles, 2);

    let events = log.events();
    // two resolution requests, then two cycles of 4 frames and 2 pauses
    assert_eq!(events.len(), 2 + 2 * 6);

    for (event, victim) in events[..2].iter().zip([a, b]) {
        let Event::Sent { frame, destination } = event else {
            panic!("expected a resolution request");
        };
        assert_eq!(*destination, MacAddr::broadcast());
        assert_eq!(frame.sender(), local());
        assert_eq!(frame.target_proto_addr, victim.ip);
    }

    let as_b = Endpoint::new(b.ip, LOCAL_MAC);
    let as_a = Endpoint::new(a.ip, LOCAL_MAC);
    for cycle in events[2..].chunks(6) {
        assert_forged(&cycle[0], Operation::Request, as_b, a);
        assert_forged(&cycle[1], Operation::Reply, as_b, a);
        assert_eq!(cycle[2], Event::Pause(cfg.poison_interval));
        assert_forged(&cycle[3], Operation::Request, as_a, b);
        assert_forged(&cycle[4], Operation::Reply, as_a, b);
        assert_eq!(cycle[5], Event::Pause(cfg.poison_interval));
    }
}

#[test]
fn silent_victim_fails_resolution_before_any_poisoning() {
    let log = EventLog::default();
    let (a, _) = victims();
    let mut lan = SimLan::new(&log).with_host(a.ip, a.mac);
    let cfg = EngineConfig::default();

    let err = CachePoisoner::new(&mut lan, &cfg)
        .establish(local(), a.ip, ip(77))
        .unwrap_err();

    assert!(matches!(err, PoisonError::ResolutionFailed { victim } if victim == ip(77)));
    assert_eq!(err.to_string(), "no ARP reply from 192.168.1.77, cannot learn its MAC address");
    let sent = log.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(frame, _)| frame.operation == Operation::Request));
}

#[test]
fn read_failure_surfaces_before_any_poisoning() {
    let log = EventLog::default();
    let mut lan = lan(&log).unplugged();
    let (a, b) = victims();

    let err = CachePoisoner::new(&mut lan, &EngineConfig::default())
        .establish(local(), a.ip, b.ip)
        .unwrap_err();

    assert!(matches!(err, PoisonError::Receive(_)));
    let sent = log.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.sender(), local());
    assert_eq!(sent[0].1, MacAddr::broadcast());
}

#[test]
fn send_failure_mid_cycle_stops_everything() {
    let log = EventLog::default();
    // resolution (2) + first pair (2) + one request of the second pair
    let mut lan = lan(&log).failing_after(5);
    let (a, b) = victims();
    let flag = cancel::new_flag();
    let cfg = EngineConfig {
        restore_on_stop: true,
        ..Default::default()
    };

    let mut poisoner = CachePoisoner::new(&mut lan, &cfg).with_pacer(RecordingPacer::new(&log, usize::MAX));
    let session = poisoner.establish(local(), a.ip, b.ip).unwrap();
    let err = poisoner.run(&session, &flag).unwrap_err();

    assert!(matches!(err, PoisonError::Send(_)));
    assert_eq!(log.sent().len(), 5);
    assert!(!cancel::is_cancelled(&flag));
}

#[test]
fn restore_burst_follows_cancellation() {
    let log = EventLog::default();
    let mut lan = lan(&log);
    let (a, b) = victims();
    let flag = cancel::new_flag();
    let cfg = EngineConfig {
        restore_on_stop: true,
        ..Default::default()
    };

    let mut poisoner = CachePoisoner::new(&mut lan, &cfg).with_pacer(RecordingPacer::new(&log, 2));
    let session = poisoner.establish(local(), a.ip, b.ip).unwrap();
    assert!(session.restore_on_stop);
    poisoner.run(&session, &flag).unwrap();

    let restore: Vec<(ArpFrame, MacAddr)> = log.sent().into_iter().skip(2 + 4).collect();
    assert_eq!(restore.len(), 6);
    for pair in restore.chunks(2) {
        assert_eq!(pair[0].1, a.mac);
        assert_eq!(pair[0].0.operation, Operation::Reply);
        assert_eq!(pair[0].0.sender(), b);
        assert_eq!(pair[1].1, b.mac);
        assert_eq!(pair[1].0.sender(), a);
    }
}

#[test]
fn spoof_once_sends_a_single_broadcast_request() {
    let log = EventLog::default();
    let mut lan = lan(&log);

    spoof_once(&mut lan, LOCAL_MAC, ip(1), ip(20)).unwrap();

    let sent = log.sent();
    assert_eq!(sent.len(), 1);
    let (frame, destination) = sent[0];
    assert_eq!(destination, MacAddr::broadcast());
    assert_eq!(frame.operation, Operation::Request);
    assert_eq!(frame.sender(), Endpoint::new(ip(1), LOCAL_MAC));
    assert_eq!(frame.target_proto_addr, ip(20));
}

/// Runs the session the way the binary does: on a blocking thread, stopped
/// from the async side.
#[tokio::test]
async fn cancelling_from_another_task_stops_the_session() {
    let log = EventLog::default();
    let mut lan = lan(&log);
    let (a, b) = victims();
    let flag = cancel::new_flag();
    let cfg = EngineConfig {
        poison_interval: Duration::from_millis(10),
        restore_on_stop: true,
        ..Default::default()
    };

    let running = flag.clone();
    let handle = tokio::task::spawn_blocking(move || -> Result<u64, PoisonError> {
        let mut poisoner = CachePoisoner::new(&mut lan, &cfg);
        let session = poisoner.establish(local(), a.ip, b.ip)?;
        poisoner.run(&session, &running)
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel::cancel(&flag);
    let cycles = handle.await.unwrap().unwrap();

    assert!(cycles >= 1);
    let sent = log.sent();
    let poisoning = &sent[2..sent.len() - 6];
    assert!(poisoning.len() >= 4);
    assert_eq!(poisoning.len() % 2, 0);
    for (frame, _) in &sent[sent.len() - 6..] {
        assert_eq!(frame.operation, Operation::Reply);
        assert_ne!(frame.sender_hw_addr, LOCAL_MAC);
    }
}
