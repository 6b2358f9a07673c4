use std::net::Ipv4Addr;

use pnet::util::MacAddr;
use satrap_common::config::EngineConfig;
use satrap_common::network::endpoint::Endpoint;
use satrap_common::network::host::Host;
use satrap_core::discovery::DiscoveryService;
use satrap_core::scanner::{self, ScanError};
use satrap_core::vendors::VendorRepository;
use satrap_core::cancel;
use satrap_protocols::arp::Operation;

use super::support::{EventLog, LOCAL_MAC, SimLan, ip, mac};

const MASK_30: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 252);

/// The scanning host sits at 192.168.1.1, inside 192.168.1.0/30.
fn scanner_host() -> Endpoint {
    Endpoint::new(ip(1), LOCAL_MAC)
}

fn run_scan(lan: &mut SimLan, cfg: &EngineConfig) -> Result<Vec<Host>, ScanError> {
    scanner::scan(lan, scanner_host(), MASK_30, cfg).collect()
}

fn probed(log: &EventLog) -> Vec<Ipv4Addr> {
    log.sent().into_iter().map(|(frame, _)| frame.target_proto_addr).collect()
}

#[test]
fn only_the_answering_host_is_reported() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(2), mac(2));

    let hosts = run_scan(&mut lan, &EngineConfig::default()).unwrap();

    assert_eq!(hosts, vec![Host::new(ip(2), mac(2))]);
    assert_eq!(log.sent().len(), 4);
}

#[test]
fn whole_range_is_probed_including_network_and_broadcast() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log);

    assert!(run_scan(&mut lan, &EngineConfig::default()).unwrap().is_empty());

    for (frame, destination) in log.sent() {
        assert_eq!(destination, MacAddr::broadcast());
        assert_eq!(frame.operation, Operation::Request);
        assert_eq!(frame.sender(), scanner_host());
        assert_eq!(frame.target_hw_addr, MacAddr::zero());
    }
    assert_eq!(probed(&log), vec![ip(0), ip(1), ip(2), ip(3)]);
}

#[test]
fn hosts_come_out_in_ascending_order() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log)
        .with_host(ip(200), mac(200))
        .with_host(ip(7), mac(7))
        .with_host(ip(42), mac(42));

    let found: Vec<Ipv4Addr> = scanner::scan(&mut lan, scanner_host(), Ipv4Addr::new(255, 255, 255, 0), &EngineConfig::default())
        .map(|host| host.unwrap().ip)
        .collect();

    assert_eq!(found, vec![ip(7), ip(42), ip(200)]);
    assert_eq!(log.sent().len(), 256);
}

#[test]
fn chatter_within_the_discard_budget_is_tolerated() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(3), mac(3)).with_noise(19);

    let hosts = run_scan(&mut lan, &EngineConfig::default()).unwrap();
    assert_eq!(hosts, vec![Host::new(ip(3), mac(3))]);
}

#[test]
fn chatter_past_the_discard_budget_hides_the_host() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(3), mac(3)).with_noise(20);

    assert!(run_scan(&mut lan, &EngineConfig::default()).unwrap().is_empty());
    // the host was asked, its reply sat behind twenty discarded frames
    assert_eq!(probed(&log).last(), Some(&ip(3)));
}

#[test]
fn configured_budget_decides_whether_the_reply_is_reached() {
    let tight = EngineConfig {
        discard_budget: 5,
        ..Default::default()
    };
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(3), mac(3)).with_noise(5);
    assert!(run_scan(&mut lan, &tight).unwrap().is_empty());
    assert_eq!(probed(&log).last(), Some(&ip(3)));

    let roomy = EngineConfig {
        discard_budget: 6,
        ..Default::default()
    };
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(3), mac(3)).with_noise(5);
    assert_eq!(run_scan(&mut lan, &roomy).unwrap(), vec![Host::new(ip(3), mac(3))]);
}

#[test]
fn send_failure_ends_the_scan() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(0), mac(0)).failing_after(2);

    let items: Vec<Result<Host, ScanError>> =
        scanner::scan(&mut lan, scanner_host(), MASK_30, &EngineConfig::default()).collect();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &Host::new(ip(0), mac(0)));
    assert!(matches!(items[1], Err(ScanError::Send(_))));
    assert_eq!(probed(&log), vec![ip(0), ip(1)]);
}

#[test]
fn read_failure_ends_the_scan() {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(2), mac(2)).unplugged();

    let items: Vec<Result<Host, ScanError>> =
        scanner::scan(&mut lan, scanner_host(), MASK_30, &EngineConfig::default()).collect();

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(ScanError::Receive(_))));
    assert_eq!(probed(&log), vec![ip(0)]);
}

struct OneVendor;

impl VendorRepository for OneVendor {
    fn get_vendor(&self, m: MacAddr) -> Option<String> {
        (m == mac(2)).then(|| "Raspberry Pi Trading Ltd".to_string())
    }
}

#[test]
fn discovery_labels_hosts_with_their_vendor() -> anyhow::Result<()> {
    let log = EventLog::default();
    let mut lan = SimLan::new(&log).with_host(ip(0), mac(0)).with_host(ip(2), mac(2));
    let service = DiscoveryService::new(Box::new(OneVendor), EngineConfig::default());

    let hosts = service.perform_discovery(&mut lan, scanner_host(), MASK_30, cancel::new_flag(), None)?;

    assert_eq!(hosts.len(), 2);
    assert_eq!((hosts[0].ip, hosts[0].vendor.as_deref()), (ip(0), None));
    assert_eq!(
        (hosts[1].ip, hosts[1].vendor.as_deref()),
        (ip(2), Some("Raspberry Pi Trading Ltd"))
    );
    Ok(())
}
