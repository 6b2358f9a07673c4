use pnet::util::MacAddr;

use satrap_common::network::mac;

/// Maps a MAC address to the company that registered its OUI.
pub trait VendorRepository {
    fn get_vendor(&self, mac: MacAddr) -> Option<String>;
}

/// Lookups against the OUI database bundled with `mac_oui`.
pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, mac: MacAddr) -> Option<String> {
        mac::get_vendor(mac)
    }
}
