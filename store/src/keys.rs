// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Store key layout.
//!
//! Everything the controller writes lives under [`ROOT`]. Derived
//! resources sit in a per-switch subtree keyed by resource kind; persisted
//! id bindings sit in a separate `ids` namespace that reconciliation never
//! touches. These paths match the schema the per-host agents watch.

/// Root of everything this controller owns in the store.
pub const ROOT: &str = "/sfc-controller/v1";

/// Resource-kind segments inside a switch subtree.
pub mod kind {
    pub const INTERFACE: &str = "interface";
    pub const BRIDGE_DOMAIN: &str = "bridge-domain";
    pub const ROUTE: &str = "route";
    pub const ARP: &str = "arp";
    pub const L2FIB: &str = "l2fib";
    pub const XCONNECT: &str = "xconnect";
    pub const LINUX_INTERFACE: &str = "linux-interface";
}

/// Prefix of all per-switch subtrees.
pub fn switches_prefix() -> String {
    format!("{ROOT}/switch/")
}

pub fn switch_prefix(switch: &str) -> String {
    format!("{ROOT}/switch/{switch}")
}

pub fn interface_key(switch: &str, name: &str) -> String {
    format!("{}/{}/{name}", switch_prefix(switch), kind::INTERFACE)
}

pub fn bridge_domain_key(switch: &str, name: &str) -> String {
    format!("{}/{}/{name}", switch_prefix(switch), kind::BRIDGE_DOMAIN)
}

pub fn route_key(switch: &str, vrf_id: u32, dst: &str, next_hop: &str) -> String {
    format!(
        "{}/{}/{vrf_id}/{dst}/{next_hop}",
        switch_prefix(switch),
        kind::ROUTE
    )
}

pub fn arp_key(switch: &str, outgoing_if: &str, ip: &str) -> String {
    format!("{}/{}/{outgoing_if}/{ip}", switch_prefix(switch), kind::ARP)
}

pub fn l2fib_key(switch: &str, bridge: &str, mac: &str) -> String {
    format!("{}/{}/{bridge}/{mac}", switch_prefix(switch), kind::L2FIB)
}

pub fn xconnect_key(switch: &str, rx_if: &str) -> String {
    format!("{}/{}/{rx_if}", switch_prefix(switch), kind::XCONNECT)
}

pub fn linux_interface_key(switch: &str, name: &str) -> String {
    format!("{}/{}/{name}", switch_prefix(switch), kind::LINUX_INTERFACE)
}

/// Persisted id bindings, outside the reconciled subtrees.
pub fn he_ids_key(he: &str) -> String {
    format!("{ROOT}/ids/he/{he}")
}

pub fn he2ee_ids_key(he: &str, ee: &str) -> String {
    format!("{ROOT}/ids/he2ee/{he}/{ee}")
}

pub fn he2he_ids_key(sh: &str, dh: &str) -> String {
    format!("{ROOT}/ids/he2he/{sh}/{dh}")
}

pub fn sfc_ids_key(sfc: &str, container: &str, port: &str) -> String {
    format!("{ROOT}/ids/sfc/{sfc}/{container}/{port}")
}

pub fn he_ids_prefix() -> String {
    format!("{ROOT}/ids/he/")
}

pub fn he2ee_ids_prefix() -> String {
    format!("{ROOT}/ids/he2ee/")
}

pub fn he2he_ids_prefix() -> String {
    format!("{ROOT}/ids/he2he/")
}

pub fn sfc_ids_prefix() -> String {
    format!("{ROOT}/ids/sfc/")
}

/// Resource kind segment of a per-switch key, if it is one.
pub fn resource_kind(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(ROOT)?.strip_prefix("/switch/")?;
    let (_switch, rest) = rest.split_once('/')?;
    let (kind, _name) = rest.split_once('/')?;
    Some(kind)
}

/// True for keys the reconciler diffs: the kinds that flow through the
/// buffering sink. ARP, L2-FIB and cross-connect records take the direct
/// write path and are left alone by the diff.
pub fn is_reconciled_key(key: &str) -> bool {
    matches!(
        resource_kind(key),
        Some(kind::INTERFACE | kind::BRIDGE_DOMAIN | kind::ROUTE | kind::LINUX_INTERFACE)
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_shapes() {
        assert_eq!(
            interface_key("vswitch1", "IF_MEMIF_VSWITCH_vnf1_port1"),
            "/sfc-controller/v1/switch/vswitch1/interface/IF_MEMIF_VSWITCH_vnf1_port1"
        );
        assert_eq!(
            route_key("vswitch1", 0, "10.0.20.2/24", "192.168.4.2"),
            "/sfc-controller/v1/switch/vswitch1/route/0/10.0.20.2/24/192.168.4.2"
        );
        assert_eq!(
            he2ee_ids_key("vswitch1", "ras1"),
            "/sfc-controller/v1/ids/he2ee/vswitch1/ras1"
        );
    }

    #[test]
    fn reconciled_kinds() {
        assert!(is_reconciled_key(&interface_key("sw", "if1")));
        assert!(is_reconciled_key(&bridge_domain_key("sw", "bd1")));
        assert!(is_reconciled_key(&route_key("sw", 0, "10.0.0.0/24", "10.0.0.1")));
        assert!(is_reconciled_key(&linux_interface_key("sw", "veth1")));
        assert!(!is_reconciled_key(&arp_key("sw", "if1", "10.0.0.1")));
        assert!(!is_reconciled_key(&l2fib_key("sw", "bd1", "02:00:00:00:00:01")));
        assert!(!is_reconciled_key(&xconnect_key("sw", "if1")));
        assert!(!is_reconciled_key(&he_ids_key("sw")));
    }
}
