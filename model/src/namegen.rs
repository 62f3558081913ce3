// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Name generation for derived resources.
//!
//! These names are part of the wire contract: agents and operators key off
//! them, so changing a scheme here is a breaking change for deployed
//! fleets.

use crate::addrs::to_base36;

pub fn host_loopback_if(he: &str) -> String {
    format!("IF_LOOPBACK_H_{he}")
}

pub fn host_dynamic_bridge(he: &str) -> String {
    format!("BD_INTERNAL_EW_{he}")
}

pub fn host_static_bridge(he: &str) -> String {
    format!("BD_INTERNAL_EW_L2FIB_{he}")
}

/// Per-chain override bridge on one switch.
pub fn sfc_host_bridge(sfc: &str, switch: &str) -> String {
    format!("BD_INTERNAL_EW_{sfc}_{switch}")
}

/// North-south NIC bridge; the NIC name may contain slashes
/// (`GigabitEthernet13/0`), which do not belong in a bridge name.
pub fn ns_nic_bridge(port_label: &str) -> String {
    format!("BD_INTERNAL_NS_{}", port_label.replace('/', "_"))
}

pub fn h2e_vxlan_if(he: &str, ee: &str) -> String {
    format!("IF_VXLAN_H2E_{he}_{ee}")
}

pub fn h2e_bridge(he: &str, ee: &str) -> String {
    format!("BD_H2E_{he}_{ee}")
}

pub fn h2h_vxlan_if(sh: &str, dh: &str) -> String {
    format!("IF_VXLAN_H2H_{sh}_{dh}")
}

pub fn h2h_bridge(sh: &str, dh: &str) -> String {
    format!("BD_H2H_{sh}_{dh}")
}

pub fn h2e_route_description(ee: &str) -> String {
    format!("IF_STATIC_ROUTE_H2E_{ee}")
}

pub fn h2h_route_description(dh: &str) -> String {
    format!("IF_STATIC_ROUTE_H2H_{dh}")
}

pub fn e2h_route_description(he: &str) -> String {
    format!("IF_STATIC_ROUTE_E2H_{he}")
}

pub fn vrf_route_description(sfc: &str, container: &str, port: &str) -> String {
    format!("VRF_{sfc}_{container}_{port}")
}

pub fn memif_vswitch_if(container: &str, port: &str) -> String {
    format!("IF_MEMIF_VSWITCH_{container}_{port}")
}

pub fn veth_vnf_if(container: &str, port: &str) -> String {
    format!("IF_VETH_VNF_{container}_{port}")
}

pub fn veth_vswitch_if(container: &str, port: &str) -> String {
    format!("IF_VETH_VSWITCH_{container}_{port}")
}

pub fn afpacket_vswitch_if(container: &str, port: &str) -> String {
    format!("IF_AFPIF_VSWITCH_{container}_{port}")
}

pub fn memif_socket(master_container: &str) -> String {
    format!("/tmp/memif_{master_container}.sock")
}

/// Synthetic containers inserted by the east-west repeat fan-out.
pub fn synthetic_vnf(index: u32) -> String {
    format!("vnfx-{index}")
}

/// Kernel name for the vswitch end of a veth pair.
///
/// IFNAMSIZ caps kernel interface names at 15 usable characters, so the
/// container and port contribute at most 5 characters each (first 2 plus
/// last 3, budgets rebalanced when one of them is short) and the veth id
/// contributes up to 3 base-36 characters.
pub fn veth_vswitch_host_name(container: &str, port: &str, veth_id: u32) -> String {
    let id = to_base36(veth_id);
    format!("{}_{}", base_host_name(container, port, &id), id)
}

fn first_n_last_m(n: usize, m: usize, s: &str) -> String {
    if s.len() <= n + m {
        return s.to_owned();
    }
    format!("{}{}", &s[..n], &s[s.len() - m..])
}

fn base_host_name(container: &str, port: &str, id: &str) -> String {
    let mut cb = 2;
    let mut ce = 3;
    let mut pb = 2;
    let mut pe = 3;

    // hand unused budget from a short container name to the port
    match container.len() {
        4 => pb += 1,
        3 => {
            pb += 1;
            pe += 1;
        }
        2 => {
            pb += 2;
            pe += 1;
        }
        1 => {
            pb += 2;
            pe += 2;
        }
        _ => {}
    }
    // and vice versa
    match port.len() {
        4 => cb += 1,
        3 => {
            cb += 1;
            ce += 1;
        }
        2 => {
            cb += 2;
            ce += 1;
        }
        1 => {
            cb += 2;
            ce += 2;
        }
        _ => {}
    }
    // a short id string frees room for the container as well
    match id.len() {
        2 => cb += 1,
        1 => {
            cb += 1;
            ce += 1;
        }
        _ => {}
    }

    format!(
        "{}_{}",
        first_n_last_m(cb, ce, container),
        first_n_last_m(pb, pe, port)
    )
}
