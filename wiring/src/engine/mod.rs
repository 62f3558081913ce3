// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The wiring engine: the policy core that turns declarative entities into
//! derived resources.
//!
//! One engine instance owns all mutable wiring state (counters, caches,
//! the store writer); everything here runs on a single task and only
//! suspends on store I/O. Chain-type specific algorithms live in the
//! sibling modules; this module carries the host-level operations and the
//! helpers every chain shape shares: interface pairs, bridge membership,
//! cross-connects, L2-FIB and VRF entries.

mod east_west;
mod ns_nic;
mod ns_vxlan;

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use sfcctl_model::addrs::{ensure_subnet_suffix, format_mac_address, strip_subnet_suffix};
use sfcctl_model::entities::{
    ExternalEntity, HostEntity, SfcElement, SfcElementType, SfcEntity, SfcType, SystemParameters,
};
use sfcctl_model::namegen;
use sfcctl_model::resources::{
    ArpEntry, BridgeDomain, L2FibEntry, LinuxInterface, MemifParams, StaticRoute, VppInterface,
    XConnect,
};
use sfcctl_model::ConfigError;
use sfcctl_store::{Store, StoreGateway};

use crate::cache::{EdgeState, EntityCache, HostState, StateCache};
use crate::errors::WireError;
use crate::extdriver::ExternalEntityDriver;
use crate::ipam::Ipam;
use crate::sequencer::{HostIds, IdAllocator, Sequencer, SfcPortIds};

/// Identifies which cached bridge a vswitch-end interface joins.
#[derive(Clone, Debug)]
pub(crate) enum BridgeSlot {
    HeToEe { he: String, ee: String },
    HeToHe { sh: String, dh: String },
    HostDynamic { he: String },
    HostL2Fib { he: String },
    SfcOverride { sfc: String, he: String },
}

/// Addresses resolved for one container port.
struct PortAddresses {
    ipv4: String,
    mac: String,
    ip_id: Option<u32>,
    mac_id: Option<u32>,
}

pub struct WiringEngine<S, D> {
    pub(crate) entities: EntityCache,
    pub(crate) state: StateCache,
    pub(crate) alloc: IdAllocator<S>,
    pub(crate) ipam: Ipam,
    pub(crate) gateway: StoreGateway<S>,
    pub(crate) driver: D,
}

impl<S: Store, D: ExternalEntityDriver> WiringEngine<S, D> {
    /// Build an engine over a store and an external-entity driver,
    /// restoring the id allocator from persisted bindings.
    pub async fn new(store: Arc<S>, driver: D) -> Result<Self, WireError> {
        let alloc = IdAllocator::load(store.clone()).await?;
        Ok(Self {
            entities: EntityCache::default(),
            state: StateCache::default(),
            alloc,
            ipam: Ipam::new(),
            gateway: StoreGateway::new(store),
            driver,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        self.gateway.store()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Current counter values; diagnostics only.
    pub fn sequencer(&self) -> &Sequencer {
        self.alloc.sequencer()
    }

    /// Cache the system parameters and seed the VLAN counter. Only the
    /// first call seeds; later calls just refresh the cached parameters.
    pub fn set_system_parameters(&mut self, sp: &SystemParameters) {
        info!(starting_vlan_id = sp.starting_vlan_id, mtu = sp.mtu, "system parameters set");
        self.entities.system = sp.clone();
        self.alloc.seed_vlan(sp.starting_vlan_id);
    }

    /// Wire a host's internals: its admin NIC, its loopback (allocating a
    /// MAC-instance id when none is supplied) and the two default
    /// east-west bridges. Idempotent per host and run.
    pub async fn wire_host(&mut self, he: &HostEntity) -> Result<(), WireError> {
        self.entities.hes.insert(he.name.clone(), he.clone());
        if self.state.he.contains_key(&he.name) {
            return Ok(());
        }
        info!(host = %he.name, "wiring host internals");
        self.state.he.insert(he.name.clone(), HostState::default());

        let mtu = self.effective_mtu(he.mtu);
        if !he.eth_if_name.is_empty() {
            let nic = VppInterface::ethernet(
                &he.eth_if_name,
                &he.eth_ipv4,
                "",
                &he.eth_ipv6,
                mtu,
                he.rx_mode,
            );
            self.gateway.put_interface(&he.name, &nic).await?;
        }

        let mut loopback_mac_id = None;
        if !he.loopback_ipv4.is_empty() || !he.loopback_ipv6.is_empty() {
            let mac = if he.loopback_mac_addr.is_empty() {
                let id = match self.alloc.host_ids(&he.name).and_then(|ids| ids.loopback_mac_id) {
                    Some(id) => id,
                    None => self.alloc.alloc_mac_instance_id()?,
                };
                loopback_mac_id = Some(id);
                format_mac_address(id)
            } else {
                he.loopback_mac_addr.clone()
            };
            let loopback = VppInterface::loopback(
                &namegen::host_loopback_if(&he.name),
                &mac,
                &he.loopback_ipv4,
                &he.loopback_ipv6,
                mtu,
                he.rx_mode,
            );
            self.gateway.put_interface(&he.name, &loopback).await?;
        }

        let dynamic = BridgeDomain::new(
            &namegen::host_dynamic_bridge(&he.name),
            &self.entities.system.dynamic_bridge_parms,
        );
        self.gateway.put_bridge_domain(&he.name, &dynamic).await?;
        let l2fib = BridgeDomain::new(
            &namegen::host_static_bridge(&he.name),
            &self.entities.system.static_bridge_parms,
        );
        self.gateway.put_bridge_domain(&he.name, &l2fib).await?;

        if let Some(host_state) = self.state.he.get_mut(&he.name) {
            host_state.ew_bridge = Some(dynamic);
            host_state.ew_l2fib_bridge = Some(l2fib);
        }

        self.alloc
            .record_host_ids(&he.name, HostIds { loopback_mac_id })
            .await?;
        Ok(())
    }

    /// Record the (source host, dest host) edge. Tunnels, routes and
    /// bridges are deferred until the first chain that crosses the edge.
    pub fn wire_host_pair(&mut self, sh: &HostEntity, dh: &HostEntity) {
        self.entities.hes.insert(sh.name.clone(), sh.clone());
        self.entities.hes.insert(dh.name.clone(), dh.clone());
        let edges = self.state.he_to_hes.entry(sh.name.clone()).or_default();
        if edges.contains_key(&dh.name) {
            return;
        }
        debug!(src = %sh.name, dst = %dh.name, "recorded host pair edge");
        edges.insert(dh.name.clone(), EdgeState::default());
    }

    /// Record the (host, external entity) edge; creation is deferred like
    /// [`Self::wire_host_pair`].
    pub fn wire_host_to_external(
        &mut self,
        he: &HostEntity,
        ee: &ExternalEntity,
    ) -> Result<(), WireError> {
        if ee.host_interface.is_none() || ee.host_vxlan.is_none() {
            return Err(ConfigError::InvalidExternalEntity(ee.name.clone()).into());
        }
        self.entities.hes.insert(he.name.clone(), he.clone());
        self.entities.ees.insert(ee.name.clone(), ee.clone());
        let edges = self.state.he_to_ees.entry(he.name.clone()).or_default();
        if edges.contains_key(&ee.name) {
            return Ok(());
        }
        debug!(host = %he.name, ee = %ee.name, "recorded host to external edge");
        edges.insert(ee.name.clone(), EdgeState::default());
        Ok(())
    }

    /// Wire one chain, dispatching on its type.
    pub async fn wire_sfc(&mut self, sfc: &SfcEntity) -> Result<(), WireError> {
        info!(sfc = %sfc.name, sfc_type = ?sfc.sfc_type, "wiring chain");
        match sfc.sfc_type {
            SfcType::NsVxlan => {
                self.entities.sfcs.insert(sfc.name.clone(), sfc.clone());
                self.wire_sfc_north_south_vxlan(sfc).await
            }
            SfcType::NsNicBd | SfcType::NsNicVrf | SfcType::NsNicL2Xconn => {
                self.entities.sfcs.insert(sfc.name.clone(), sfc.clone());
                self.wire_sfc_north_south_nic(sfc).await
            }
            SfcType::EwMemif | SfcType::EwBd | SfcType::EwBdL2Fib | SfcType::EwL2Xconn => {
                self.entities.sfcs.insert(sfc.name.clone(), sfc.clone());
                self.wire_sfc_east_west(sfc).await
            }
            SfcType::Unknown | SfcType::NsVxlanVrf => {
                Err(ConfigError::UnknownSfcType(sfc.name.clone()).into())
            }
        }
    }

    /// Addresses assigned to a container port by earlier wiring, with the
    /// IP stripped of its prefix length.
    pub fn sfc_interface_addresses(&self, container: &str, port: &str) -> Option<(String, String)> {
        self.state.sfc_if_addr(container, port).map(|addr| {
            (
                strip_subnet_suffix(&addr.ip_address).to_owned(),
                addr.mac_address.clone(),
            )
        })
    }

    pub(crate) fn effective_mtu(&self, mtu: u32) -> u32 {
        if mtu == 0 { self.entities.system.mtu } else { mtu }
    }

    /// Add a vswitch-end interface to a cached bridge and republish it.
    /// Returns the bridge name for follow-up L2-FIB entries.
    pub(crate) async fn add_if_to_bridge(
        &mut self,
        switch: &str,
        slot: &BridgeSlot,
        if_name: &str,
    ) -> Result<String, WireError> {
        let bd = resolve_bridge_slot(&mut self.state, slot)
            .ok_or(WireError::Internal("bridge missing from state cache"))?;
        bd.add_interface(if_name);
        self.gateway.put_bridge_domain(switch, bd).await?;
        Ok(bd.name.clone())
    }

    /// Create the symmetric pair of cross-connect records between two
    /// interfaces on one switch.
    pub(crate) async fn create_xconnect_pair(
        &mut self,
        switch: &str,
        if1: &str,
        if2: &str,
    ) -> Result<(), WireError> {
        self.gateway
            .put_xconnect(switch, &XConnect::new(if1, if2))
            .await?;
        self.gateway
            .put_xconnect(switch, &XConnect::new(if2, if1))
            .await?;
        Ok(())
    }

    pub(crate) async fn create_l2fib_entries(
        &mut self,
        switch: &str,
        bridge: &str,
        macs: &[String],
        outgoing_if: &str,
    ) -> Result<(), WireError> {
        for mac in macs {
            let entry = L2FibEntry::forward(bridge, mac, outgoing_if);
            self.gateway.put_l2fib_entry(switch, &entry).await?;
        }
        Ok(())
    }

    /// Install the static routes and ARP entries an element declares,
    /// all pointing at its vswitch-end interface.
    pub(crate) async fn create_vrf_entries(
        &mut self,
        switch: &str,
        element: &SfcElement,
        outgoing_if: &str,
        default_description: &str,
    ) -> Result<(), WireError> {
        for route in &element.l3vrf_routes {
            let weight = if route.weight == 0 {
                self.entities.system.default_static_route_weight
            } else {
                route.weight
            };
            let preference = if route.preference == 0 {
                self.entities.system.default_static_route_preference
            } else {
                route.preference
            };
            let description = if route.description.is_empty() {
                default_description
            } else {
                &route.description
            };
            let record = StaticRoute::new(
                route.vrf_id,
                description,
                &route.dst_ip_addr,
                &route.next_hop_addr,
                outgoing_if,
                weight,
                preference,
            );
            self.gateway.put_static_route(switch, &record).await?;
        }
        for arp in &element.l3arp_entries {
            let record = ArpEntry::new(outgoing_if, &arp.ip_address, &arp.phys_address);
            self.gateway.put_arp_entry(switch, &record).await?;
        }
        Ok(())
    }

    /// Resolve the IPv4/MAC for a container port: explicit values win,
    /// otherwise addresses come from the chain prefix and the MAC-instance
    /// space, reusing persisted ids when present. `generate` gates the
    /// automatic side; explicit addresses are honored either way.
    fn assign_port_addresses(
        &mut self,
        sfc: &SfcEntity,
        element: &SfcElement,
        bound: Option<&SfcPortIds>,
        generate: bool,
    ) -> Result<PortAddresses, WireError> {
        let mut addrs = PortAddresses {
            ipv4: String::new(),
            mac: String::new(),
            ip_id: None,
            mac_id: None,
        };

        if element.ipv4_addr.is_empty() {
            if generate && !sfc.sfc_ipv4_prefix.is_empty() {
                match bound.and_then(|ids| ids.ip_id) {
                    Some(id) => {
                        addrs.ipv4 = self.ipam.set_ip_id_in_subnet(&sfc.sfc_ipv4_prefix, id)?;
                        addrs.ip_id = Some(id);
                    }
                    None => {
                        let (ipv4, id) = self.ipam.allocate_from_subnet(&sfc.sfc_ipv4_prefix)?;
                        addrs.ipv4 = ipv4;
                        addrs.ip_id = Some(id);
                    }
                }
            }
        } else {
            addrs.ipv4 = ensure_subnet_suffix(&element.ipv4_addr);
            if !sfc.sfc_ipv4_prefix.is_empty() {
                self.ipam.set_ip_addr_if_inside_subnet(
                    &sfc.sfc_ipv4_prefix,
                    strip_subnet_suffix(&element.ipv4_addr),
                );
            }
        }
        if !sfc.sfc_ipv4_prefix.is_empty() {
            debug!(sfc = %sfc.name, pool = %self.ipam.dump_subnet(&sfc.sfc_ipv4_prefix), addr = %addrs.ipv4, "chain addressing");
        }

        if element.mac_addr.is_empty() {
            if generate {
                let id = match bound.and_then(|ids| ids.mac_addr_id) {
                    Some(id) => id,
                    None => self.alloc.alloc_mac_instance_id()?,
                };
                addrs.mac = format_mac_address(id);
                addrs.mac_id = Some(id);
            }
        } else {
            addrs.mac = element.mac_addr.clone();
        }

        Ok(addrs)
    }

    /// Create the two ends of a memif: the container end named by the
    /// port label, and the vswitch (master) end on the owning switch.
    /// Returns the vswitch-end interface name.
    pub(crate) async fn create_memif_pair(
        &mut self,
        sfc: &SfcEntity,
        element: &SfcElement,
        generate_addresses: bool,
    ) -> Result<String, WireError> {
        debug!(vnf = %element.container, switch = %element.etcd_vpp_switch_key, "creating memif pair");
        let bound = self
            .alloc
            .sfc_port_ids(&sfc.name, &element.container, &element.port_label)
            .cloned();
        let memif_id = match bound.as_ref().and_then(|ids| ids.memif_id) {
            Some(id) => id,
            None => self.alloc.alloc_memif_id()?,
        };
        let addrs = self.assign_port_addresses(sfc, element, bound.as_ref(), generate_addresses)?;
        let mtu = self.effective_mtu(element.mtu);

        let vnf_end = VppInterface::memif(
            &element.port_label,
            MemifParams {
                id: memif_id,
                master: false,
                master_container: element.etcd_vpp_switch_key.clone(),
            },
            &addrs.ipv4,
            &addrs.mac,
            &element.ipv6_addr,
            mtu,
            element.rx_mode,
        );
        self.gateway.put_interface(&element.container, &vnf_end).await?;

        let vswitch_name = namegen::memif_vswitch_if(&element.container, &element.port_label);
        let vswitch_end = VppInterface::memif(
            &vswitch_name,
            MemifParams {
                id: memif_id,
                master: true,
                master_container: element.etcd_vpp_switch_key.clone(),
            },
            "",
            "",
            "",
            mtu,
            element.rx_mode,
        );
        self.gateway
            .put_interface(&element.etcd_vpp_switch_key, &vswitch_end)
            .await?;

        self.alloc
            .record_sfc_port_ids(
                &sfc.name,
                &element.container,
                &element.port_label,
                SfcPortIds {
                    ip_id: addrs.ip_id,
                    mac_addr_id: addrs.mac_id,
                    memif_id: Some(memif_id),
                    veth_id: None,
                },
            )
            .await?;
        self.state
            .set_sfc_if_addr(&element.container, &element.port_label, &addrs.ipv4, &addrs.mac);
        Ok(vswitch_name)
    }

    /// Create a veth pair plus its af-packet binding(s): the container end
    /// in the VNF namespace, the host end in the vswitch namespace, and an
    /// af-packet interface on the switch bound to the host end. VPP
    /// containers additionally get their own af-packet end carrying the
    /// addresses. Returns the vswitch-side af-packet interface name.
    pub(crate) async fn create_veth_afp_pair(
        &mut self,
        sfc: &SfcEntity,
        element: &SfcElement,
    ) -> Result<String, WireError> {
        debug!(vnf = %element.container, switch = %element.etcd_vpp_switch_key, "creating veth/af-packet pair");
        let bound = self
            .alloc
            .sfc_port_ids(&sfc.name, &element.container, &element.port_label)
            .cloned();
        let veth_id = match bound.as_ref().and_then(|ids| ids.veth_id) {
            Some(id) => id,
            None => self.alloc.alloc_veth_id()?,
        };
        let addrs = self.assign_port_addresses(sfc, element, bound.as_ref(), true)?;
        let mtu = self.effective_mtu(element.mtu);

        let veth_vnf = namegen::veth_vnf_if(&element.container, &element.port_label);
        let veth_vswitch = namegen::veth_vswitch_if(&element.container, &element.port_label);
        let host_vnf = element.port_label.clone();
        let host_vswitch =
            namegen::veth_vswitch_host_name(&element.container, &element.port_label, veth_id);

        // a VPP container addresses its af-packet end, not the veth
        let is_vpp = element.element_type == SfcElementType::VppContainerAfp;
        let (veth_ipv4, veth_ipv6) = if is_vpp {
            ("", "")
        } else {
            (addrs.ipv4.as_str(), element.ipv6_addr.as_str())
        };

        let vnf_end = LinuxInterface::veth(
            &veth_vnf,
            &host_vnf,
            &veth_vswitch,
            &element.container,
            &addrs.mac,
            veth_ipv4,
            veth_ipv6,
            mtu,
        );
        self.gateway
            .put_linux_interface(&element.etcd_vpp_switch_key, &vnf_end)
            .await?;
        let vswitch_end = LinuxInterface::veth(
            &veth_vswitch,
            &host_vswitch,
            &veth_vnf,
            &element.etcd_vpp_switch_key,
            "",
            "",
            "",
            mtu,
        );
        self.gateway
            .put_linux_interface(&element.etcd_vpp_switch_key, &vswitch_end)
            .await?;

        if is_vpp {
            let vnf_afp = VppInterface::afpacket(
                &element.port_label,
                &host_vnf,
                &addrs.ipv4,
                &addrs.mac,
                &element.ipv6_addr,
                mtu,
                element.rx_mode,
            );
            self.gateway.put_interface(&element.container, &vnf_afp).await?;
        }

        let afp_name = namegen::afpacket_vswitch_if(&element.container, &element.port_label);
        let vswitch_afp = VppInterface::afpacket(
            &afp_name,
            &host_vswitch,
            "",
            "",
            "",
            mtu,
            element.rx_mode,
        );
        self.gateway
            .put_interface(&element.etcd_vpp_switch_key, &vswitch_afp)
            .await?;

        self.alloc
            .record_sfc_port_ids(
                &sfc.name,
                &element.container,
                &element.port_label,
                SfcPortIds {
                    ip_id: addrs.ip_id,
                    mac_addr_id: addrs.mac_id,
                    memif_id: None,
                    veth_id: Some(veth_id),
                },
            )
            .await?;
        self.state
            .set_sfc_if_addr(&element.container, &element.port_label, &addrs.ipv4, &addrs.mac);
        Ok(afp_name)
    }
}

/// Look up the cached bridge a slot points at.
fn resolve_bridge_slot<'a>(
    state: &'a mut StateCache,
    slot: &BridgeSlot,
) -> Option<&'a mut BridgeDomain> {
    match slot {
        BridgeSlot::HeToEe { he, ee } => state.he_to_ee_mut(he, ee)?.bridge.as_mut(),
        BridgeSlot::HeToHe { sh, dh } => state.he_to_he_mut(sh, dh)?.bridge.as_mut(),
        BridgeSlot::HostDynamic { he } => state.he.get_mut(he)?.ew_bridge.as_mut(),
        BridgeSlot::HostL2Fib { he } => state.he.get_mut(he)?.ew_l2fib_bridge.as_mut(),
        BridgeSlot::SfcOverride { sfc, he } => state.sfc_to_hes.get_mut(sfc)?.get_mut(he),
    }
}

/// Fetch an edge recorded by `wire_host_pair` / `wire_host_to_external`,
/// distinguishing "host never wired" from "edge never wired".
pub(crate) fn edge_mut<'a>(
    edges: &'a mut BTreeMap<String, BTreeMap<String, EdgeState>>,
    sfc: &str,
    src: &str,
    dst: &str,
) -> Result<&'a mut EdgeState, ConfigError> {
    let map = edges.get_mut(src).ok_or_else(|| ConfigError::HostNotWired {
        sfc: sfc.to_owned(),
        host: src.to_owned(),
    })?;
    map.get_mut(dst).ok_or_else(|| ConfigError::EdgeNotWired {
        sfc: sfc.to_owned(),
        src: src.to_owned(),
        dst: dst.to_owned(),
    })
}
