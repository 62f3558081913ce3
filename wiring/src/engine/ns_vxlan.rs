// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! North-south VXLAN chains: containers join a bridge that reaches an
//! external entity or a destination host over a vxlan tunnel.

use tracing::{debug, info};

use sfcctl_model::ConfigError;
use sfcctl_model::entities::{SfcElement, SfcElementType, SfcEntity};
use sfcctl_model::namegen;
use sfcctl_model::resources::{BridgeDomain, StaticRoute, VppInterface};
use sfcctl_store::Store;

use crate::engine::{BridgeSlot, WiringEngine, edge_mut};
use crate::errors::WireError;
use crate::extdriver::ExternalEntityDriver;

impl<S: Store, D: ExternalEntityDriver> WiringEngine<S, D> {
    /// Wire a north-south vxlan chain: at most one external entity, at
    /// most one destination host, at least one of the two; every container
    /// element joins the (lazily created) bridge toward that partner.
    pub(crate) async fn wire_sfc_north_south_vxlan(
        &mut self,
        sfc: &SfcEntity,
    ) -> Result<(), WireError> {
        let mut ee_element: Option<&SfcElement> = None;
        let mut dh_element: Option<&SfcElement> = None;

        for element in &sfc.elements {
            match element.element_type {
                SfcElementType::ExternalEntity => {
                    if ee_element.is_some() {
                        return Err(ConfigError::TooManyExternalEntities(sfc.name.clone()).into());
                    }
                    if !self.entities.ees.contains_key(&element.container) {
                        return Err(ConfigError::ExternalEntityNotFound {
                            sfc: sfc.name.clone(),
                            ee: element.container.clone(),
                        }
                        .into());
                    }
                    ee_element = Some(element);
                }
                SfcElementType::HostEntity => {
                    if dh_element.is_some() {
                        return Err(ConfigError::TooManyDestinationHosts(sfc.name.clone()).into());
                    }
                    if !self.entities.hes.contains_key(&element.container) {
                        return Err(ConfigError::HostNotFound {
                            sfc: sfc.name.clone(),
                            host: element.container.clone(),
                        }
                        .into());
                    }
                    dh_element = Some(element);
                }
                _ => {}
            }
        }

        if ee_element.is_none() && dh_element.is_none() {
            return Err(ConfigError::NoNorthSouthTarget(sfc.name.clone()).into());
        }

        for element in &sfc.elements {
            let memif = matches!(
                element.element_type,
                SfcElementType::VppContainerMemif | SfcElementType::NonVppContainerMemif
            );
            let afp = matches!(
                element.element_type,
                SfcElementType::VppContainerAfp | SfcElementType::NonVppContainerAfp
            );
            if !memif && !afp {
                continue;
            }

            let slot = if let Some(ee) = ee_element {
                self.ensure_vxlan_and_bridge_to_external(
                    &sfc.name,
                    &element.etcd_vpp_switch_key,
                    &ee.container,
                    ee.vlan_id,
                )
                .await?;
                BridgeSlot::HeToEe {
                    he: element.etcd_vpp_switch_key.clone(),
                    ee: ee.container.clone(),
                }
            } else {
                let dh = dh_element.ok_or(WireError::Internal("north-south target lost"))?;
                self.ensure_vxlan_and_bridge_to_dest_host(
                    &sfc.name,
                    &element.etcd_vpp_switch_key,
                    &dh.container,
                    dh.vlan_id,
                )
                .await?;
                BridgeSlot::HeToHe {
                    sh: element.etcd_vpp_switch_key.clone(),
                    dh: dh.container.clone(),
                }
            };

            let if_name = if memif {
                self.create_memif_pair(sfc, element, false).await?
            } else {
                self.create_veth_afp_pair(sfc, element).await?
            };
            self.add_if_to_bridge(&element.etcd_vpp_switch_key, &slot, &if_name)
                .await?;
        }

        Ok(())
    }

    /// Lazily create the vxlan tunnel, optional static route and bridge
    /// from a host toward an external entity. Creation order matters:
    /// tunnel first, then route, then the bridge with the tunnel as its
    /// first member; the external driver is called once, when the bridge
    /// first comes into existence.
    async fn ensure_vxlan_and_bridge_to_external(
        &mut self,
        sfc_name: &str,
        host: &str,
        ee_name: &str,
        vlan_hint: u32,
    ) -> Result<(), WireError> {
        edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?;

        let he = self
            .entities
            .hes
            .get(host)
            .cloned()
            .ok_or_else(|| ConfigError::HostNotFound {
                sfc: sfc_name.to_owned(),
                host: host.to_owned(),
            })?;
        let ee = self
            .entities
            .ees
            .get(ee_name)
            .cloned()
            .ok_or_else(|| ConfigError::ExternalEntityNotFound {
                sfc: sfc_name.to_owned(),
                ee: ee_name.to_owned(),
            })?;
        let host_if = ee
            .host_interface
            .clone()
            .ok_or_else(|| ConfigError::InvalidExternalEntity(ee_name.to_owned()))?;
        let host_vxlan = ee
            .host_vxlan
            .clone()
            .ok_or_else(|| ConfigError::InvalidExternalEntity(ee_name.to_owned()))?;

        if edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?
            .vxlan_if
            .is_none()
        {
            let vlan_id = if vlan_hint != 0 {
                vlan_hint
            } else {
                match self.alloc.he2ee_vlan_id(host, ee_name) {
                    Some(bound) => bound,
                    None => self.alloc.alloc_vlan_id()?,
                }
            };
            let vxlan = VppInterface::vxlan_tunnel(
                &namegen::h2e_vxlan_if(host, ee_name),
                vlan_id,
                &he.vxlan_tunnel_ipv4,
                &host_vxlan.source_ipv4,
            );
            debug!(host, ee = ee_name, vlan_id, "creating vxlan tunnel to external entity");
            self.gateway.put_interface(&he.name, &vxlan).await?;
            edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?.vxlan_if = Some(vxlan);
            self.alloc.record_he2ee_vlan_id(host, ee_name, vlan_id).await?;
        }

        if edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?
            .route
            .is_none()
            && he.create_vxlan_static_route
        {
            let route = StaticRoute::new(
                0,
                &namegen::h2e_route_description(ee_name),
                &host_vxlan.source_ipv4,
                &host_if.ipv4_addr,
                &he.eth_if_name,
                self.entities.system.default_static_route_weight,
                self.entities.system.default_static_route_preference,
            );
            self.gateway.put_static_route(&he.name, &route).await?;
            edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?.route = Some(route);
        }

        if edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?
            .bridge
            .is_none()
        {
            let edge = edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?;
            let tunnel_name = edge
                .vxlan_if
                .as_ref()
                .map(|iface| iface.name.clone())
                .ok_or(WireError::Internal("bridge created before its tunnel"))?;
            let mut bd = BridgeDomain::new(
                &namegen::h2e_bridge(host, ee_name),
                &self.entities.system.dynamic_bridge_parms,
            );
            bd.add_interface(&tunnel_name);
            self.gateway.put_bridge_domain(&he.name, &bd).await?;
            edge_mut(&mut self.state.he_to_ees, sfc_name, host, ee_name)?.bridge = Some(bd);

            // first bridge toward this entity: reconfigure the router side
            self.wire_external_entity_to_host(ee_name, host).await?;
        }

        Ok(())
    }

    /// The host-to-host flavor of the lazy edge materialization. Same
    /// ordering discipline; no external driver involved.
    async fn ensure_vxlan_and_bridge_to_dest_host(
        &mut self,
        sfc_name: &str,
        src_host: &str,
        dst_host: &str,
        vlan_hint: u32,
    ) -> Result<(), WireError> {
        edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?;

        let sh = self
            .entities
            .hes
            .get(src_host)
            .cloned()
            .ok_or_else(|| ConfigError::HostNotFound {
                sfc: sfc_name.to_owned(),
                host: src_host.to_owned(),
            })?;
        let dh = self
            .entities
            .hes
            .get(dst_host)
            .cloned()
            .ok_or_else(|| ConfigError::HostNotFound {
                sfc: sfc_name.to_owned(),
                host: dst_host.to_owned(),
            })?;

        if edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?
            .vxlan_if
            .is_none()
        {
            let vlan_id = if vlan_hint != 0 {
                vlan_hint
            } else {
                match self.alloc.he2he_vlan_id(src_host, dst_host) {
                    Some(bound) => bound,
                    None => self.alloc.alloc_vlan_id()?,
                }
            };
            let vxlan = VppInterface::vxlan_tunnel(
                &namegen::h2h_vxlan_if(src_host, dst_host),
                vlan_id,
                &sh.vxlan_tunnel_ipv4,
                &dh.vxlan_tunnel_ipv4,
            );
            debug!(src = src_host, dst = dst_host, vlan_id, "creating host pair vxlan tunnel");
            self.gateway.put_interface(&sh.name, &vxlan).await?;
            edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?.vxlan_if =
                Some(vxlan);
            self.alloc
                .record_he2he_vlan_id(src_host, dst_host, vlan_id)
                .await?;
        }

        if edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?
            .route
            .is_none()
            && sh.create_vxlan_static_route
        {
            let route = StaticRoute::new(
                0,
                &namegen::h2h_route_description(dst_host),
                &dh.vxlan_tunnel_ipv4,
                &dh.eth_ipv4,
                &sh.eth_if_name,
                self.entities.system.default_static_route_weight,
                self.entities.system.default_static_route_preference,
            );
            self.gateway.put_static_route(&sh.name, &route).await?;
            edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?.route = Some(route);
        }

        if edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?
            .bridge
            .is_none()
        {
            let edge = edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?;
            let tunnel_name = edge
                .vxlan_if
                .as_ref()
                .map(|iface| iface.name.clone())
                .ok_or(WireError::Internal("bridge created before its tunnel"))?;
            let mut bd = BridgeDomain::new(
                &namegen::h2h_bridge(src_host, dst_host),
                &self.entities.system.dynamic_bridge_parms,
            );
            bd.add_interface(&tunnel_name);
            self.gateway.put_bridge_domain(&sh.name, &bd).await?;
            edge_mut(&mut self.state.he_to_hes, sfc_name, src_host, dst_host)?.bridge = Some(bd);
        }

        Ok(())
    }

    /// Router-side half of a (host, external entity) edge: a static route
    /// from the router back to the host, published under the entity's own
    /// prefix, then one driver call carrying the edge's VNI.
    async fn wire_external_entity_to_host(
        &mut self,
        ee_name: &str,
        he_name: &str,
    ) -> Result<(), WireError> {
        let Some(vni) = self
            .state
            .he_to_ees
            .get(he_name)
            .and_then(|edges| edges.get(ee_name))
            .and_then(|edge| edge.vxlan_if.as_ref())
            .and_then(|iface| iface.vxlan.as_ref())
            .map(|vxlan| vxlan.vni)
        else {
            return Ok(());
        };
        let (Some(he), Some(ee)) = (
            self.entities.hes.get(he_name).cloned(),
            self.entities.ees.get(ee_name).cloned(),
        ) else {
            return Ok(());
        };
        let Some(host_if) = ee.host_interface.clone() else {
            return Ok(());
        };

        let route = StaticRoute::new(
            0,
            &namegen::e2h_route_description(he_name),
            &he.vxlan_tunnel_ipv4,
            &he.eth_ipv4,
            &host_if.if_name,
            self.entities.system.default_static_route_weight,
            self.entities.system.default_static_route_preference,
        );
        self.gateway.put_static_route(&ee.name, &route).await?;

        info!(ee = ee_name, he = he_name, vni, "handing edge to external entity driver");
        self.driver.wire_external_to_host(&ee, &he, vni, &route).await;
        Ok(())
    }
}
