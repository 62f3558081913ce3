// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! North-south NIC chains: containers hang off a physical NIC, joined by
//! a bridge, by cross-connects, or by VRF routes and ARP entries.

use tracing::debug;

use sfcctl_model::ConfigError;
use sfcctl_model::entities::{SfcElementType, SfcEntity, SfcType};
use sfcctl_model::namegen;
use sfcctl_model::resources::{BridgeDomain, VppInterface};
use sfcctl_store::Store;

use crate::engine::WiringEngine;
use crate::errors::WireError;
use crate::extdriver::ExternalEntityDriver;

impl<S: Store, D: ExternalEntityDriver> WiringEngine<S, D> {
    /// Wire a north-south NIC chain. Exactly one host element describes
    /// the NIC (its container is the owning switch, its port label the
    /// interface name); the sub-type picks how containers reach it.
    pub(crate) async fn wire_sfc_north_south_nic(
        &mut self,
        sfc: &SfcEntity,
    ) -> Result<(), WireError> {
        let mut host_element = None;
        for element in &sfc.elements {
            if element.element_type == SfcElementType::HostEntity {
                if host_element.is_some() {
                    return Err(ConfigError::TooManyNicHosts(sfc.name.clone()).into());
                }
                host_element = Some(element);
            }
        }
        let host_element = host_element.ok_or_else(|| ConfigError::NoNicHost(sfc.name.clone()))?;

        // the NIC itself, typically distinct from the host's admin NIC
        let mtu = self.effective_mtu(host_element.mtu);
        let nic = VppInterface::ethernet(
            &host_element.port_label,
            "",
            &host_element.mac_addr,
            &host_element.ipv6_addr,
            mtu,
            host_element.rx_mode,
        );
        self.gateway
            .put_interface(&host_element.container, &nic)
            .await?;

        let mut bridge: Option<BridgeDomain> = None;
        if sfc.sfc_type == SfcType::NsNicBd {
            let parms = sfc
                .bd_parms
                .clone()
                .unwrap_or_else(|| self.entities.system.static_bridge_parms.clone());
            let mut bd = BridgeDomain::new(&namegen::ns_nic_bridge(&host_element.port_label), &parms);
            bd.add_interface(&host_element.port_label);
            self.gateway
                .put_bridge_domain(&host_element.container, &bd)
                .await?;
            self.create_l2fib_entries(
                &host_element.container,
                &bd.name,
                &host_element.l2fib_macs,
                &host_element.port_label,
            )
            .await?;
            bridge = Some(bd);
        }

        if sfc.sfc_type == SfcType::NsNicVrf {
            let description = namegen::vrf_route_description(
                &sfc.name,
                &host_element.container,
                &host_element.port_label,
            );
            self.create_vrf_entries(
                &host_element.container,
                host_element,
                &host_element.port_label,
                &description,
            )
            .await?;
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
            debug!(sfc = %sfc.name, container = %element.container, "joining container to nic chain");

            match sfc.sfc_type {
                SfcType::NsNicBd => {
                    let if_name = if memif {
                        self.create_memif_pair(sfc, element, false).await?
                    } else {
                        self.create_veth_afp_pair(sfc, element).await?
                    };
                    let bd = bridge
                        .as_mut()
                        .ok_or(WireError::Internal("nic bridge was not created"))?;
                    bd.add_interface(&if_name);
                    self.gateway
                        .put_bridge_domain(&element.etcd_vpp_switch_key, bd)
                        .await?;
                    let bd_name = bd.name.clone();
                    self.create_l2fib_entries(
                        &element.etcd_vpp_switch_key,
                        &bd_name,
                        &element.l2fib_macs,
                        &if_name,
                    )
                    .await?;
                }
                SfcType::NsNicVrf => {
                    // VRF joins always ride a veth/af-packet pair,
                    // whatever the element kind declares
                    let if_name = self.create_veth_afp_pair(sfc, element).await?;
                    let description = namegen::vrf_route_description(
                        &sfc.name,
                        &element.container,
                        &element.port_label,
                    );
                    self.create_vrf_entries(
                        &element.etcd_vpp_switch_key,
                        element,
                        &if_name,
                        &description,
                    )
                    .await?;
                }
                _ => {
                    // l2xconnect wiring against the NIC
                    let if_name = if memif {
                        self.create_memif_pair(sfc, element, false).await?
                    } else {
                        self.create_veth_afp_pair(sfc, element).await?
                    };
                    self.create_xconnect_pair(
                        &element.etcd_vpp_switch_key,
                        &host_element.port_label,
                        &if_name,
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }
}
