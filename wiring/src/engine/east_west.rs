// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! East-west chains: containers wired to each other on one host, through
//! direct memif pairs, a shared bridge, or cross-connects.

use tracing::debug;

use sfcctl_model::ConfigError;
use sfcctl_model::entities::{SfcElement, SfcElementType, SfcEntity, SfcType};
use sfcctl_model::namegen;
use sfcctl_model::resources::{BridgeDomain, MemifParams, VppInterface};
use sfcctl_store::Store;

use crate::engine::{BridgeSlot, WiringEngine};
use crate::errors::WireError;
use crate::extdriver::ExternalEntityDriver;
use crate::sequencer::SfcPortIds;

impl<S: Store, D: ExternalEntityDriver> WiringEngine<S, D> {
    /// Wire an east-west chain. Memif chains pair elements up two by two;
    /// bridge chains join every container into the host's default (or the
    /// chain's own) bridge; cross-connect chains stitch consecutive
    /// elements together.
    pub(crate) async fn wire_sfc_east_west(&mut self, sfc: &SfcEntity) -> Result<(), WireError> {
        if sfc.sfc_type == SfcType::EwMemif && sfc.elements.len() % 2 != 0 {
            return Err(ConfigError::OddMemifElementCount(sfc.name.clone()).into());
        }

        let mut carried_if: Option<String> = None;

        for (index, element) in sfc.elements.iter().enumerate() {
            match element.element_type {
                SfcElementType::ExternalEntity => {
                    return Err(ConfigError::ExternalEntityInEastWestChain(sfc.name.clone()).into());
                }

                SfcElementType::VppContainerAfp | SfcElementType::NonVppContainerAfp => {
                    if matches!(sfc.sfc_type, SfcType::EwBd | SfcType::EwBdL2Fib) {
                        let slot = self
                            .east_west_bridge_slot(sfc, &element.etcd_vpp_switch_key)
                            .await?;
                        let if_name = self.create_veth_afp_pair(sfc, element).await?;
                        let bd_name = self
                            .add_if_to_bridge(&element.etcd_vpp_switch_key, &slot, &if_name)
                            .await?;
                        self.create_l2fib_entries(
                            &element.etcd_vpp_switch_key,
                            &bd_name,
                            &element.l2fib_macs,
                            &if_name,
                        )
                        .await?;
                    } else {
                        // cross-connect pairing, consuming the carried end
                        let if_name = self.create_veth_afp_pair(sfc, element).await?;
                        match carried_if.take() {
                            Some(previous) => {
                                self.create_xconnect_pair(
                                    &element.etcd_vpp_switch_key,
                                    &if_name,
                                    &previous,
                                )
                                .await?;
                            }
                            None => carried_if = Some(if_name),
                        }
                    }
                }

                SfcElementType::VppContainerMemif | SfcElementType::NonVppContainerMemif => {
                    if sfc.sfc_type == SfcType::EwMemif {
                        if index % 2 == 0 {
                            let right = sfc
                                .elements
                                .get(index + 1)
                                .ok_or(WireError::Internal("odd memif chain slipped through"))?;
                            self.create_inter_container_memif_pairs(sfc, element, right)
                                .await?;
                        }
                    } else if matches!(sfc.sfc_type, SfcType::EwBd | SfcType::EwBdL2Fib) {
                        let slot = self
                            .east_west_bridge_slot(sfc, &element.etcd_vpp_switch_key)
                            .await?;
                        let if_name = self.create_memif_pair(sfc, element, true).await?;
                        let bd_name = self
                            .add_if_to_bridge(&element.etcd_vpp_switch_key, &slot, &if_name)
                            .await?;
                        self.create_l2fib_entries(
                            &element.etcd_vpp_switch_key,
                            &bd_name,
                            &element.l2fib_macs,
                            &if_name,
                        )
                        .await?;
                    } else {
                        let if_name = self.create_memif_pair(sfc, element, false).await?;
                        match carried_if.take() {
                            Some(previous) => {
                                self.create_xconnect_pair(
                                    &element.etcd_vpp_switch_key,
                                    &if_name,
                                    &previous,
                                )
                                .await?;
                            }
                            None => carried_if = Some(if_name),
                        }
                    }
                }

                _ => {}
            }
        }

        Ok(())
    }

    /// Which bridge an east-west element joins on its switch: the host's
    /// dynamic bridge, the host's static bridge, or a per-chain override
    /// bridge created lazily when the chain carries its own parameters.
    async fn east_west_bridge_slot(
        &mut self,
        sfc: &SfcEntity,
        switch: &str,
    ) -> Result<BridgeSlot, WireError> {
        if !self.state.he.contains_key(switch) {
            return Err(ConfigError::HostNotWired {
                sfc: sfc.name.clone(),
                host: switch.to_owned(),
            }
            .into());
        }

        if sfc.sfc_type == SfcType::EwBd {
            return Ok(BridgeSlot::HostDynamic {
                he: switch.to_owned(),
            });
        }
        let Some(parms) = &sfc.bd_parms else {
            return Ok(BridgeSlot::HostL2Fib {
                he: switch.to_owned(),
            });
        };

        let present = self
            .state
            .sfc_to_hes
            .get(&sfc.name)
            .is_some_and(|bridges| bridges.contains_key(switch));
        if !present {
            let bd = BridgeDomain::new(&namegen::sfc_host_bridge(&sfc.name, switch), parms);
            debug!(sfc = %sfc.name, switch, bridge = %bd.name, "creating chain override bridge");
            self.gateway.put_bridge_domain(switch, &bd).await?;
            self.state
                .sfc_to_hes
                .entry(sfc.name.clone())
                .or_default()
                .insert(switch.to_owned(), bd);
        }
        Ok(BridgeSlot::SfcOverride {
            sfc: sfc.name.clone(),
            he: switch.to_owned(),
        })
    }

    /// Create the inter-container memif pair between two adjacent chain
    /// elements, fanning out through `vnf_repeat_count` synthetic hops.
    /// Each hop keys one memif-id binding under its left-hand container.
    pub(crate) async fn create_inter_container_memif_pairs(
        &mut self,
        sfc: &SfcEntity,
        left: &SfcElement,
        right: &SfcElement,
    ) -> Result<(), WireError> {
        debug!(
            sfc = %sfc.name,
            left = %left.container,
            right = %right.container,
            repeat = sfc.vnf_repeat_count,
            "creating inter-container memif pairs"
        );
        let mtu = self.effective_mtu(left.mtu);
        let rx_mode = left.rx_mode;

        for hop in 0..=sfc.vnf_repeat_count {
            let (container1, port1) = if hop == 0 {
                (left.container.clone(), left.port_label.clone())
            } else {
                (namegen::synthetic_vnf(hop - 1), left.port_label.clone())
            };
            let (container2, port2) = if hop == sfc.vnf_repeat_count {
                (right.container.clone(), right.port_label.clone())
            } else {
                (namegen::synthetic_vnf(hop), right.port_label.clone())
            };

            let memif_id = match self
                .alloc
                .sfc_port_ids(&sfc.name, &container1, &port1)
                .and_then(|ids| ids.memif_id)
            {
                Some(id) => id,
                None => self.alloc.alloc_memif_id()?,
            };

            let master = VppInterface::memif(
                &port1,
                MemifParams {
                    id: memif_id,
                    master: true,
                    master_container: container1.clone(),
                },
                "",
                "",
                "",
                mtu,
                rx_mode,
            );
            self.gateway.put_interface(&container1, &master).await?;

            let slave = VppInterface::memif(
                &port2,
                MemifParams {
                    id: memif_id,
                    master: false,
                    master_container: container1.clone(),
                },
                "",
                "",
                "",
                mtu,
                rx_mode,
            );
            self.gateway.put_interface(&container2, &slave).await?;

            self.alloc
                .record_sfc_port_ids(
                    &sfc.name,
                    &container1,
                    &port1,
                    SfcPortIds {
                        memif_id: Some(memif_id),
                        ..SfcPortIds::default()
                    },
                )
                .await?;
        }

        Ok(())
    }
}
