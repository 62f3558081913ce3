// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end wiring scenarios against the in-memory store.

use std::sync::Arc;

use serde_json::Value;
use tracing_test::traced_test;

use sfcctl_model::entities::{
    ControllerConfig, EeHostInterface, EeHostVxlan, ExternalEntityBuilder, HostEntityBuilder,
    SfcElementBuilder, SfcElementType, SfcEntityBuilder, SfcType, SystemParameters,
};
use sfcctl_model::resources::{BridgeDomain, VppInterface};
use sfcctl_model::ConfigError;
use sfcctl_store::{MemStore, Store, keys};
use sfcctl_wiring::WiringEngine;
use sfcctl_wiring::extdriver::{NullDriver, RecordingDriver};

fn host(name: &str) -> HostEntityBuilder {
    let mut builder = HostEntityBuilder::default();
    builder.name(name);
    builder
}

fn memif_element(sfc_switch: &str, container: &str, port: &str) -> SfcElementBuilder {
    let mut builder = SfcElementBuilder::default();
    builder
        .container(container)
        .port_label(port)
        .etcd_vpp_switch_key(sfc_switch)
        .element_type(SfcElementType::VppContainerMemif);
    builder
}

async fn engine_with<D: sfcctl_wiring::extdriver::ExternalEntityDriver>(
    store: Arc<MemStore>,
    driver: D,
) -> WiringEngine<MemStore, D> {
    WiringEngine::new(store, driver).await.expect("engine loads")
}

async fn interface_at(store: &MemStore, switch: &str, name: &str) -> VppInterface {
    let value = store
        .get(&keys::interface_key(switch, name))
        .await
        .expect("store get")
        .unwrap_or_else(|| panic!("interface {switch}/{name} not published"));
    serde_json::from_value(value).expect("interface decodes")
}

async fn bridge_at(store: &MemStore, switch: &str, name: &str) -> BridgeDomain {
    let value = store
        .get(&keys::bridge_domain_key(switch, name))
        .await
        .expect("store get")
        .unwrap_or_else(|| panic!("bridge {switch}/{name} not published"));
    serde_json::from_value(value).expect("bridge decodes")
}

async fn keys_with_prefix(store: &MemStore, prefix: &str) -> Vec<String> {
    store
        .list(prefix)
        .await
        .expect("store list")
        .into_iter()
        .map(|(key, _)| key)
        .collect()
}

/// Scenario: one host, one east-west memif chain of two containers.
#[tokio::test]
#[traced_test]
async fn ew_memif_chain_of_two_containers() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![
            SfcEntityBuilder::default()
                .name("two-vnf-chain")
                .sfc_type(SfcType::EwMemif)
                .elements(vec![
                    memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
                    memif_element("vswitch1", "vnf2", "port1").build().expect("element"),
                ])
                .build()
                .expect("sfc builds"),
        ],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("reconciles");

    let left = interface_at(&store, "vnf1", "port1").await;
    let right = interface_at(&store, "vnf2", "port1").await;
    let left_memif = left.memif.expect("memif payload");
    let right_memif = right.memif.expect("memif payload");
    assert_eq!(left_memif.id, 1);
    assert_eq!(right_memif.id, 1);
    assert!(left_memif.master);
    assert!(!right_memif.master);
    assert_eq!(left_memif.socket_filename, "/tmp/memif_vnf1.sock");
    assert_eq!(right_memif.socket_filename, "/tmp/memif_vnf1.sock");

    // only the two default east-west bridges exist
    let bridges: Vec<String> = keys_with_prefix(&store, &keys::switches_prefix())
        .await
        .into_iter()
        .filter(|key| keys::resource_kind(key) == Some("bridge-domain"))
        .collect();
    assert_eq!(
        bridges,
        vec![
            keys::bridge_domain_key("vswitch1", "BD_INTERNAL_EW_L2FIB_vswitch1"),
            keys::bridge_domain_key("vswitch1", "BD_INTERNAL_EW_vswitch1"),
        ]
    );

    // the pair's memif id is bound under (chain, left container, port)
    let binding = store
        .get(&keys::sfc_ids_key("two-vnf-chain", "vnf1", "port1"))
        .await
        .expect("store get")
        .expect("binding persisted");
    assert_eq!(binding.get("memif_id"), Some(&Value::from(1)));
}

fn mesh_config() -> ControllerConfig {
    let hosts: Vec<_> = (1..=3)
        .map(|n| {
            host(&format!("vswitch{n}"))
                .eth_if_name("GigabitEthernet13/0")
                .eth_ipv4(format!("192.86.0.{n}/24"))
                .vxlan_tunnel_ipv4(format!("10.0.20.{n}/24"))
                .create_vxlan_static_route(true)
                .build()
                .expect("host builds")
        })
        .collect();

    let mut sfcs = Vec::new();
    for (src, dst, vlan) in [
        (1, 2, 6000),
        (2, 1, 6000),
        (1, 3, 6001),
        (3, 1, 6001),
        (2, 3, 6002),
        (3, 2, 6002),
    ] {
        let mut dest_host = SfcElementBuilder::default();
        dest_host
            .container(format!("vswitch{dst}"))
            .port_label("vxlan")
            .element_type(SfcElementType::HostEntity)
            .vlan_id(vlan as u32);
        sfcs.push(
            SfcEntityBuilder::default()
                .name(format!("mesh-{src}-{dst}"))
                .sfc_type(SfcType::NsVxlan)
                .elements(vec![
                    dest_host.build().expect("element"),
                    memif_element(&format!("vswitch{src}"), &format!("vnf-{src}-{dst}"), "port1")
                        .build()
                        .expect("element"),
                ])
                .build()
                .expect("sfc builds"),
        );
    }

    ControllerConfig {
        host_entities: hosts,
        sfc_entities: sfcs,
        ..ControllerConfig::default()
    }
}

/// Scenario: vxlan tunnel mesh of three hosts, both directions per pair.
#[tokio::test]
#[traced_test]
async fn vxlan_mesh_of_three_hosts() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;
    engine.reconcile(&mesh_config()).await.expect("reconciles");

    for (src, dst, vlan) in [(1, 2, 6000), (2, 1, 6000), (1, 3, 6001), (2, 3, 6002)] {
        let (src, dst) = (format!("vswitch{src}"), format!("vswitch{dst}"));
        let tunnel = interface_at(&store, &src, &format!("IF_VXLAN_H2H_{src}_{dst}")).await;
        let vxlan = tunnel.vxlan.expect("vxlan payload");
        assert_eq!(vxlan.vni, vlan, "both directions of a pair share the vni");
        assert_eq!(vxlan.src_address, format!("10.0.20.{}", &src[7..]));

        let bridge = bridge_at(&store, &src, &format!("BD_H2H_{src}_{dst}")).await;
        assert_eq!(bridge.interfaces.len(), 2);
        assert!(bridge.contains_interface(&format!("IF_VXLAN_H2H_{src}_{dst}")));

        // one static route per direction
        let routes = keys_with_prefix(&store, &format!("{}/route/", keys::switch_prefix(&src))).await;
        assert_eq!(routes.len(), 2, "host {src} routes to its two peers");
    }
}

/// Scenario: idempotent re-apply emits zero store writes.
#[tokio::test]
#[traced_test]
async fn reapply_is_a_noop() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;
    let config = mesh_config();
    engine.reconcile(&config).await.expect("first cycle");
    let second = engine.reconcile(&config).await.expect("second cycle");
    assert!(second.is_noop(), "second cycle emitted writes: {second:?}");
    assert!(second.skipped_sfcs.is_empty());
}

/// Scenario: a fresh engine over the same store converges without
/// re-allocating anything.
#[tokio::test]
#[traced_test]
async fn restart_reuses_persisted_bindings() {
    let store = Arc::new(MemStore::new());
    let config = mesh_config();
    {
        let mut engine = engine_with(store.clone(), NullDriver).await;
        engine.reconcile(&config).await.expect("first cycle");
    }
    let mut restarted = engine_with(store.clone(), NullDriver).await;
    let summary = restarted.reconcile(&config).await.expect("cycle after restart");
    assert!(summary.is_noop(), "restart re-derived different state: {summary:?}");
}

/// Scenario: removing one chain deletes exactly its direction's wiring.
#[tokio::test]
#[traced_test]
async fn removed_chain_is_precisely_unwired() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;
    let mut config = mesh_config();
    engine.reconcile(&config).await.expect("first cycle");
    let before_keys = keys_with_prefix(&store, &keys::switches_prefix()).await;

    config.sfc_entities.retain(|sfc| sfc.name != "mesh-1-2");
    let summary = engine.reconcile(&config).await.expect("second cycle");

    let after_keys = keys_with_prefix(&store, &keys::switches_prefix()).await;
    let removed: Vec<&String> = before_keys
        .iter()
        .filter(|key| !after_keys.contains(*key))
        .collect();

    // the 1->2 direction's tunnel, bridge, route and the chain's memif
    // pair; nothing else
    let expected = [
        keys::bridge_domain_key("vswitch1", "BD_H2H_vswitch1_vswitch2"),
        keys::interface_key("vswitch1", "IF_MEMIF_VSWITCH_vnf-1-2_port1"),
        keys::interface_key("vswitch1", "IF_VXLAN_H2H_vswitch1_vswitch2"),
        keys::route_key("vswitch1", 0, "10.0.20.2/24", "192.86.0.2"),
        keys::interface_key("vnf-1-2", "port1"),
    ];
    assert_eq!(summary.deletes, expected.len());
    assert_eq!(removed.len(), expected.len());
    for key in &expected {
        assert!(removed.contains(&key), "{key} should have been deleted");
    }
    assert_eq!(summary.puts, 0);

    // the reverse direction survives, and so does its vni binding
    assert!(after_keys.contains(&keys::interface_key(
        "vswitch2",
        "IF_VXLAN_H2H_vswitch2_vswitch1"
    )));
    assert!(
        store
            .get(&keys::he2he_ids_key("vswitch1", "vswitch2"))
            .await
            .expect("store get")
            .is_some(),
        "removed edges keep their vni binding"
    );
}

/// Scenario: north-south vxlan chain to an external router.
#[tokio::test]
#[traced_test]
async fn ns_vxlan_chain_to_external_router() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), RecordingDriver::default()).await;

    let mut ee_element = SfcElementBuilder::default();
    ee_element
        .container("ras1")
        .port_label("vxlan")
        .element_type(SfcElementType::ExternalEntity);

    let config = ControllerConfig {
        host_entities: vec![
            host("vswitch1")
                .eth_if_name("GigabitEthernet13/0")
                .eth_ipv4("192.86.0.1/24")
                .vxlan_tunnel_ipv4("10.0.20.1/24")
                .create_vxlan_static_route(true)
                .build()
                .expect("host builds"),
        ],
        external_entities: vec![
            ExternalEntityBuilder::default()
                .name("ras1")
                .host_interface(EeHostInterface {
                    if_name: "GigabitEthernet8/0".to_owned(),
                    ipv4_addr: "8.42.0.1/24".to_owned(),
                })
                .host_vxlan(EeHostVxlan {
                    if_name: "GigabitEthernet8/0".to_owned(),
                    source_ipv4: "8.42.0.2/24".to_owned(),
                })
                .build()
                .expect("external entity builds"),
        ],
        sfc_entities: vec![
            SfcEntityBuilder::default()
                .name("uplink")
                .sfc_type(SfcType::NsVxlan)
                .elements(vec![
                    ee_element.build().expect("element"),
                    memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
                ])
                .build()
                .expect("sfc builds"),
        ],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("reconciles");

    // vni auto-allocated from the starting vlan id
    let tunnel = interface_at(&store, "vswitch1", "IF_VXLAN_H2E_vswitch1_ras1").await;
    let vxlan = tunnel.vxlan.expect("vxlan payload");
    assert_eq!(vxlan.vni, SystemParameters::DEFAULT_STARTING_VLAN_ID);
    assert_eq!(vxlan.src_address, "10.0.20.1");
    assert_eq!(vxlan.dst_address, "8.42.0.2");

    let bridge = bridge_at(&store, "vswitch1", "BD_H2E_vswitch1_ras1").await;
    assert!(bridge.contains_interface("IF_VXLAN_H2E_vswitch1_ras1"));
    assert!(bridge.contains_interface("IF_MEMIF_VSWITCH_vnf1_port1"));
    assert_eq!(bridge.interfaces.len(), 2);

    // host to router static route
    assert!(
        store
            .get(&keys::route_key("vswitch1", 0, "8.42.0.2/24", "8.42.0.1"))
            .await
            .expect("store get")
            .is_some()
    );
    // router to host static route, published under the entity's prefix
    assert!(
        store
            .get(&keys::route_key("ras1", 0, "10.0.20.1/24", "192.86.0.1"))
            .await
            .expect("store get")
            .is_some()
    );

    // exactly one driver call, carrying the allocated vni
    let wires = &engine.driver().wires;
    assert_eq!(wires.len(), 1);
    assert_eq!(wires[0].ee, "ras1");
    assert_eq!(wires[0].he, "vswitch1");
    assert_eq!(wires[0].vni, SystemParameters::DEFAULT_STARTING_VLAN_ID);
}

/// Scenario: auto IP assignment inside the chain prefix.
#[tokio::test]
#[traced_test]
async fn auto_ip_assignment_inside_prefix() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let chain = |elements| {
        SfcEntityBuilder::default()
            .name("addressed-chain")
            .sfc_type(SfcType::EwBd)
            .sfc_ipv4_prefix("10.0.1.0/24")
            .elements(elements)
            .build()
            .expect("sfc builds")
    };

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![chain(vec![
            memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
            memif_element("vswitch1", "vnf2", "port1").build().expect("element"),
            memif_element("vswitch1", "vnf3", "port1").build().expect("element"),
        ])],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("first cycle");

    for (vnf, expected) in [("vnf1", "10.0.1.1"), ("vnf2", "10.0.1.2"), ("vnf3", "10.0.1.3")] {
        let (ip, mac) = engine
            .sfc_interface_addresses(vnf, "port1")
            .unwrap_or_else(|| panic!("{vnf} got no addresses"));
        assert_eq!(ip, expected);
        assert!(mac.starts_with("02:"), "{vnf} mac {mac} is not generated");
    }
    let vnf1 = interface_at(&store, "vnf1", "port1").await;
    assert_eq!(vnf1.ip_addresses, vec!["10.0.1.1/24".to_owned()]);

    // second cycle: vnf1 pins 10.0.1.7, a new container joins
    let mut pinned = memif_element("vswitch1", "vnf1", "port1");
    pinned.ipv4_addr("10.0.1.7");
    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![chain(vec![
            pinned.build().expect("element"),
            memif_element("vswitch1", "vnf2", "port1").build().expect("element"),
            memif_element("vswitch1", "vnf3", "port1").build().expect("element"),
            memif_element("vswitch1", "vnf4", "port1").build().expect("element"),
        ])],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("second cycle");

    let (ip, _) = engine.sfc_interface_addresses("vnf1", "port1").expect("addressed");
    assert_eq!(ip, "10.0.1.7", "explicit address wins and gets /24 appended");
    let (ip, _) = engine.sfc_interface_addresses("vnf2", "port1").expect("addressed");
    assert_eq!(ip, "10.0.1.2", "persisted ip id is reused");
    let (ip, _) = engine.sfc_interface_addresses("vnf4", "port1").expect("addressed");
    assert_eq!(ip, "10.0.1.4", "next free id, not the pinned one");
}

/// Scenario: east-west memif repeat fan-out inserts synthetic hops.
#[tokio::test]
#[traced_test]
async fn ew_memif_repeat_fanout() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![
            SfcEntityBuilder::default()
                .name("stress-chain")
                .sfc_type(SfcType::EwMemif)
                .vnf_repeat_count(2u32)
                .elements(vec![
                    memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
                    memif_element("vswitch1", "vnf2", "port1").build().expect("element"),
                ])
                .build()
                .expect("sfc builds"),
        ],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("reconciles");

    // vnf1 -> vnfx-0 -> vnfx-1 -> vnf2, three pairs with their own ids
    for (container, id, master) in [
        ("vnf1", 1, true),
        ("vnfx-0", 2, true),
        ("vnfx-1", 3, true),
        ("vnf2", 3, false),
    ] {
        let iface = interface_at(&store, container, "port1").await;
        let memif = iface.memif.expect("memif payload");
        assert_eq!(memif.id, id, "{container} memif id");
        assert_eq!(memif.master, master, "{container} master flag");
    }
    // the middle hop carries both ends: master of its own pair, slave of
    // the previous one; the slave end is keyed by the same port label, so
    // the master record wins in the store. The bindings still show all
    // three pairs.
    for (container, id) in [("vnf1", 1), ("vnfx-0", 2), ("vnfx-1", 3)] {
        let binding = store
            .get(&keys::sfc_ids_key("stress-chain", container, "port1"))
            .await
            .expect("store get")
            .expect("binding persisted");
        assert_eq!(binding.get("memif_id"), Some(&Value::from(id)));
    }
}

/// A north-south NIC bridge chain: the NIC and every container join one
/// bridge, with the declared L2-FIB entries installed.
#[tokio::test]
#[traced_test]
async fn ns_nic_bridge_chain() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let mut nic = SfcElementBuilder::default();
    nic.container("vswitch1")
        .port_label("GigabitEthernet13/0")
        .element_type(SfcElementType::HostEntity)
        .l2fib_macs(vec!["02:02:02:02:02:01".to_owned()]);
    let mut vnf = memif_element("vswitch1", "vnf1", "port1");
    vnf.l2fib_macs(vec!["02:02:02:02:02:02".to_owned()]);

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![
            SfcEntityBuilder::default()
                .name("nic-bridge")
                .sfc_type(SfcType::NsNicBd)
                .elements(vec![nic.build().expect("element"), vnf.build().expect("element")])
                .build()
                .expect("sfc builds"),
        ],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("reconciles");

    let nic_if = interface_at(&store, "vswitch1", "GigabitEthernet13/0").await;
    assert!(nic_if.enabled);

    let bridge = bridge_at(&store, "vswitch1", "BD_INTERNAL_NS_GigabitEthernet13_0").await;
    assert!(bridge.contains_interface("GigabitEthernet13/0"));
    assert!(bridge.contains_interface("IF_MEMIF_VSWITCH_vnf1_port1"));
    // static bridge parameters by default
    assert!(!bridge.learn);
    assert!(bridge.forward);

    for (mac, outgoing) in [
        ("02:02:02:02:02:01", "GigabitEthernet13/0"),
        ("02:02:02:02:02:02", "IF_MEMIF_VSWITCH_vnf1_port1"),
    ] {
        let entry = store
            .get(&keys::l2fib_key(
                "vswitch1",
                "BD_INTERNAL_NS_GigabitEthernet13_0",
                mac,
            ))
            .await
            .expect("store get")
            .unwrap_or_else(|| panic!("l2fib entry for {mac} not published"));
        assert_eq!(
            entry.get("outgoing_interface"),
            Some(&Value::from(outgoing))
        );
    }
}

/// A north-south NIC VRF chain installs the element's routes and ARP
/// entries against its vswitch-end interface.
#[tokio::test]
#[traced_test]
async fn ns_nic_vrf_chain() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let mut nic = SfcElementBuilder::default();
    nic.container("vswitch1")
        .port_label("GigabitEthernet13/0")
        .element_type(SfcElementType::HostEntity);
    let mut vnf = memif_element("vswitch1", "vnf1", "port1");
    vnf.l3vrf_routes(vec![sfcctl_model::entities::L3VrfRoute {
        dst_ip_addr: "10.1.1.0/24".to_owned(),
        next_hop_addr: "10.1.1.1/24".to_owned(),
        ..sfcctl_model::entities::L3VrfRoute::default()
    }])
    .l3arp_entries(vec![sfcctl_model::entities::L3ArpEntry {
        ip_address: "10.1.1.1".to_owned(),
        phys_address: "02:00:00:00:00:99".to_owned(),
    }]);

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![
            SfcEntityBuilder::default()
                .name("nic-vrf")
                .sfc_type(SfcType::NsNicVrf)
                .elements(vec![nic.build().expect("element"), vnf.build().expect("element")])
                .build()
                .expect("sfc builds"),
        ],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("reconciles");

    // VRF joins ride a veth/af-packet pair even for memif elements
    let outgoing = "IF_AFPIF_VSWITCH_vnf1_port1";
    assert!(
        store
            .get(&keys::interface_key("vswitch1", outgoing))
            .await
            .expect("store get")
            .is_some()
    );

    let route = store
        .get(&keys::route_key("vswitch1", 0, "10.1.1.0/24", "10.1.1.1"))
        .await
        .expect("store get")
        .expect("vrf route published");
    assert_eq!(route.get("outgoing_interface"), Some(&Value::from(outgoing)));
    assert_eq!(
        route.get("weight"),
        Some(&Value::from(5)),
        "zero weight takes the system default"
    );
    assert_eq!(
        route.get("description"),
        Some(&Value::from("VRF_nic-vrf_vnf1_port1"))
    );

    let arp = store
        .get(&keys::arp_key("vswitch1", outgoing, "10.1.1.1"))
        .await
        .expect("store get")
        .expect("arp entry published");
    assert_eq!(arp.get("static_config"), Some(&Value::from(true)));
}

/// East-west cross-connect chains stitch consecutive elements into
/// symmetric cross-connect pairs.
#[tokio::test]
#[traced_test]
async fn ew_l2xconn_pairs_consecutive_elements() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![
            SfcEntityBuilder::default()
                .name("xconn-chain")
                .sfc_type(SfcType::EwL2Xconn)
                .elements(vec![
                    memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
                    memif_element("vswitch1", "vnf2", "port1").build().expect("element"),
                ])
                .build()
                .expect("sfc builds"),
        ],
        ..ControllerConfig::default()
    };
    engine.reconcile(&config).await.expect("reconciles");

    let forward = store
        .get(&keys::xconnect_key("vswitch1", "IF_MEMIF_VSWITCH_vnf2_port1"))
        .await
        .expect("store get")
        .expect("forward xconnect published");
    assert_eq!(
        forward.get("transmit_interface"),
        Some(&Value::from("IF_MEMIF_VSWITCH_vnf1_port1"))
    );
    let reverse = store
        .get(&keys::xconnect_key("vswitch1", "IF_MEMIF_VSWITCH_vnf1_port1"))
        .await
        .expect("store get")
        .expect("reverse xconnect published");
    assert_eq!(
        reverse.get("transmit_interface"),
        Some(&Value::from("IF_MEMIF_VSWITCH_vnf2_port1"))
    );
}

/// Configuration errors skip the offending chain but keep the cycle alive.
#[tokio::test]
#[traced_test]
async fn config_errors_skip_the_chain() {
    let store = Arc::new(MemStore::new());
    let mut engine = engine_with(store.clone(), NullDriver).await;

    let odd = SfcEntityBuilder::default()
        .name("odd-chain")
        .sfc_type(SfcType::EwMemif)
        .elements(vec![
            memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
        ])
        .build()
        .expect("sfc builds");

    let mut stray_ee = SfcElementBuilder::default();
    stray_ee
        .container("ras1")
        .element_type(SfcElementType::ExternalEntity);
    let ew_with_ee = SfcEntityBuilder::default()
        .name("ee-in-ew")
        .sfc_type(SfcType::EwBd)
        .elements(vec![stray_ee.build().expect("element")])
        .build()
        .expect("sfc builds");

    let dangling = SfcEntityBuilder::default()
        .name("dangling-host")
        .sfc_type(SfcType::NsVxlan)
        .elements(vec![{
            let mut el = SfcElementBuilder::default();
            el.container("no-such-host")
                .element_type(SfcElementType::HostEntity);
            el.build().expect("element")
        }])
        .build()
        .expect("sfc builds");

    let good = SfcEntityBuilder::default()
        .name("good-chain")
        .sfc_type(SfcType::EwMemif)
        .elements(vec![
            memif_element("vswitch1", "vnf1", "port1").build().expect("element"),
            memif_element("vswitch1", "vnf2", "port1").build().expect("element"),
        ])
        .build()
        .expect("sfc builds");

    let config = ControllerConfig {
        host_entities: vec![host("vswitch1").build().expect("host builds")],
        sfc_entities: vec![odd, ew_with_ee, dangling, good],
        ..ControllerConfig::default()
    };
    let summary = engine.reconcile(&config).await.expect("cycle completes");

    let skipped: Vec<&str> = summary
        .skipped_sfcs
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(skipped, vec!["odd-chain", "ee-in-ew", "dangling-host"]);
    assert!(matches!(
        summary.skipped_sfcs[0].1,
        ConfigError::OddMemifElementCount(_)
    ));
    assert!(matches!(
        summary.skipped_sfcs[1].1,
        ConfigError::ExternalEntityInEastWestChain(_)
    ));
    assert!(matches!(
        summary.skipped_sfcs[2].1,
        ConfigError::HostNotFound { .. }
    ));

    // the good chain still wired
    assert!(
        store
            .get(&keys::interface_key("vnf1", "port1"))
            .await
            .expect("store get")
            .is_some()
    );
}
