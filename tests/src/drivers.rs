use indexmap::IndexSet;
use netgraph::{Instance, Net, Network, NetworkConfig, Pin};
use test_log::test;

use crate::shared::{designs, load};

/// The driver set of `net` computed from scratch.
fn expected_drivers(network: &Network, net: Net) -> IndexSet<Pin> {
    network
        .connected_pins(net)
        .into_iter()
        .filter(|&pin| network.is_driver(pin))
        .collect()
}

fn assert_consistent(network: &Network) {
    for net in network.instance_nets(Instance::Top) {
        assert_eq!(
            network.drivers(net),
            expected_drivers(network, net),
            "stale drivers for {}",
            network.net_name(net)
        );
    }
}

fn pin(network: &Network, inst: &str, port: &str) -> Pin {
    let inst = network.find_instance(inst).unwrap();
    network.find_pin(inst, port).unwrap()
}

#[test]
fn driver_index_survives_edit_sequence() {
    let mut network = load(designs::unconnected_bufs(4).unwrap(), NetworkConfig::flat());
    let n1 = network.make_net("n1", Instance::Top).unwrap();
    let n2 = network.make_net("n2", Instance::Top).unwrap();
    let n3 = network.make_net("n3", Instance::Top).unwrap();
    for net in [n1, n2, n3] {
        assert!(network.drivers(net).is_empty());
    }

    network.connect_pin(pin(&network, "u1", "Z"), n1);
    assert_consistent(&network);
    network.connect_pin(pin(&network, "u2", "A"), n1);
    assert_consistent(&network);
    network.connect_pin(pin(&network, "u3", "Z"), n1);
    assert_consistent(&network);
    assert_eq!(network.drivers(n1).len(), 2);

    network.disconnect(pin(&network, "u1", "Z"));
    assert_consistent(&network);
    network.connect_pin(pin(&network, "u3", "Z"), n2);
    assert_consistent(&network);
    assert!(network.drivers(n1).is_empty());
    assert_eq!(network.drivers(n2), IndexSet::from([pin(&network, "u3", "Z")]));

    network.connect_pin(pin(&network, "u4", "Z"), n3);
    network.connect_pin(pin(&network, "u1", "A"), n3);
    assert_consistent(&network);
    network.delete_net(n3);
    assert_consistent(&network);
    assert_eq!(network.net(pin(&network, "u4", "Z")), None);
}

#[test]
fn top_level_inputs_drive() {
    let mut network = load(designs::unconnected_bufs(1).unwrap(), NetworkConfig::flat());
    let n1 = network.make_net("n1", Instance::Top).unwrap();
    assert!(network.drivers(n1).is_empty());

    let buf = network.libraries().find_any_cell("BUF").unwrap();
    let a = network.libraries().find_port(buf, "A").unwrap();
    let z = network.libraries().find_port(buf, "Z").unwrap();
    let input = network.connect(Instance::Top, a, n1).unwrap();
    let output = network.connect(Instance::Top, z, n1).unwrap();
    assert!(network.is_top_level_port(input));
    assert_eq!(network.drivers(n1), IndexSet::from([input]));
    assert!(!network.is_driver(output));
    assert_consistent(&network);
}

#[test]
fn deleted_net_entry_is_not_inherited() {
    let mut network = load(designs::unconnected_bufs(3).unwrap(), NetworkConfig::flat());
    let n1 = network.make_net("n1", Instance::Top).unwrap();
    network.connect_pin(pin(&network, "u1", "Z"), n1);
    assert_eq!(network.drivers(n1).len(), 1);

    network.delete_net(n1);
    let fresh = network.make_net("n1", Instance::Top).unwrap();
    assert_eq!(fresh, n1);
    assert!(network.drivers(fresh).is_empty());

    network.connect_pin(pin(&network, "u2", "A"), fresh);
    assert!(network.drivers(fresh).is_empty());
    let u3_z = pin(&network, "u3", "Z");
    network.connect_pin(u3_z, fresh);
    assert_eq!(network.drivers(fresh), IndexSet::from([u3_z]));
}

#[test]
fn drivers_cross_module_boundaries() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let g1_z = pin(&network, "sub/g1", "Z");
    let a = network.find_pin(Instance::Top, "a").unwrap();
    let y = network.find_net(Instance::Top, "y").unwrap();
    let top_net = network.find_net(Instance::Top, "top_net").unwrap();

    assert_eq!(network.drivers(y), IndexSet::from([g1_z]));
    assert_eq!(network.drivers(top_net), IndexSet::from([a]));
    let sub = network.find_instance("sub").unwrap();
    assert!(!network.is_driver(network.find_pin(sub, "out").unwrap()));
}

#[test]
fn hierarchical_edits_keep_drivers_consistent() {
    let mut network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let sub = network.find_instance("sub").unwrap();
    let y = network.find_net(Instance::Top, "y").unwrap();
    let top_net = network.find_net(Instance::Top, "top_net").unwrap();
    let sub_out = network.find_pin(sub, "out").unwrap();
    let g1_z = pin(&network, "sub/g1", "Z");
    assert_eq!(network.drivers(y).len(), 1);
    assert_eq!(network.drivers(top_net).len(), 1);

    network.disconnect(sub_out);
    assert!(network.drivers(y).is_empty());
    assert_consistent(&network);

    network.connect_pin(sub_out, top_net);
    assert_eq!(
        network.drivers(top_net),
        IndexSet::from([network.find_pin(Instance::Top, "a").unwrap(), g1_z])
    );
    assert_consistent(&network);

    network.disconnect(g1_z);
    assert_eq!(network.drivers(top_net).len(), 1);
    assert_consistent(&network);
}

#[test]
fn reload_forgets_cached_drivers() {
    let mut network = load(designs::unconnected_bufs(2).unwrap(), NetworkConfig::flat());
    let n1 = network.make_net("n1", Instance::Top).unwrap();
    network.connect_pin(pin(&network, "u1", "Z"), n1);
    assert_eq!(network.drivers(n1).len(), 1);

    let u1_z = pin(&network, "u1", "Z").as_flat().unwrap();
    network.db_mut().block_mut().unwrap().disconnect_iterm(u1_z);
    assert_eq!(network.drivers(n1).len(), 1);
    network.reload();
    assert!(!network.has_cached_drivers(n1));
    assert!(network.drivers(n1).is_empty());
}
