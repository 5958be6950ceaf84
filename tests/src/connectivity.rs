use indexmap::IndexSet;
use netgraph::{Instance, Net, NetworkConfig, Pin};
use test_log::test;

use crate::shared::{designs, load};

#[test]
fn flat_net_connects_driver_and_load() {
    let mut network = load(designs::unconnected_bufs(2).unwrap(), NetworkConfig::flat());
    let n1 = network.make_net("n1", Instance::Top).unwrap();
    let u1 = network.find_instance("u1").unwrap();
    let u2 = network.find_instance("u2").unwrap();
    let buf = network.cell(u1).unwrap();
    let z = network.libraries().find_port(buf, "Z").unwrap();
    let a = network.libraries().find_port(buf, "A").unwrap();

    let u1_z = network.connect(u1, z, n1).unwrap();
    let u2_a = network.connect(u2, a, n1).unwrap();

    let pins: IndexSet<Pin> = network.connected_pins(n1).into_iter().collect();
    assert_eq!(pins, IndexSet::from([u1_z, u2_a]));
    assert_eq!(network.drivers(n1), IndexSet::from([u1_z]));
    assert_eq!(network.net(u1_z), Some(n1));
    assert_eq!(network.pin_path_name(u2_a), "u2/A");
}

#[test]
fn module_net_reaches_leaf_below() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let top_net = network.find_net(Instance::Top, "top_net").unwrap();
    assert!(matches!(top_net, Net::Module(_)));
    let g1 = network.find_instance("sub/g1").unwrap();
    let g1_a = network.find_pin(g1, "A").unwrap();

    let pins = network.connected_pins(top_net);
    assert!(pins.contains(&g1_a));
}

#[test]
fn every_reachable_pin_is_visited_once() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let top_net = network.find_net(Instance::Top, "top_net").unwrap();
    let sub = network.find_instance("sub").unwrap();
    let g1 = network.find_instance("sub/g1").unwrap();

    let mut visits = Vec::new();
    network.visit_connected_pins(top_net, &mut |pin| visits.push(pin), &mut IndexSet::new());
    let unique: IndexSet<Pin> = visits.iter().copied().collect();
    assert_eq!(unique.len(), visits.len());

    let sub_in = network.find_pin(sub, "in").unwrap();
    let sub_in2 = network.find_pin(sub, "in2").unwrap();
    let expected = IndexSet::from([
        network.find_pin(Instance::Top, "a").unwrap(),
        sub_in,
        sub_in2,
        Pin::from(network.term(sub_in).unwrap()),
        Pin::from(network.term(sub_in2).unwrap()),
        network.find_pin(g1, "A").unwrap(),
    ]);
    assert_eq!(unique, expected);
}

#[test]
fn traversal_climbs_out_of_modules() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let sub = network.find_instance("sub").unwrap();
    let inner = network.find_net(sub, "in").unwrap();
    let a = network.find_pin(Instance::Top, "a").unwrap();

    assert!(network.connected_pins(inner).contains(&a));
    let nets = network.connected_nets(inner);
    assert!(nets.contains(&network.find_net(Instance::Top, "top_net").unwrap()));
    assert_eq!(nets.len(), 2);
}

#[test]
fn visited_nets_are_skipped() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let top_net = network.find_net(Instance::Top, "top_net").unwrap();
    let mut visited = IndexSet::from([top_net]);
    let mut count = 0;
    network.visit_connected_pins(top_net, &mut |_| count += 1, &mut visited);
    assert_eq!(count, 0);
}

#[test]
fn module_nets_take_precedence_over_flat_nets() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let block = network.db().block().unwrap();

    let mut checked = 0;
    for (_, inst) in block.insts() {
        for iterm in inst.iterms() {
            let t = block.iterm(iterm);
            if let (Some(_), Some(mod_net)) = (t.net(), t.mod_net()) {
                assert_eq!(network.net(Pin::Flat(iterm)), Some(Net::Module(mod_net)));
                checked += 1;
            }
        }
    }
    for (bterm, t) in block.bterms() {
        if let (Some(_), Some(mod_net)) = (t.net(), t.mod_net()) {
            assert_eq!(network.net(Pin::Boundary(bterm)), Some(Net::Module(mod_net)));
            checked += 1;
        }
    }
    assert_eq!(checked, 4);
}

#[test]
fn flat_view_ignores_module_nets() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::flat());
    let top_net = network.find_net(Instance::Top, "top_net").unwrap();
    assert!(matches!(top_net, Net::Flat(_)));
    let g1 = network.find_instance("sub/g1").unwrap();
    assert_eq!(network.parent(g1), Some(Instance::Top));

    let g1_a = network.find_pin(g1, "A").unwrap();
    assert_eq!(network.net(g1_a), Some(top_net));
    let pins: IndexSet<Pin> = network.connected_pins(top_net).into_iter().collect();
    assert_eq!(
        pins,
        IndexSet::from([network.find_pin(Instance::Top, "a").unwrap(), g1_a])
    );
}
