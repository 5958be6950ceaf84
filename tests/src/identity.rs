use indexmap::IndexSet;
use netgraph::{Instance, Net, Network, NetworkConfig, NetworkObject, ObjectTag, Pin, TOP_ID};
use test_log::test;

use crate::shared::{all_instances, designs, load};

/// Every instance, pin, and net of the loaded design.
fn all_objects(network: &Network) -> Vec<NetworkObject> {
    let block = network.db().block().unwrap();
    let mut objects: Vec<NetworkObject> = all_instances(network)
        .into_iter()
        .map(NetworkObject::Instance)
        .collect();
    for (_, inst) in block.insts() {
        objects.extend(inst.iterms().map(|id| NetworkObject::Pin(Pin::Flat(id))));
    }
    objects.extend(block.bterms().map(|(id, _)| NetworkObject::Pin(Pin::Boundary(id))));
    objects.extend(block.nets().map(|(id, _)| NetworkObject::Net(Net::Flat(id))));
    if network.has_hierarchy() {
        for (_, mod_inst) in block.mod_insts() {
            objects.extend(mod_inst.mod_iterms().map(|id| NetworkObject::Pin(Pin::Module(id))));
        }
        for (_, module) in block.modules() {
            objects.extend(
                module
                    .mod_bterms()
                    .map(|id| NetworkObject::Pin(Pin::ModuleBoundary(id))),
            );
        }
        objects.extend(block.mod_nets().map(|(id, _)| NetworkObject::Net(Net::Module(id))));
    }
    objects
}

#[test]
fn hierarchical_ids_are_unique_across_kinds() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let objects = all_objects(&network);
    let ids: IndexSet<_> = objects.iter().map(|&object| network.id(object)).collect();
    assert_eq!(ids.len(), objects.len());

    for &object in &objects {
        let id = network.id(object);
        match object {
            NetworkObject::Instance(Instance::Top) => assert_eq!(id, TOP_ID),
            NetworkObject::Instance(Instance::Flat(_)) => {
                assert_eq!(ObjectTag::from_id(id), Some(ObjectTag::Inst))
            }
            NetworkObject::Pin(Pin::ModuleBoundary(_)) => {
                assert_eq!(ObjectTag::from_id(id), Some(ObjectTag::ModBTerm))
            }
            NetworkObject::Net(Net::Module(_)) => {
                assert_eq!(ObjectTag::from_id(id), Some(ObjectTag::ModNet))
            }
            _ => assert!(ObjectTag::from_id(id).is_some()),
        }
    }
}

#[test]
fn flat_ids_are_unique_within_kinds() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::flat());
    let objects = all_objects(&network);
    let mut instances = IndexSet::new();
    let mut pins = IndexSet::new();
    let mut nets = IndexSet::new();
    for object in objects {
        let id = network.id(object);
        let fresh = match object {
            NetworkObject::Instance(_) => instances.insert(id),
            NetworkObject::Pin(_) => pins.insert(id),
            NetworkObject::Net(_) => nets.insert(id),
            NetworkObject::Term(_) => unreachable!(),
        };
        assert!(fresh, "duplicate id {id} for {object:?}");
    }
    assert_eq!(instances.len(), 2);
    assert_eq!(pins.len(), 6);
    assert_eq!(nets.len(), 2);
}

#[test]
fn ids_are_stable_across_queries() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let sub = network.find_instance("sub").unwrap();
    let pin = network.find_pin(sub, "in").unwrap();
    assert_eq!(network.id(pin), network.id(network.find_pin(sub, "in").unwrap()));
    let term = network.term(pin).unwrap();
    assert_eq!(network.id(term), network.id(Pin::from(term)));
}
