use indexmap::IndexSet;
use netgraph::{Instance, NetworkConfig};
use test_log::test;

use crate::shared::{all_instances, designs, load};

#[test]
fn children_know_their_parent() {
    let network = load(designs::three_level().unwrap(), NetworkConfig::hierarchical());
    let instances = all_instances(&network);
    assert_eq!(instances.len(), 6);
    for &instance in &instances {
        for child in network.child_iter(instance) {
            assert_eq!(network.parent(child), Some(instance));
        }
    }
}

#[test]
fn child_iteration_is_repeatable() {
    let network = load(designs::three_level().unwrap(), NetworkConfig::hierarchical());
    for instance in all_instances(&network) {
        let first: IndexSet<Instance> = network.child_iter(instance).collect();
        let second: IndexSet<Instance> = network.child_iter(instance).collect();
        assert_eq!(first, second);
    }
}

#[test]
fn paths_resolve_through_modules() {
    let network = load(designs::three_level().unwrap(), NetworkConfig::hierarchical());
    let mid = network.find_instance("mid").unwrap();
    let leaf = network.find_instance("mid/leaf").unwrap();
    let g2 = network.find_instance("mid/leaf/g2").unwrap();

    assert!(matches!(mid, Instance::Module(_)));
    assert_eq!(network.find_child(mid, "leaf"), Some(leaf));
    assert_eq!(network.find_child(leaf, "g2"), Some(g2));
    assert_eq!(network.find_child(mid, "g0"), network.find_instance("mid/g0"));
    assert_eq!(network.find_child(mid, "g2"), None);
    assert_eq!(network.find_instance("mid/nowhere"), None);

    assert_eq!(network.path_name(leaf), "mid/leaf");
    assert_eq!(network.name(leaf), "leaf");
    assert_eq!(network.parent(g2), Some(leaf));
    assert_eq!(network.parent(leaf), Some(mid));
    assert!(network.is_leaf(g2));
    assert!(!network.is_leaf(leaf));

    let u0 = network.find_child(Instance::Top, "u0").unwrap();
    assert_eq!(network.parent(u0), Some(Instance::Top));
}

#[test]
fn module_cells_are_built_per_instantiated_module() {
    let network = load(designs::three_level().unwrap(), NetworkConfig::hierarchical());
    let libs = network.libraries();
    let modules = libs.module_library().unwrap();
    let names: Vec<_> = libs
        .library(modules)
        .cells()
        .map(|cell| libs.cell(cell).name().to_string())
        .collect();
    assert_eq!(names, ["MID", "LEAF"]);

    let leaf = network.find_instance("mid/leaf").unwrap();
    assert_eq!(network.cell(leaf), libs.find_cell(modules, "LEAF"));
}

#[test]
fn flat_view_flattens_the_hierarchy() {
    let network = load(designs::three_level().unwrap(), NetworkConfig::flat());
    let children: Vec<_> = network
        .child_iter(Instance::Top)
        .map(|child| network.path_name(child))
        .collect();
    assert_eq!(children, ["u0", "mid/g0", "mid/leaf/g2"]);
    assert!(network.libraries().module_library().is_none());
    assert_eq!(network.find_instance("mid"), None);
}

#[test]
fn custom_divider() {
    let mut config = NetworkConfig::hierarchical();
    config.path_divider = '.';
    let network = load(designs::three_level().unwrap(), config);
    let leaf = network.find_instance("mid.leaf").unwrap();
    assert_eq!(network.path_name(leaf), "mid.leaf");
    assert_eq!(network.find_instance("mid/leaf"), None);
}
