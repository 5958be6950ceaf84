use diagnostics::{Diagnostic, Severity};
use netgraph::{CellSource, Network, NetworkConfig, PortDirection, PortSource};
use test_log::test;
use timinglib::{TimingCell, TimingLibrary};

use crate::shared::{designs, liberty, load};

#[test]
fn gate_ports_cross_reference_timing_ports() {
    let network = load(designs::empty_flat().unwrap(), NetworkConfig::flat());
    let libs = network.libraries();
    let nand2 = libs.find_any_cell("NAND2").unwrap();
    assert!(matches!(libs.cell(nand2).source(), CellSource::Physical(_)));
    assert_eq!(libs.cell(nand2).timing().unwrap().cell, "NAND2");

    for (name, direction) in [
        ("A", PortDirection::Input),
        ("B", PortDirection::Input),
        ("Z", PortDirection::Output),
    ] {
        let port = libs.port(libs.find_port(nand2, name).unwrap());
        assert_eq!(port.direction(), direction);
        assert!(matches!(port.source(), PortSource::Physical(_)));
        let timing = port.timing().unwrap();
        assert_eq!(timing.port, name);
        assert_eq!(network.timing_port(timing).unwrap().direction(), direction);
    }
    assert!(network.issues().is_empty());
}

#[test]
fn timing_loaded_after_design_fills_cross_references() {
    let mut network = Network::new(NetworkConfig::flat());
    network.read_db(designs::empty_flat().unwrap());
    let nand2 = network.libraries().find_any_cell("NAND2").unwrap();
    assert!(network.libraries().cell(nand2).timing().is_none());

    let typical = network.read_liberty(liberty::stdcells());
    let libs = network.libraries();
    assert_eq!(libs.cell(nand2).timing().unwrap().library, typical);
    let a = libs.find_port(nand2, "A").unwrap();
    assert!(libs.port(a).timing().is_some());
    assert!(network.issues().is_empty());
}

#[test]
fn mismatched_libraries_only_warn() {
    let mut lib = TimingLibrary::new("stale");
    lib.add_cell(
        TimingCell::new("NAND2")
            .with_port("A", PortDirection::Input)
            .with_port("B", PortDirection::Input)
            .with_port("ZN", PortDirection::Output),
    )
    .unwrap();
    let mut network = Network::new(NetworkConfig::flat());
    network.read_liberty(lib);
    network.read_db(designs::empty_flat().unwrap());

    assert_eq!(network.issues().num_warnings(), 2);
    let missing: Vec<_> = network
        .issues()
        .with_severity(Severity::Warning)
        .map(|issue| issue.to_string())
        .collect();
    assert!(missing[0].contains("pin `Z`"));
    assert!(missing[1].contains("pin `ZN`"));
    assert!(network.issues().iter().all(|issue| issue.help().is_some()));
    let nand2 = network.libraries().find_any_cell("NAND2").unwrap();
    let z = network.libraries().find_port(nand2, "Z").unwrap();
    assert!(network.libraries().port(z).timing().is_none());
    assert_eq!(network.libraries().port(z).direction(), PortDirection::Output);
}

#[test]
fn module_ports_mirror_boundary_terminals() {
    let network = load(designs::two_level().unwrap(), NetworkConfig::hierarchical());
    let libs = network.libraries();
    let sub = network.find_instance("sub").unwrap();
    let cell = network.cell(sub).unwrap();
    assert!(matches!(libs.cell(cell).source(), CellSource::Module(_)));

    let ports: Vec<_> = libs
        .cell(cell)
        .ports()
        .map(|port| {
            let port = libs.port(port);
            (port.name().to_string(), port.direction())
        })
        .collect();
    assert_eq!(
        ports,
        [
            ("in".to_string(), PortDirection::Input),
            ("in2".to_string(), PortDirection::Input),
            ("out".to_string(), PortDirection::Output),
        ]
    );

    let out = network.find_pin(sub, "out").unwrap();
    assert_eq!(network.direction(out), PortDirection::Output);
    assert_eq!(network.port(out), libs.find_port(cell, "out"));
}

#[test]
fn config_loads_from_toml() {
    let config = NetworkConfig::from_toml_str(
        r#"
        hierarchy = true
        module_library = "hier"
        "#,
    )
    .unwrap();
    let network = load(designs::two_level().unwrap(), config);
    let libs = network.libraries();
    assert_eq!(libs.library(libs.module_library().unwrap()).name(), "hier");
    assert!(libs.find_library("hier").is_some());
}
