use test_log::test;

use crate::*;

#[test]
fn direction_predicates() {
    assert!(PortDirection::Input.is_any_input());
    assert!(PortDirection::Bidirect.is_any_input());
    assert!(!PortDirection::Tristate.is_any_input());
    assert!(PortDirection::Tristate.is_any_output());
    assert!(PortDirection::Bidirect.is_any_output());
    assert!(!PortDirection::Internal.is_any_output());
    assert!(PortDirection::Ground.is_power_ground());
    assert!(!PortDirection::Unknown.is_power_ground());
    assert_eq!(PortDirection::Bidirect.to_string(), "bidirect");
}

#[test]
fn ports_and_pg_pins_share_a_namespace() {
    let mut cell = TimingCell::new("BUF")
        .with_port("A", PortDirection::Input)
        .with_pg_pin("VDD", PgKind::Power);
    assert_eq!(
        cell.add_port("VDD", PortDirection::Input),
        Err(TimingLibError::DuplicatePort {
            cell: "BUF".into(),
            port: "VDD".into(),
        })
    );
    assert!(cell.find_port("VDD").is_none());
    assert_eq!(cell.find_pg_pin("VDD").unwrap().kind(), PgKind::Power);
    assert_eq!(
        cell.find_port("A").unwrap().direction(),
        PortDirection::Input
    );
}

#[test]
fn duplicate_cells_are_rejected() {
    let mut lib = TimingLibrary::new("fast");
    lib.add_cell(TimingCell::new("BUF")).unwrap();
    assert!(lib.add_cell(TimingCell::new("BUF")).is_err());
    assert_eq!(lib.len(), 1);
    assert!(lib.find_cell("BUF").is_some());
    assert!(lib.find_cell("INV").is_none());
}
