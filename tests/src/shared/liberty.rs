//! Timing libraries matching [`super::designs::stdcells`].

use netgraph::PortDirection;
use timinglib::{PgKind, TimingCell, TimingLibrary};

/// The timing view of the standard cells.
pub fn stdcells() -> TimingLibrary {
    let mut lib = TimingLibrary::new("stdcells_tt");
    lib.add_cell(
        TimingCell::new("NAND2")
            .with_port("A", PortDirection::Input)
            .with_port("B", PortDirection::Input)
            .with_port("Z", PortDirection::Output)
            .with_pg_pin("VDD", PgKind::Power)
            .with_pg_pin("VSS", PgKind::Ground),
    )
    .expect("duplicate cell");
    lib.add_cell(
        TimingCell::new("BUF")
            .with_port("A", PortDirection::Input)
            .with_port("Z", PortDirection::Output)
            .with_pg_pin("VDD", PgKind::Power)
            .with_pg_pin("VSS", PgKind::Ground),
    )
    .expect("duplicate cell");
    lib
}
