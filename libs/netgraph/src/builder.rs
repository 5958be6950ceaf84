//! Building logical libraries, cells, and ports from the database.
//!
//! Physical cells are linked to the first loaded timing library with a cell
//! of the same name. Ports are linked by name. Ports missing on either side
//! are reported as warnings and otherwise ignored.

use arcstr::ArcStr;
use diagnostics::Severity;
use physdb::{Block, LibId, MasterId};
use timinglib::{TimingCell, TimingLibrary, TimingPort};
use tracing::{span, Level};

use crate::connectivity::LogicValue;
use crate::entity::direction_from_types;
use crate::error::{fatal, FatalError};
use crate::library::{
    CellId, CellSource, LibraryId, LibrarySource, PortId, PortSource, TimingCellRef, TimingLibId,
    TimingPortRef,
};
use crate::state::LoadEvent;
use crate::validation::{Cause, LibraryIssue};
use crate::Network;

/// Whether bus `port` of `cell` lists its highest index first.
///
/// Read from the block property `bus_msb_first <port> <cell>`.
/// Defaults to `true`, including when no block exists.
fn port_msb_first(block: Option<&Block>, port: &str, cell: &str) -> bool {
    block
        .and_then(|block| block.bool_property(&format!("bus_msb_first {port} {cell}")))
        .unwrap_or(true)
}

impl Network {
    /// Builds the logical library for a physical library already in the database.
    ///
    /// Any library previously built from `lib` is replaced.
    pub fn read_lef_after(&mut self, lib: LibId) -> LibraryId {
        let name = self.db.lib(lib).name().clone();
        let span = span!(Level::INFO, "building library", library = %name);
        let _guard = span.enter();

        if let Some(existing) = self.libs.library_of(lib) {
            self.libs.delete_library(existing);
        }
        let library = self
            .libs
            .make_library(name.clone(), LibrarySource::Physical(lib));
        let masters: Vec<_> = self.db.lib(lib).masters().collect();
        for master in masters {
            self.make_physical_cell(library, master);
        }
        tracing::info!(
            "built {} cells",
            self.libs.library(library).cells().count()
        );
        self.clear_drivers();
        self.notify(LoadEvent::Library { library, name });
        library
    }

    fn make_physical_cell(&mut self, library: LibraryId, master: MasterId) -> CellId {
        let m = self.db.master(master);
        let cell_name = m.name().clone();
        let cell = self
            .libs
            .make_cell(library, cell_name.clone(), CellSource::Physical(master));
        for mterm in m.mterms() {
            let t = self.db.mterm(mterm);
            self.libs.make_port(
                cell,
                t.name().clone(),
                PortSource::Physical(mterm),
                direction_from_types(t.sig_type(), t.io_type()),
            );
        }
        self.group_bus_ports(cell);

        for i in 0..self.timing.len() {
            let library = TimingLibId(i);
            if self.timing[i].find_cell(&cell_name).is_some() {
                self.libs
                    .record_timing_master(library, cell_name.clone(), master);
            }
        }
        for i in 0..self.timing.len() {
            if self.link_cell(cell, TimingLibId(i)) {
                break;
            }
        }
        cell
    }

    /// Links `cell` and its ports to the same-named cell of a timing library.
    ///
    /// Returns `false` if the timing library has no such cell.
    fn link_cell(&mut self, cell: CellId, library: TimingLibId) -> bool {
        let Some(tlib) = self.timing.get(library.0) else {
            return false;
        };
        let cell_name = self.libs.cell(cell).name().clone();
        let Some(tcell) = tlib.find_cell(&cell_name) else {
            return false;
        };
        let lib_name = tlib.name().clone();
        self.libs.set_cell_timing(
            cell,
            TimingCellRef {
                library,
                cell: cell_name.clone(),
            },
        );

        let groups: Vec<_> = self
            .libs
            .cell(cell)
            .ports()
            .filter(|&port| !self.libs.port(port).members().is_empty())
            .collect();
        for port in groups {
            let name = self.libs.port(port).name().clone();
            if tcell.find_port(&name).is_some() {
                self.libs.set_port_timing(
                    port,
                    TimingPortRef {
                        library,
                        cell: cell_name.clone(),
                        port: name,
                    },
                );
            }
        }

        for port in self.libs.port_bits(cell) {
            let p = self.libs.port(port);
            let name = p.name().clone();
            let is_power_ground = p.direction().is_power_ground();
            if tcell.find_port(&name).is_some() {
                self.libs.set_port_timing(
                    port,
                    TimingPortRef {
                        library,
                        cell: cell_name.clone(),
                        port: name,
                    },
                );
            } else if !is_power_ground && tcell.find_pg_pin(&name).is_none() {
                self.issues.add(LibraryIssue::new_and_log(
                    Cause::MissingTimingPort {
                        library: lib_name.clone(),
                        cell: cell_name.clone(),
                        port: name,
                    },
                    Severity::Warning,
                ));
            }
        }

        for tport in tcell.ports() {
            if tport.direction().is_power_ground()
                || self.libs.find_port(cell, tport.name()).is_some()
            {
                continue;
            }
            self.issues.add(LibraryIssue::new_and_log(
                Cause::MissingPhysicalPort {
                    library: lib_name.clone(),
                    cell: cell_name.clone(),
                    port: tport.name().clone(),
                },
                Severity::Warning,
            ));
        }
        true
    }

    pub(crate) fn record_timing_masters(&mut self, library: TimingLibId) {
        let Some(tlib) = self.timing.get(library.0) else {
            return;
        };
        let masters: Vec<_> = self
            .libs
            .libraries()
            .filter(|lib| matches!(lib.source(), LibrarySource::Physical(_)))
            .flat_map(|lib| lib.cells())
            .filter_map(|cell| match self.libs.cell(cell).source() {
                CellSource::Physical(master) => Some((self.libs.cell(cell).name().clone(), master)),
                CellSource::Module(_) | CellSource::Design => None,
            })
            .filter(|(name, _)| tlib.find_cell(name).is_some())
            .collect();
        for (name, master) in masters {
            self.libs.record_timing_master(library, name, master);
        }
    }

    /// Loads a timing library and links it to every unlinked cell.
    pub fn read_liberty(&mut self, library: TimingLibrary) -> TimingLibId {
        let id = TimingLibId(self.timing.len());
        self.timing.push(library);
        self.read_liberty_after(id);
        id
    }

    /// Links a loaded timing library to every cell not yet linked to one.
    pub fn read_liberty_after(&mut self, library: TimingLibId) {
        let Some(name) = self.timing.get(library.0).map(|lib| lib.name().clone()) else {
            tracing::warn!("no {library} is loaded");
            return;
        };
        let span = span!(Level::INFO, "linking timing library", library = %name);
        let _guard = span.enter();

        let unlinked: Vec<_> = self
            .libs
            .libraries()
            .flat_map(|lib| lib.cells())
            .filter(|&cell| self.libs.cell(cell).timing().is_none())
            .collect();
        let mut linked = 0;
        for cell in unlinked {
            if self.link_cell(cell, library) {
                linked += 1;
            }
        }
        self.record_timing_masters(library);
        if linked > 0 {
            self.clear_drivers();
        }
        tracing::info!("linked {linked} cells");
        self.notify(LoadEvent::TimingLibrary { library, name });
    }

    /// Builds the top cell, the module cells, and the load-time indices
    /// for the design block.
    ///
    /// # Panics
    ///
    /// Panics if the database has no block.
    pub fn read_def_after(&mut self) {
        let span = span!(Level::INFO, "building design view");
        let _guard = span.enter();

        self.make_top_cell();
        if let Some(library) = self.libs.module_library() {
            self.libs.delete_library(library);
        }
        if self.config.hierarchy {
            self.make_module_cells();
        }
        self.index_boundaries();
        self.find_constant_nets();
        self.clear_drivers();

        let generation = self.bump_generation();
        let name = self.block().name().clone();
        tracing::info!(%name, generation, "design loaded");
        self.notify(LoadEvent::Design { name, generation });
    }

    fn make_top_cell(&mut self) {
        if let Some(library) = self.libs.top_library() {
            self.libs.delete_library(library);
        }
        let Some(block) = self.db.block() else {
            fatal(FatalError::NoBlock)
        };
        let name = block.name().clone();
        let library = self.libs.make_library(name.clone(), LibrarySource::Design);
        let cell = self
            .libs
            .make_cell(library, name.clone(), CellSource::Design);
        for (_, bterm) in block.bterms() {
            self.libs.make_port(
                cell,
                bterm.name().clone(),
                PortSource::Design,
                direction_from_types(bterm.sig_type(), bterm.io_type()),
            );
        }
        self.group_bus_ports(cell);
    }

    fn make_module_cells(&mut self) {
        let Some(block) = self.db.block() else {
            fatal(FatalError::NoBlock)
        };
        let library = self
            .libs
            .make_library(self.config.module_library.clone(), LibrarySource::Modules);
        let mut module_cells = Vec::new();
        for (_, mod_inst) in block.mod_insts() {
            let module = mod_inst.master();
            if self.libs.cell_of_module(module).is_some() {
                continue;
            }
            let m = block.module(module);
            let cell = self
                .libs
                .make_cell(library, m.name().clone(), CellSource::Module(module));
            for mod_bterm in m.mod_bterms() {
                let b = block.mod_bterm(mod_bterm);
                self.libs.make_port(
                    cell,
                    b.name().clone(),
                    PortSource::ModuleBoundary(mod_bterm),
                    direction_from_types(b.sig_type(), b.io_type()),
                );
            }
            module_cells.push(cell);
        }
        for cell in module_cells {
            self.group_bus_ports(cell);
        }
    }

    /// Groups the bus bits of `cell`, reporting bits that repeat an index.
    fn group_bus_ports(&mut self, cell: CellId) {
        let cell_name = self.libs.cell(cell).name().clone();
        let block = self.db.block();
        let duplicates = self
            .libs
            .group_bus_ports(cell, |bus| port_msb_first(block, bus, &cell_name));
        for port in duplicates {
            self.issues.add_and_log(LibraryIssue::new(
                Cause::DuplicateBusBit {
                    cell: cell_name.clone(),
                    port: self.libs.port(port).name().clone(),
                },
                Severity::Warning,
            ));
        }
    }

    fn index_boundaries(&mut self) {
        self.libs.clear_boundary_index();
        let Some(block) = self.db.block() else {
            return;
        };
        for (module, m) in block.modules() {
            for mod_bterm in m.mod_bterms() {
                self.libs
                    .index_boundary(module, block.mod_bterm(mod_bterm).name().clone(), mod_bterm);
            }
        }
    }

    fn find_constant_nets(&mut self) {
        self.constants.clear();
        let Some(block) = self.db.block() else {
            return;
        };
        for (id, net) in block.nets() {
            let value = match net.sig_type() {
                physdb::SigType::Power => LogicValue::One,
                physdb::SigType::Ground => LogicValue::Zero,
                _ => continue,
            };
            self.constants.insert(id, value);
        }
    }

    /// Whether bus `port` of `cell` lists its highest index first.
    pub fn port_msb_first(&self, port: &str, cell: &str) -> bool {
        port_msb_first(self.db.block(), port, cell)
    }

    /// Groups existing top-level ports of `cell` into a bundle port.
    ///
    /// Returns `None` if `members` is empty or contains anything other than
    /// top-level ports of `cell`, or if the name is taken.
    pub fn make_bundle_port(
        &mut self,
        cell: CellId,
        name: impl Into<ArcStr>,
        members: Vec<PortId>,
    ) -> Option<PortId> {
        self.libs.make_bundle(cell, name.into(), members)
    }

    /// Finds the first loaded timing library with a cell named `name`.
    pub fn find_timing_cell(&self, name: &str) -> Option<TimingCellRef> {
        self.timing_libraries()
            .find(|(_, lib)| lib.find_cell(name).is_some())
            .map(|(library, _)| TimingCellRef {
                library,
                cell: ArcStr::from(name),
            })
    }

    /// Resolves a timing cell reference.
    pub fn timing_cell(&self, cell: &TimingCellRef) -> Option<&TimingCell> {
        self.timing.get(cell.library.0)?.find_cell(&cell.cell)
    }

    /// Resolves a timing port reference.
    pub fn timing_port(&self, port: &TimingPortRef) -> Option<&TimingPort> {
        self.timing
            .get(port.library.0)?
            .find_cell(&port.cell)?
            .find_port(&port.port)
    }

    /// Finds a port of a timing cell by name.
    pub fn find_timing_port(&self, cell: &TimingCellRef, name: &str) -> Option<TimingPortRef> {
        self.timing_cell(cell)?.find_port(name)?;
        Some(TimingPortRef {
            library: cell.library,
            cell: cell.cell.clone(),
            port: ArcStr::from(name),
        })
    }
}
