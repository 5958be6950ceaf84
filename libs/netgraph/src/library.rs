//! Logical libraries, cells, and ports.
//!
//! Logical objects mirror physical masters, module definitions, and the
//! design boundary. Associations with native objects are kept in side
//! tables owned by the [`LibraryStore`] rather than on the native objects.

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use indexmap::IndexMap;
use physdb::{LibId, MTermId, MasterId, ModBTermId, ModuleId};
use serde::{Deserialize, Serialize};
use timinglib::PortDirection;

/// The ID of a logical [`Library`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LibraryId(u64);

/// The ID of a logical [`Cell`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellId(u64);

/// The ID of a logical [`Port`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PortId(u64);

/// The index of a loaded timing library, in load order.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TimingLibId(pub(crate) usize);

impl LibraryId {
    /// The network-allocated identifier of the library.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl CellId {
    /// The network-allocated identifier of the cell.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl PortId {
    /// The network-allocated identifier of the port.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl TimingLibId {
    /// The position of the library in load order.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for LibraryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "library{}", self.0)
    }
}

impl Display for CellId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell{}", self.0)
    }
}

impl Display for PortId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "port{}", self.0)
    }
}

impl Display for TimingLibId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "timinglib{}", self.0)
    }
}

/// What a library was built from.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum LibrarySource {
    /// A physical library.
    Physical(LibId),
    /// The synthetic library of module cells.
    Modules,
    /// The library holding the design's top cell.
    Design,
}

/// What a cell mirrors.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum CellSource {
    /// A physical master.
    Physical(MasterId),
    /// A module definition.
    Module(ModuleId),
    /// The design block.
    Design,
}

/// What a port mirrors.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PortSource {
    /// A master terminal.
    Physical(MTermId),
    /// A module boundary terminal.
    ModuleBoundary(ModBTermId),
    /// A design boundary terminal, matched by name.
    Design,
    /// A bus or bundle grouping other ports.
    Group,
}

/// The shape of a port.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PortShape {
    /// A single bit.
    Scalar,
    /// An ordered group of bits.
    ///
    /// `members[0]` has index `from`, the last member has index `to`.
    /// Indices in between need not be contiguous; each member records its
    /// own index as a [`PortShape::BusBit`].
    Bus {
        /// The index of the first member.
        from: i64,
        /// The index of the last member.
        to: i64,
        /// The bit ports, in order.
        members: Vec<PortId>,
    },
    /// One bit of a bus.
    BusBit {
        /// The bus containing this bit.
        bus: PortId,
        /// The index of this bit.
        index: i64,
    },
    /// An unordered group of ports.
    Bundle {
        /// The grouped ports.
        members: Vec<PortId>,
    },
}

/// A reference to a cell of a loaded timing library.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimingCellRef {
    /// The timing library.
    pub library: TimingLibId,
    /// The cell name.
    pub cell: ArcStr,
}

/// A reference to a port of a loaded timing library.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimingPortRef {
    /// The timing library.
    pub library: TimingLibId,
    /// The cell name.
    pub cell: ArcStr,
    /// The port name.
    pub port: ArcStr,
}

/// A named, ordered collection of cells.
#[derive(Clone, Debug)]
pub struct Library {
    id: LibraryId,
    name: ArcStr,
    source: LibrarySource,
    cells: IndexMap<ArcStr, CellId>,
}

impl Library {
    /// The ID of the library.
    #[inline]
    pub fn id(&self) -> LibraryId {
        self.id
    }

    /// The name of the library.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// What the library was built from.
    #[inline]
    pub fn source(&self) -> LibrarySource {
        self.source
    }

    /// The cells of the library, in creation order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.values().copied()
    }
}

/// A logical cell.
#[derive(Clone, Debug)]
pub struct Cell {
    id: CellId,
    name: ArcStr,
    library: LibraryId,
    source: CellSource,
    ports: Vec<PortId>,
    port_names: IndexMap<ArcStr, PortId>,
    timing: Option<TimingCellRef>,
}

impl Cell {
    /// The ID of the cell.
    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The library containing the cell.
    #[inline]
    pub fn library(&self) -> LibraryId {
        self.library
    }

    /// What the cell mirrors.
    #[inline]
    pub fn source(&self) -> CellSource {
        self.source
    }

    /// Returns `true` if the cell mirrors a physical master.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.source, CellSource::Physical(_))
    }

    /// The top-level ports of the cell, in order.
    ///
    /// Bus ports appear in place of their bits.
    pub fn ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.iter().copied()
    }

    /// The linked timing cell, if any.
    #[inline]
    pub fn timing(&self) -> Option<&TimingCellRef> {
        self.timing.as_ref()
    }
}

/// A logical port.
#[derive(Clone, Debug)]
pub struct Port {
    id: PortId,
    name: ArcStr,
    cell: CellId,
    source: PortSource,
    direction: PortDirection,
    shape: PortShape,
    timing: Option<TimingPortRef>,
}

impl Port {
    /// The ID of the port.
    #[inline]
    pub fn id(&self) -> PortId {
        self.id
    }

    /// The name of the port.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The cell owning the port.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// What the port mirrors.
    #[inline]
    pub fn source(&self) -> PortSource {
        self.source
    }

    /// The direction of the port.
    #[inline]
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// The shape of the port.
    #[inline]
    pub fn shape(&self) -> &PortShape {
        &self.shape
    }

    /// Returns `true` for bus ports.
    #[inline]
    pub fn is_bus(&self) -> bool {
        matches!(self.shape, PortShape::Bus { .. })
    }

    /// The members of a bus or bundle, or an empty slice otherwise.
    pub fn members(&self) -> &[PortId] {
        match &self.shape {
            PortShape::Bus { members, .. } | PortShape::Bundle { members } => members,
            PortShape::Scalar | PortShape::BusBit { .. } => &[],
        }
    }

    /// The linked timing port, if any.
    #[inline]
    pub fn timing(&self) -> Option<&TimingPortRef> {
        self.timing.as_ref()
    }
}

/// Storage for logical libraries, cells, and ports, plus their native side tables.
#[derive(Clone, Debug, Default)]
pub struct LibraryStore {
    next_id: u64,
    libraries: IndexMap<LibraryId, Library>,
    cells: IndexMap<CellId, Cell>,
    ports: IndexMap<PortId, Port>,
    physical_libraries: IndexMap<LibId, LibraryId>,
    master_cells: IndexMap<MasterId, CellId>,
    module_cells: IndexMap<ModuleId, CellId>,
    mterm_ports: IndexMap<MTermId, PortId>,
    mod_bterm_ports: IndexMap<ModBTermId, PortId>,
    boundary_index: IndexMap<ModuleId, IndexMap<ArcStr, ModBTermId>>,
    timing_masters: IndexMap<(TimingLibId, ArcStr), MasterId>,
    module_library: Option<LibraryId>,
    top_library: Option<LibraryId>,
    top_cell: Option<CellId>,
}

impl LibraryStore {
    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ----- Lookup -----

    /// Gets the library with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no library has the given ID.
    pub fn library(&self, id: LibraryId) -> &Library {
        match self.libraries.get(&id) {
            Some(library) => library,
            None => {
                tracing::error!("no {id} in network");
                panic!("no {id} in network");
            }
        }
    }

    /// Gets the cell with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given ID.
    pub fn cell(&self, id: CellId) -> &Cell {
        match self.cells.get(&id) {
            Some(cell) => cell,
            None => {
                tracing::error!("no {id} in network");
                panic!("no {id} in network");
            }
        }
    }

    /// Gets the port with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no port has the given ID.
    pub fn port(&self, id: PortId) -> &Port {
        match self.ports.get(&id) {
            Some(port) => port,
            None => {
                tracing::error!("no {id} in network");
                panic!("no {id} in network");
            }
        }
    }

    /// Gets the port with the given ID, if it exists.
    pub fn try_port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    /// Iterates over all libraries in creation order.
    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    /// Finds the first library with the given name.
    pub fn find_library(&self, name: &str) -> Option<LibraryId> {
        self.libraries
            .values()
            .find(|library| library.name == name)
            .map(|library| library.id)
    }

    /// Finds a cell by name within a library.
    pub fn find_cell(&self, library: LibraryId, name: &str) -> Option<CellId> {
        self.libraries.get(&library)?.cells.get(name).copied()
    }

    /// Finds a cell by name, searching libraries in creation order.
    pub fn find_any_cell(&self, name: &str) -> Option<CellId> {
        self.libraries
            .values()
            .find_map(|library| library.cells.get(name).copied())
    }

    /// Finds a port of a cell by name.
    ///
    /// Bus ports and their individual bits are both found.
    pub fn find_port(&self, cell: CellId, name: &str) -> Option<PortId> {
        self.cells.get(&cell)?.port_names.get(name).copied()
    }

    /// The scalar and bit ports of a cell, expanding buses and bundles.
    pub fn port_bits(&self, cell: CellId) -> Vec<PortId> {
        let mut bits = Vec::new();
        let mut stack: Vec<PortId> = self.cell(cell).ports.iter().rev().copied().collect();
        while let Some(port) = stack.pop() {
            let members = self.port(port).members();
            if members.is_empty() {
                bits.push(port);
            } else {
                stack.extend(members.iter().rev());
            }
        }
        bits
    }

    /// The logical library mirroring a physical library.
    pub fn library_of(&self, lib: LibId) -> Option<LibraryId> {
        self.physical_libraries.get(&lib).copied()
    }

    /// The cell mirroring a physical master.
    pub fn cell_of_master(&self, master: MasterId) -> Option<CellId> {
        self.master_cells.get(&master).copied()
    }

    /// The cell mirroring a module definition.
    pub fn cell_of_module(&self, module: ModuleId) -> Option<CellId> {
        self.module_cells.get(&module).copied()
    }

    /// The port mirroring a master terminal.
    pub fn port_of_mterm(&self, mterm: MTermId) -> Option<PortId> {
        self.mterm_ports.get(&mterm).copied()
    }

    /// The port mirroring a module boundary terminal.
    pub fn port_of_mod_bterm(&self, mod_bterm: ModBTermId) -> Option<PortId> {
        self.mod_bterm_ports.get(&mod_bterm).copied()
    }

    /// The boundary terminal of `module` named `name`, as resolved at load time.
    pub fn boundary(&self, module: ModuleId, name: &str) -> Option<ModBTermId> {
        self.boundary_index.get(&module)?.get(name).copied()
    }

    /// The master corresponding to a timing library cell.
    pub fn timing_master(&self, library: TimingLibId, cell: &str) -> Option<MasterId> {
        self.timing_masters
            .get(&(library, ArcStr::from(cell)))
            .copied()
    }

    /// The synthetic library of module cells, if built.
    #[inline]
    pub fn module_library(&self) -> Option<LibraryId> {
        self.module_library
    }

    /// The library holding the top cell, if a design is loaded.
    #[inline]
    pub fn top_library(&self) -> Option<LibraryId> {
        self.top_library
    }

    /// The top cell, if a design is loaded.
    #[inline]
    pub fn top_cell(&self) -> Option<CellId> {
        self.top_cell
    }

    // ----- Construction -----

    pub(crate) fn make_library(&mut self, name: ArcStr, source: LibrarySource) -> LibraryId {
        let id = LibraryId(self.alloc());
        self.libraries.insert(
            id,
            Library {
                id,
                name,
                source,
                cells: IndexMap::new(),
            },
        );
        match source {
            LibrarySource::Physical(lib) => {
                self.physical_libraries.insert(lib, id);
            }
            LibrarySource::Modules => self.module_library = Some(id),
            LibrarySource::Design => self.top_library = Some(id),
        }
        id
    }

    pub(crate) fn make_cell(&mut self, library: LibraryId, name: ArcStr, source: CellSource) -> CellId {
        let id = CellId(self.alloc());
        self.cells.insert(
            id,
            Cell {
                id,
                name: name.clone(),
                library,
                source,
                ports: Vec::new(),
                port_names: IndexMap::new(),
                timing: None,
            },
        );
        if let Some(library) = self.libraries.get_mut(&library) {
            library.cells.insert(name, id);
        }
        match source {
            CellSource::Physical(master) => {
                self.master_cells.insert(master, id);
            }
            CellSource::Module(module) => {
                self.module_cells.insert(module, id);
            }
            CellSource::Design => self.top_cell = Some(id),
        }
        id
    }

    pub(crate) fn make_port(
        &mut self,
        cell: CellId,
        name: ArcStr,
        source: PortSource,
        direction: PortDirection,
    ) -> PortId {
        let id = PortId(self.alloc());
        self.ports.insert(
            id,
            Port {
                id,
                name: name.clone(),
                cell,
                source,
                direction,
                shape: PortShape::Scalar,
                timing: None,
            },
        );
        if let Some(cell) = self.cells.get_mut(&cell) {
            cell.ports.push(id);
            cell.port_names.insert(name, id);
        }
        match source {
            PortSource::Physical(mterm) => {
                self.mterm_ports.insert(mterm, id);
            }
            PortSource::ModuleBoundary(mod_bterm) => {
                self.mod_bterm_ports.insert(mod_bterm, id);
            }
            PortSource::Design | PortSource::Group => (),
        }
        id
    }

    /// Replaces `members` in the cell's top-level order with a new group port,
    /// placed where the first member was.
    pub(crate) fn make_group_port(
        &mut self,
        cell: CellId,
        name: ArcStr,
        direction: PortDirection,
        shape: PortShape,
    ) -> PortId {
        let id = PortId(self.alloc());
        let members = match &shape {
            PortShape::Bus { members, .. } | PortShape::Bundle { members } => members.clone(),
            PortShape::Scalar | PortShape::BusBit { .. } => Vec::new(),
        };
        self.ports.insert(
            id,
            Port {
                id,
                name: name.clone(),
                cell,
                source: PortSource::Group,
                direction,
                shape,
                timing: None,
            },
        );
        if let Some(cell) = self.cells.get_mut(&cell) {
            let position = cell
                .ports
                .iter()
                .position(|port| members.contains(port))
                .unwrap_or(cell.ports.len());
            cell.ports.retain(|port| !members.contains(port));
            cell.ports.insert(position, id);
            cell.port_names.insert(name, id);
        }
        id
    }

    pub(crate) fn set_port_shape(&mut self, port: PortId, shape: PortShape) {
        if let Some(port) = self.ports.get_mut(&port) {
            port.shape = shape;
        }
    }

    pub(crate) fn set_port_direction(&mut self, port: PortId, direction: PortDirection) {
        if let Some(port) = self.ports.get_mut(&port) {
            port.direction = direction;
        }
    }

    pub(crate) fn set_cell_timing(&mut self, cell: CellId, timing: TimingCellRef) {
        if let Some(cell) = self.cells.get_mut(&cell) {
            cell.timing = Some(timing);
        }
    }

    pub(crate) fn set_port_timing(&mut self, port: PortId, timing: TimingPortRef) {
        if let Some(port) = self.ports.get_mut(&port) {
            port.timing = Some(timing);
        }
    }

    pub(crate) fn record_timing_master(&mut self, library: TimingLibId, cell: ArcStr, master: MasterId) {
        self.timing_masters.insert((library, cell), master);
    }

    pub(crate) fn index_boundary(&mut self, module: ModuleId, name: ArcStr, mod_bterm: ModBTermId) {
        self.boundary_index
            .entry(module)
            .or_default()
            .insert(name, mod_bterm);
    }

    pub(crate) fn unindex_boundary(&mut self, mod_bterm: ModBTermId) {
        for ports in self.boundary_index.values_mut() {
            ports.retain(|_, id| *id != mod_bterm);
        }
        self.mod_bterm_ports.shift_remove(&mod_bterm);
    }

    pub(crate) fn clear_boundary_index(&mut self) {
        self.boundary_index.clear();
    }

    /// Deletes a library along with its cells, ports, and side table entries.
    pub(crate) fn delete_library(&mut self, id: LibraryId) {
        let Some(library) = self.libraries.shift_remove(&id) else {
            return;
        };
        for cell in library.cells.values() {
            let Some(cell) = self.cells.shift_remove(cell) else {
                continue;
            };
            for port in cell.port_names.values() {
                if let Some(port) = self.ports.shift_remove(port) {
                    match port.source {
                        PortSource::Physical(mterm) => {
                            self.mterm_ports.shift_remove(&mterm);
                        }
                        PortSource::ModuleBoundary(mod_bterm) => {
                            self.mod_bterm_ports.shift_remove(&mod_bterm);
                        }
                        PortSource::Design | PortSource::Group => (),
                    }
                }
            }
            match cell.source {
                CellSource::Physical(master) => {
                    self.master_cells.shift_remove(&master);
                    self.timing_masters.retain(|_, m| *m != master);
                }
                CellSource::Module(module) => {
                    self.module_cells.shift_remove(&module);
                }
                CellSource::Design => {
                    if self.top_cell == Some(cell.id) {
                        self.top_cell = None;
                    }
                }
            }
        }
        match library.source {
            LibrarySource::Physical(lib) => {
                self.physical_libraries.shift_remove(&lib);
            }
            LibrarySource::Modules => {
                if self.module_library == Some(id) {
                    self.module_library = None;
                }
            }
            LibrarySource::Design => {
                if self.top_library == Some(id) {
                    self.top_library = None;
                }
            }
        }
    }
}
