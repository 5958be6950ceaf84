//! A logical network view over a physical design database.
//!
//! A [`Network`] presents the flat netlist and the optional module hierarchy
//! of a [`physdb::Database`] as one graph of [`Instance`]s, [`Pin`]s,
//! [`Net`]s, and [`Term`]s, with logical [`Cell`]s and [`Port`]s mirroring
//! the physical masters, module definitions, and design boundary.
//!
//! Physical cells are cross-referenced by name against loaded
//! [`timinglib::TimingLibrary`]s. Mismatches are reported as
//! [`LibraryIssue`]s rather than errors.
//!
//! Every connectivity edit should go through the network so that the
//! per-net driver index stays consistent with the database.
//!
//! # Examples
//!
//! ```
//! use netgraph::{Instance, Network, NetworkConfig};
//! use physdb::{Database, IoType, SigType};
//!
//! let mut db = Database::new();
//! let lib = db.create_lib("cells").unwrap();
//! let buf = db.create_master(lib, "BUF").unwrap();
//! db.create_mterm(buf, "A", SigType::Signal, IoType::Input).unwrap();
//! db.create_mterm(buf, "Z", SigType::Signal, IoType::Output).unwrap();
//! db.create_block("top").unwrap();
//! db.create_inst(buf, "u1", None).unwrap();
//!
//! let mut network = Network::new(NetworkConfig::flat());
//! network.read_db(db);
//!
//! let u1 = network.find_child(Instance::Top, "u1").unwrap();
//! assert!(network.is_leaf(u1));
//! assert_eq!(network.parent(u1), Some(Instance::Top));
//! ```
#![warn(missing_docs)]

use std::cell::RefCell;

use diagnostics::IssueSet;
use indexmap::IndexMap;
use physdb::{Block, Database, NetId};
use timinglib::TimingLibrary;

pub mod builder;
pub mod bus;
pub mod config;
pub mod connectivity;
pub mod drivers;
pub mod edit;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod id;
pub mod library;
pub mod state;
pub mod validation;


pub use config::{ConfigError, NetworkConfig};
pub use connectivity::LogicValue;
pub use entity::{
    direction_from_types, types_from_direction, Instance, Net, NetworkObject, Pin, Term,
};
pub use error::FatalError;
pub use hierarchy::ChildIter;
pub use id::{ObjectId, ObjectTag, TAG_WIDTH, TOP_ID};
pub use library::{
    Cell, CellId, CellSource, Library, LibraryId, LibrarySource, LibraryStore, Port, PortId,
    PortShape, PortSource, TimingCellRef, TimingLibId, TimingPortRef,
};
pub use state::{LoadEvent, NetworkObserver, NetworkState, ObserverKey};
pub use timinglib::PortDirection;
pub use validation::LibraryIssue;

use drivers::DriverIndex;
use error::{fatal, FatalError as Fatal};
use state::Observers;

/// A logical network over a physical design database.
pub struct Network {
    config: NetworkConfig,
    db: Database,
    timing: Vec<TimingLibrary>,
    libs: LibraryStore,
    issues: IssueSet<LibraryIssue>,
    constants: IndexMap<NetId, LogicValue>,
    state: NetworkState,
    drivers: RefCell<DriverIndex>,
    observers: Observers,
}

impl Network {
    /// Creates an empty network with the given configuration.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            db: Database::new(),
            timing: Vec::new(),
            libs: LibraryStore::default(),
            issues: IssueSet::new(),
            constants: IndexMap::new(),
            state: NetworkState::default(),
            drivers: RefCell::new(DriverIndex::default()),
            observers: Observers::default(),
        }
    }

    /// The configuration of the network.
    #[inline]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Returns `true` if the module hierarchy is exposed.
    #[inline]
    pub fn has_hierarchy(&self) -> bool {
        self.config.hierarchy
    }

    /// The underlying database.
    #[inline]
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The underlying database, for direct mutation.
    ///
    /// Edits made through this handle bypass the driver index.
    /// Load the affected libraries or call [`Network::reload`] afterwards.
    #[inline]
    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// The logical libraries, cells, and ports.
    #[inline]
    pub fn libraries(&self) -> &LibraryStore {
        &self.libs
    }

    /// The loaded timing libraries, in load order.
    pub fn timing_libraries(&self) -> impl Iterator<Item = (TimingLibId, &TimingLibrary)> {
        self.timing
            .iter()
            .enumerate()
            .map(|(i, lib)| (TimingLibId(i), lib))
    }

    /// Gets a loaded timing library.
    pub fn timing_library(&self, id: TimingLibId) -> Option<&TimingLibrary> {
        self.timing.get(id.0)
    }

    /// Issues found while cross-referencing libraries.
    #[inline]
    pub fn issues(&self) -> &IssueSet<LibraryIssue> {
        &self.issues
    }

    /// The load state of the network.
    #[inline]
    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    /// The design block.
    ///
    /// # Panics
    ///
    /// Panics if no design is loaded.
    pub(crate) fn block(&self) -> &Block {
        match self.db.block() {
            Some(block) => block,
            None => fatal(Fatal::NoBlock),
        }
    }

    pub(crate) fn block_mut(&mut self) -> &mut Block {
        match self.db.block_mut() {
            Some(block) => block,
            None => fatal(Fatal::NoBlock),
        }
    }
}
