//! An in-memory physical design database.
//!
//! The database holds physical libraries of leaf cell masters and at most one
//! design [`Block`]. The block stores a flat netlist (instances, instance
//! terminals, block terminals, and nets) alongside an optional module
//! hierarchy (modules, module instances, module terminals, and module nets).
//!
//! Every object is addressed by a typed [`Id`] whose sequence number is scoped
//! to its kind. [`DbObject`] erases the kind into a runtime [`ObjectType`] tag
//! for consumers that classify handles dynamically.
#![warn(missing_docs)]

use arcstr::ArcStr;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

mod block;
mod id;
mod types;


pub use block::{BTerm, Block, ITerm, Inst, ModBTerm, ModITerm, ModInst, ModNet, Module, Net};
pub use id::{DbObjectKind, Id};
use id::Table;
pub use types::{DbObject, IoType, ObjectType, SigType};

macro_rules! object_kinds {
    ($($kind:ident => $alias:ident),* $(,)?) => {
        $(
            impl DbObjectKind for $kind {
                const TYPE: ObjectType = ObjectType::$kind;
            }

            #[doc = concat!("The ID of a [`", stringify!($kind), "`].")]
            pub type $alias = Id<$kind>;
        )*
    };
}

object_kinds! {
    Lib => LibId,
    Master => MasterId,
    MTerm => MTermId,
    Inst => InstId,
    ITerm => ITermId,
    BTerm => BTermId,
    Net => NetId,
    Module => ModuleId,
    ModInst => ModInstId,
    ModITerm => ModITermId,
    ModBTerm => ModBTermId,
    ModNet => ModNetId,
}

/// An error refusing a database mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DbError {
    /// The name is already taken within its scope.
    #[error("an object named `{name}` already exists in `{scope}`")]
    DuplicateName {
        /// The duplicated name.
        name: ArcStr,
        /// The name of the enclosing scope.
        scope: ArcStr,
    },
    /// The referenced object does not exist.
    #[error("{0} does not exist")]
    NotFound(DbObject),
    /// No design block has been created.
    #[error("no design block has been created")]
    NoBlock,
    /// A design block already exists.
    #[error("design block `{0}` already exists")]
    BlockExists(ArcStr),
    /// The module already has an instance.
    #[error("module `{0}` is already instantiated")]
    ModuleInstantiated(ArcStr),
    /// The top module cannot be instantiated.
    #[error("the top module cannot be instantiated")]
    TopModuleInstance,
    /// The replacement master does not have the same terminals.
    #[error("master `{new}` is not terminal-compatible with `{old}`")]
    IncompatibleMaster {
        /// The current master.
        old: ArcStr,
        /// The requested replacement.
        new: ArcStr,
    },
}

/// A result type returning [`DbError`]s.
pub type DbResult<T> = Result<T, DbError>;

/// A physical library.
#[derive(Debug, Clone)]
pub struct Lib {
    name: ArcStr,
    masters: IndexMap<ArcStr, MasterId>,
}

impl Lib {
    /// The name of the library.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The masters of the library, in creation order.
    pub fn masters(&self) -> impl Iterator<Item = MasterId> + '_ {
        self.masters.values().copied()
    }
}

/// A leaf cell master.
#[derive(Debug, Clone)]
pub struct Master {
    name: ArcStr,
    lib: LibId,
    mterms: IndexMap<ArcStr, MTermId>,
}

impl Master {
    /// The name of the master.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The library containing the master.
    #[inline]
    pub fn lib(&self) -> LibId {
        self.lib
    }

    /// The terminals of the master, in declaration order.
    pub fn mterms(&self) -> impl Iterator<Item = MTermId> + '_ {
        self.mterms.values().copied()
    }
}

/// A terminal on a master.
#[derive(Debug, Clone)]
pub struct MTerm {
    name: ArcStr,
    master: MasterId,
    sig: SigType,
    io: IoType,
}

impl MTerm {
    /// The name of the terminal.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The master owning the terminal.
    #[inline]
    pub fn master(&self) -> MasterId {
        self.master
    }

    /// The signal type of the terminal.
    #[inline]
    pub fn sig_type(&self) -> SigType {
        self.sig
    }

    /// The IO type of the terminal.
    #[inline]
    pub fn io_type(&self) -> IoType {
        self.io
    }
}

/// A physical design database.
#[derive(Debug, Clone, Default)]
pub struct Database {
    libs: Table<Lib>,
    lib_names: IndexMap<ArcStr, LibId>,
    masters: Table<Master>,
    mterms: Table<MTerm>,
    block: Option<Block>,
}

impl Database {
    /// Creates a new, empty database.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a physical library.
    pub fn create_lib(&mut self, name: impl Into<ArcStr>) -> DbResult<LibId> {
        let name = name.into();
        if self.lib_names.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: arcstr::literal!("database"),
            });
        }
        let id = self.libs.insert(Lib {
            name: name.clone(),
            masters: IndexMap::new(),
        });
        self.lib_names.insert(name, id);
        Ok(id)
    }

    /// Creates a master within a library.
    pub fn create_master(&mut self, lib: LibId, name: impl Into<ArcStr>) -> DbResult<MasterId> {
        let name = name.into();
        let l = self.libs.get(lib).ok_or(DbError::NotFound(lib.object()))?;
        if l.masters.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: l.name.clone(),
            });
        }
        let id = self.masters.insert(Master {
            name: name.clone(),
            lib,
            mterms: IndexMap::new(),
        });
        if let Some(l) = self.libs.get_mut(lib) {
            l.masters.insert(name, id);
        }
        Ok(id)
    }

    /// Creates a terminal on a master.
    pub fn create_mterm(
        &mut self,
        master: MasterId,
        name: impl Into<ArcStr>,
        sig: SigType,
        io: IoType,
    ) -> DbResult<MTermId> {
        let name = name.into();
        let m = self
            .masters
            .get(master)
            .ok_or(DbError::NotFound(master.object()))?;
        if m.mterms.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: m.name.clone(),
            });
        }
        let id = self.mterms.insert(MTerm {
            name: name.clone(),
            master,
            sig,
            io,
        });
        if let Some(m) = self.masters.get_mut(master) {
            m.mterms.insert(name, id);
        }
        Ok(id)
    }

    /// Gets the library with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no library has the given ID.
    pub fn lib(&self, id: LibId) -> &Lib {
        self.libs
            .get(id)
            .unwrap_or_else(|| panic!("{id} does not exist in database"))
    }

    /// Gets the master with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no master has the given ID.
    pub fn master(&self, id: MasterId) -> &Master {
        self.masters
            .get(id)
            .unwrap_or_else(|| panic!("{id} does not exist in database"))
    }

    /// Gets the master terminal with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no master terminal has the given ID.
    pub fn mterm(&self, id: MTermId) -> &MTerm {
        self.mterms
            .get(id)
            .unwrap_or_else(|| panic!("{id} does not exist in database"))
    }

    /// Iterates over all libraries in creation order.
    pub fn libs(&self) -> impl Iterator<Item = (LibId, &Lib)> {
        self.libs.iter()
    }

    /// Finds a library by name.
    pub fn find_lib(&self, name: &str) -> Option<LibId> {
        self.lib_names.get(name).copied()
    }

    /// Finds a master by name, searching libraries in creation order.
    pub fn find_master(&self, name: &str) -> Option<MasterId> {
        self.libs
            .iter()
            .find_map(|(_, lib)| lib.masters.get(name).copied())
    }

    /// Finds a terminal of `master` by name.
    pub fn find_mterm(&self, master: MasterId, name: &str) -> Option<MTermId> {
        self.master(master).mterms.get(name).copied()
    }

    /// Creates the design block, along with its top module.
    pub fn create_block(&mut self, name: impl Into<ArcStr>) -> DbResult<&mut Block> {
        if let Some(block) = &self.block {
            return Err(DbError::BlockExists(block.name().clone()));
        }
        let block = Block::new(name);
        debug!("created block `{}`", block.name());
        Ok(self.block.insert(block))
    }

    /// Destroys the design block, if any.
    pub fn destroy_block(&mut self) -> Option<Block> {
        self.block.take()
    }

    /// The design block, if one has been created.
    #[inline]
    pub fn block(&self) -> Option<&Block> {
        self.block.as_ref()
    }

    /// The design block, if one has been created.
    #[inline]
    pub fn block_mut(&mut self) -> Option<&mut Block> {
        self.block.as_mut()
    }

    /// Creates a flat instance of `master`, with one terminal per master terminal.
    ///
    /// The instance is placed in `module`, or in the top module if `None`.
    pub fn create_inst(
        &mut self,
        master: MasterId,
        name: impl Into<ArcStr>,
        module: Option<ModuleId>,
    ) -> DbResult<InstId> {
        let m = self
            .masters
            .get(master)
            .ok_or(DbError::NotFound(master.object()))?;
        let terms: Vec<_> = m
            .mterms
            .iter()
            .map(|(name, mterm)| (name.clone(), *mterm))
            .collect();
        let block = self.block.as_mut().ok_or(DbError::NoBlock)?;
        block.create_inst(name.into(), master, terms, module)
    }

    /// Replaces the master of a flat instance, keeping its connections.
    ///
    /// The new master must have exactly the same terminal names as the old one.
    pub fn swap_master(&mut self, inst: InstId, master: MasterId) -> DbResult<()> {
        let block = self.block.as_mut().ok_or(DbError::NoBlock)?;
        if !block.contains_inst(inst) {
            return Err(DbError::NotFound(inst.object()));
        }
        let new = self
            .masters
            .get(master)
            .ok_or(DbError::NotFound(master.object()))?;
        let old = self
            .masters
            .get(block.inst(inst).master())
            .ok_or(DbError::NotFound(block.inst(inst).master().object()))?;
        let compatible = old.mterms.len() == new.mterms.len()
            && old.mterms.keys().all(|name| new.mterms.contains_key(name));
        if !compatible {
            return Err(DbError::IncompatibleMaster {
                old: old.name.clone(),
                new: new.name.clone(),
            });
        }
        block.rebind_inst(inst, master, &new.mterms);
        debug!("swapped master of {inst} to `{}`", new.name);
        Ok(())
    }

    /// The signal and IO types of an instance terminal, taken from its master terminal.
    pub fn iterm_types(&self, iterm: ITermId) -> Option<(SigType, IoType)> {
        let block = self.block.as_ref()?;
        let mterm = self.mterms.get(block.iterm(iterm).mterm())?;
        Some((mterm.sig, mterm.io))
    }
}
