//! The design block: a flat netlist plus an optional module hierarchy.

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, error};

use crate::id::Table;
use crate::{
    BTermId, DbError, DbResult, ITermId, InstId, IoType, MTermId, MasterId, ModBTermId,
    ModITermId, ModInstId, ModNetId, ModuleId, NetId, ObjectType, SigType,
};

/// A flat (leaf) instance of a library master.
#[derive(Debug, Clone)]
pub struct Inst {
    name: ArcStr,
    master: MasterId,
    module: ModuleId,
    iterms: IndexMap<ArcStr, ITermId>,
}

impl Inst {
    /// The full name of the instance.
    ///
    /// Instances placed below the top module carry their hierarchical path.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The master this instance instantiates.
    #[inline]
    pub fn master(&self) -> MasterId {
        self.master
    }

    /// The module this instance is placed in.
    #[inline]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// The terminals of this instance, in master terminal order.
    pub fn iterms(&self) -> impl Iterator<Item = ITermId> + '_ {
        self.iterms.values().copied()
    }
}

/// A terminal of a flat instance.
#[derive(Debug, Clone)]
pub struct ITerm {
    inst: InstId,
    mterm: MTermId,
    name: ArcStr,
    net: Option<NetId>,
    mod_net: Option<ModNetId>,
}

impl ITerm {
    /// The instance owning this terminal.
    #[inline]
    pub fn inst(&self) -> InstId {
        self.inst
    }

    /// The master terminal this terminal instantiates.
    #[inline]
    pub fn mterm(&self) -> MTermId {
        self.mterm
    }

    /// The name of the master terminal.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The flat net connected to this terminal.
    #[inline]
    pub fn net(&self) -> Option<NetId> {
        self.net
    }

    /// The module net connected to this terminal.
    #[inline]
    pub fn mod_net(&self) -> Option<ModNetId> {
        self.mod_net
    }
}

/// A terminal on the block boundary.
#[derive(Debug, Clone)]
pub struct BTerm {
    name: ArcStr,
    net: Option<NetId>,
    mod_net: Option<ModNetId>,
    sig: SigType,
    io: IoType,
}

impl BTerm {
    /// The name of the terminal.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The flat net connected to this terminal.
    #[inline]
    pub fn net(&self) -> Option<NetId> {
        self.net
    }

    /// The module net connected to this terminal.
    #[inline]
    pub fn mod_net(&self) -> Option<ModNetId> {
        self.mod_net
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

/// A flat net.
#[derive(Debug, Clone)]
pub struct Net {
    name: ArcStr,
    sig: SigType,
    special: bool,
    iterms: IndexSet<ITermId>,
    bterms: IndexSet<BTermId>,
}

impl Net {
    /// The name of the net.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The signal type of the net.
    #[inline]
    pub fn sig_type(&self) -> SigType {
        self.sig
    }

    /// Whether the net is a special (pre-routed supply) net.
    #[inline]
    pub fn is_special(&self) -> bool {
        self.special
    }

    /// The instance terminals on this net.
    pub fn iterms(&self) -> impl Iterator<Item = ITermId> + '_ {
        self.iterms.iter().copied()
    }

    /// The block terminals on this net.
    pub fn bterms(&self) -> impl Iterator<Item = BTermId> + '_ {
        self.bterms.iter().copied()
    }
}

/// A module definition.
#[derive(Debug, Clone)]
pub struct Module {
    name: ArcStr,
    mod_inst: Option<ModInstId>,
    insts: IndexSet<InstId>,
    mod_insts: IndexMap<ArcStr, ModInstId>,
    mod_bterms: IndexMap<ArcStr, ModBTermId>,
    mod_nets: IndexMap<ArcStr, ModNetId>,
}

impl Module {
    /// The name of the module.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The unique instance of this module, if it has been instantiated.
    ///
    /// The top module is never instantiated.
    #[inline]
    pub fn mod_inst(&self) -> Option<ModInstId> {
        self.mod_inst
    }

    /// The flat instances placed directly in this module.
    pub fn insts(&self) -> impl Iterator<Item = InstId> + '_ {
        self.insts.iter().copied()
    }

    /// The module instances placed directly in this module.
    pub fn mod_insts(&self) -> impl Iterator<Item = ModInstId> + '_ {
        self.mod_insts.values().copied()
    }

    /// The boundary terminals of this module, in declaration order.
    pub fn mod_bterms(&self) -> impl Iterator<Item = ModBTermId> + '_ {
        self.mod_bterms.values().copied()
    }

    /// The nets scoped to this module.
    pub fn mod_nets(&self) -> impl Iterator<Item = ModNetId> + '_ {
        self.mod_nets.values().copied()
    }
}

/// An instance of a module.
#[derive(Debug, Clone)]
pub struct ModInst {
    name: ArcStr,
    parent: ModuleId,
    master: ModuleId,
    mod_iterms: IndexMap<ArcStr, ModITermId>,
}

impl ModInst {
    /// The local name of the instance.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The module containing this instance.
    #[inline]
    pub fn parent(&self) -> ModuleId {
        self.parent
    }

    /// The module this instance instantiates.
    #[inline]
    pub fn master(&self) -> ModuleId {
        self.master
    }

    /// The terminals of this instance.
    pub fn mod_iterms(&self) -> impl Iterator<Item = ModITermId> + '_ {
        self.mod_iterms.values().copied()
    }
}

/// A terminal on a module instance.
#[derive(Debug, Clone)]
pub struct ModITerm {
    name: ArcStr,
    mod_inst: ModInstId,
    mod_net: Option<ModNetId>,
}

impl ModITerm {
    /// The name of the terminal.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The module instance owning this terminal.
    #[inline]
    pub fn mod_inst(&self) -> ModInstId {
        self.mod_inst
    }

    /// The module net in the parent module connected to this terminal.
    #[inline]
    pub fn mod_net(&self) -> Option<ModNetId> {
        self.mod_net
    }
}

/// A terminal on the boundary of a module definition.
#[derive(Debug, Clone)]
pub struct ModBTerm {
    name: ArcStr,
    module: ModuleId,
    mod_net: Option<ModNetId>,
    sig: SigType,
    io: IoType,
}

impl ModBTerm {
    /// The name of the terminal.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The module owning this terminal.
    #[inline]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// The module net inside the module connected to this terminal.
    #[inline]
    pub fn mod_net(&self) -> Option<ModNetId> {
        self.mod_net
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

/// A net scoped to a module.
#[derive(Debug, Clone)]
pub struct ModNet {
    name: ArcStr,
    module: ModuleId,
    iterms: IndexSet<ITermId>,
    bterms: IndexSet<BTermId>,
    mod_iterms: IndexSet<ModITermId>,
    mod_bterms: IndexSet<ModBTermId>,
}

impl ModNet {
    /// The local name of the net.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The module containing this net.
    #[inline]
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// The flat instance terminals on this net.
    pub fn iterms(&self) -> impl Iterator<Item = ITermId> + '_ {
        self.iterms.iter().copied()
    }

    /// The block terminals on this net.
    pub fn bterms(&self) -> impl Iterator<Item = BTermId> + '_ {
        self.bterms.iter().copied()
    }

    /// The module instance terminals on this net.
    pub fn mod_iterms(&self) -> impl Iterator<Item = ModITermId> + '_ {
        self.mod_iterms.iter().copied()
    }

    /// The module boundary terminals on this net.
    pub fn mod_bterms(&self) -> impl Iterator<Item = ModBTermId> + '_ {
        self.mod_bterms.iter().copied()
    }
}

/// The design block.
///
/// Owns every instance, terminal, net, and module of the loaded design.
/// A top module named after the block is created along with it.
#[derive(Debug, Clone)]
pub struct Block {
    name: ArcStr,
    top_module: ModuleId,
    insts: Table<Inst>,
    inst_names: IndexMap<ArcStr, InstId>,
    iterms: Table<ITerm>,
    bterms: Table<BTerm>,
    bterm_names: IndexMap<ArcStr, BTermId>,
    nets: Table<Net>,
    net_names: IndexMap<ArcStr, NetId>,
    modules: Table<Module>,
    module_names: IndexMap<ArcStr, ModuleId>,
    mod_insts: Table<ModInst>,
    mod_iterms: Table<ModITerm>,
    mod_bterms: Table<ModBTerm>,
    mod_nets: Table<ModNet>,
    bool_props: IndexMap<ArcStr, bool>,
}

fn missing(ty: ObjectType, seq: u64) -> ! {
    error!("{}{} does not exist in block", ty.prefix(), seq);
    panic!("{}{} does not exist in block", ty.prefix(), seq);
}

impl Block {
    pub(crate) fn new(name: impl Into<ArcStr>) -> Self {
        let name = name.into();
        let mut modules = Table::default();
        let top_module = modules.insert(Module::new(name.clone()));
        let mut module_names = IndexMap::new();
        module_names.insert(name.clone(), top_module);
        Self {
            name,
            top_module,
            insts: Table::default(),
            inst_names: IndexMap::new(),
            iterms: Table::default(),
            bterms: Table::default(),
            bterm_names: IndexMap::new(),
            nets: Table::default(),
            net_names: IndexMap::new(),
            modules,
            module_names,
            mod_insts: Table::default(),
            mod_iterms: Table::default(),
            mod_bterms: Table::default(),
            mod_nets: Table::default(),
            bool_props: IndexMap::new(),
        }
    }

    /// The name of the block.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The top module of the block.
    #[inline]
    pub fn top_module(&self) -> ModuleId {
        self.top_module
    }

    /// Returns `true` if the block contains any module instances.
    pub fn has_hierarchy(&self) -> bool {
        self.mod_insts.len() > 0
    }

    // ----- Lookup -----

    /// Gets the flat instance with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no instance has the given ID.
    pub fn inst(&self, id: InstId) -> &Inst {
        self.insts
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::Inst, id.seq()))
    }

    /// Gets the instance terminal with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no instance terminal has the given ID.
    pub fn iterm(&self, id: ITermId) -> &ITerm {
        self.iterms
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::ITerm, id.seq()))
    }

    /// Gets the block terminal with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no block terminal has the given ID.
    pub fn bterm(&self, id: BTermId) -> &BTerm {
        self.bterms
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::BTerm, id.seq()))
    }

    /// Gets the net with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no net has the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        self.nets
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::Net, id.seq()))
    }

    /// Gets the module with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no module has the given ID.
    pub fn module(&self, id: ModuleId) -> &Module {
        self.modules
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::Module, id.seq()))
    }

    /// Gets the module instance with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no module instance has the given ID.
    pub fn mod_inst(&self, id: ModInstId) -> &ModInst {
        self.mod_insts
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::ModInst, id.seq()))
    }

    /// Gets the module instance terminal with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no module instance terminal has the given ID.
    pub fn mod_iterm(&self, id: ModITermId) -> &ModITerm {
        self.mod_iterms
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::ModITerm, id.seq()))
    }

    /// Gets the module boundary terminal with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no module boundary terminal has the given ID.
    pub fn mod_bterm(&self, id: ModBTermId) -> &ModBTerm {
        self.mod_bterms
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::ModBTerm, id.seq()))
    }

    /// Gets the module net with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no module net has the given ID.
    pub fn mod_net(&self, id: ModNetId) -> &ModNet {
        self.mod_nets
            .get(id)
            .unwrap_or_else(|| missing(ObjectType::ModNet, id.seq()))
    }

    /// Returns `true` if a flat instance with the given ID exists.
    pub fn contains_inst(&self, id: InstId) -> bool {
        self.insts.contains(id)
    }

    /// Returns `true` if a net with the given ID exists.
    pub fn contains_net(&self, id: NetId) -> bool {
        self.nets.contains(id)
    }

    /// Returns `true` if a module net with the given ID exists.
    pub fn contains_mod_net(&self, id: ModNetId) -> bool {
        self.mod_nets.contains(id)
    }

    /// Finds a flat instance by its full name.
    pub fn find_inst(&self, name: &str) -> Option<InstId> {
        self.inst_names.get(name).copied()
    }

    /// Finds a flat net by its full name.
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_names.get(name).copied()
    }

    /// Finds a block terminal by name.
    pub fn find_bterm(&self, name: &str) -> Option<BTermId> {
        self.bterm_names.get(name).copied()
    }

    /// Finds a module definition by name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.module_names.get(name).copied()
    }

    /// Finds a module instance by its local name within `parent`.
    pub fn find_mod_inst(&self, parent: ModuleId, name: &str) -> Option<ModInstId> {
        self.module(parent).mod_insts.get(name).copied()
    }

    /// Finds a boundary terminal of `module` by name.
    pub fn find_mod_bterm(&self, module: ModuleId, name: &str) -> Option<ModBTermId> {
        self.module(module).mod_bterms.get(name).copied()
    }

    /// Finds a module net by its local name within `module`.
    pub fn find_mod_net(&self, module: ModuleId, name: &str) -> Option<ModNetId> {
        self.module(module).mod_nets.get(name).copied()
    }

    /// Finds a terminal of a module instance by name.
    pub fn find_mod_iterm(&self, mod_inst: ModInstId, name: &str) -> Option<ModITermId> {
        self.mod_inst(mod_inst).mod_iterms.get(name).copied()
    }

    /// Finds the terminal of a flat instance by its master terminal name.
    pub fn find_iterm(&self, inst: InstId, name: &str) -> Option<ITermId> {
        self.inst(inst).iterms.get(name).copied()
    }

    /// Finds the terminal of a flat instance instantiating `mterm`.
    pub fn find_iterm_by_mterm(&self, inst: InstId, mterm: MTermId) -> Option<ITermId> {
        self.inst(inst)
            .iterms()
            .find(|&iterm| self.iterm(iterm).mterm == mterm)
    }

    /// The hierarchical path of a module instance, from the top module down.
    pub fn mod_inst_path(&self, id: ModInstId, divider: char) -> String {
        let mut names = vec![self.mod_inst(id).name.clone()];
        let mut module = self.mod_inst(id).parent;
        while let Some(parent) = self.module(module).mod_inst {
            names.push(self.mod_inst(parent).name.clone());
            module = self.mod_inst(parent).parent;
        }
        let mut path = String::new();
        for (i, name) in names.iter().rev().enumerate() {
            if i > 0 {
                path.push(divider);
            }
            path.push_str(name);
        }
        path
    }

    // ----- Iteration -----

    /// Iterates over all flat instances in creation order.
    pub fn insts(&self) -> impl Iterator<Item = (InstId, &Inst)> {
        self.insts.iter()
    }

    /// Iterates over all block terminals in creation order.
    pub fn bterms(&self) -> impl Iterator<Item = (BTermId, &BTerm)> {
        self.bterms.iter()
    }

    /// Iterates over all flat nets in creation order.
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter()
    }

    /// Iterates over all modules, the top module first.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter()
    }

    /// Iterates over all module instances in creation order.
    pub fn mod_insts(&self) -> impl Iterator<Item = (ModInstId, &ModInst)> {
        self.mod_insts.iter()
    }

    /// Iterates over all module nets in creation order.
    pub fn mod_nets(&self) -> impl Iterator<Item = (ModNetId, &ModNet)> {
        self.mod_nets.iter()
    }

    // ----- Properties -----

    /// Sets a named boolean property on the block.
    pub fn set_bool_property(&mut self, name: impl Into<ArcStr>, value: bool) {
        self.bool_props.insert(name.into(), value);
    }

    /// Gets a named boolean property of the block.
    pub fn bool_property(&self, name: &str) -> Option<bool> {
        self.bool_props.get(name).copied()
    }

    // ----- Creation -----

    pub(crate) fn create_inst(
        &mut self,
        name: ArcStr,
        master: MasterId,
        terms: impl IntoIterator<Item = (ArcStr, MTermId)>,
        module: Option<ModuleId>,
    ) -> DbResult<InstId> {
        if self.inst_names.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: self.name.clone(),
            });
        }
        let module = module.unwrap_or(self.top_module);
        if !self.modules.contains(module) {
            return Err(DbError::NotFound(module.object()));
        }
        let id = self.insts.insert(Inst {
            name: name.clone(),
            master,
            module,
            iterms: IndexMap::new(),
        });
        let mut iterms = IndexMap::new();
        for (term, mterm) in terms {
            let iterm = self.iterms.insert(ITerm {
                inst: id,
                mterm,
                name: term.clone(),
                net: None,
                mod_net: None,
            });
            iterms.insert(term, iterm);
        }
        if let Some(inst) = self.insts.get_mut(id) {
            inst.iterms = iterms;
        }
        self.inst_names.insert(name, id);
        if let Some(m) = self.modules.get_mut(module) {
            m.insts.insert(id);
        }
        debug!("created {id} in {module}");
        Ok(id)
    }

    /// Creates a flat net.
    pub fn create_net(&mut self, name: impl Into<ArcStr>) -> DbResult<NetId> {
        let name = name.into();
        if self.net_names.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: self.name.clone(),
            });
        }
        let id = self.nets.insert(Net {
            name: name.clone(),
            sig: SigType::Signal,
            special: false,
            iterms: IndexSet::new(),
            bterms: IndexSet::new(),
        });
        self.net_names.insert(name, id);
        Ok(id)
    }

    /// Creates a block terminal, optionally connected to a flat net.
    pub fn create_bterm(&mut self, name: impl Into<ArcStr>, net: Option<NetId>) -> DbResult<BTermId> {
        let name = name.into();
        if self.bterm_names.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: self.name.clone(),
            });
        }
        if let Some(net) = net {
            if !self.nets.contains(net) {
                return Err(DbError::NotFound(net.object()));
            }
        }
        let id = self.bterms.insert(BTerm {
            name: name.clone(),
            net: None,
            mod_net: None,
            sig: SigType::Signal,
            io: IoType::Input,
        });
        self.bterm_names.insert(name, id);
        if let Some(net) = net {
            self.connect_bterm(id, net);
        }
        Ok(id)
    }

    /// Creates a module definition.
    pub fn create_module(&mut self, name: impl Into<ArcStr>) -> DbResult<ModuleId> {
        let name = name.into();
        if self.module_names.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: self.name.clone(),
            });
        }
        let id = self.modules.insert(Module::new(name.clone()));
        self.module_names.insert(name, id);
        Ok(id)
    }

    /// Instantiates `master` within `parent`.
    ///
    /// Modules are uniquified: each module may be instantiated at most once,
    /// and the top module may not be instantiated at all.
    pub fn create_mod_inst(
        &mut self,
        parent: ModuleId,
        master: ModuleId,
        name: impl Into<ArcStr>,
    ) -> DbResult<ModInstId> {
        let name = name.into();
        if master == self.top_module {
            return Err(DbError::TopModuleInstance);
        }
        if !self.modules.contains(parent) {
            return Err(DbError::NotFound(parent.object()));
        }
        let master_module = self
            .modules
            .get(master)
            .ok_or(DbError::NotFound(master.object()))?;
        if master_module.mod_inst.is_some() {
            return Err(DbError::ModuleInstantiated(master_module.name.clone()));
        }
        if self.module(parent).mod_insts.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: self.module(parent).name.clone(),
            });
        }
        let id = self.mod_insts.insert(ModInst {
            name: name.clone(),
            parent,
            master,
            mod_iterms: IndexMap::new(),
        });
        if let Some(module) = self.modules.get_mut(master) {
            module.mod_inst = Some(id);
        }
        if let Some(module) = self.modules.get_mut(parent) {
            module.mod_insts.insert(name, id);
        }
        debug!("created {id} of {master} in {parent}");
        Ok(id)
    }

    /// Creates a terminal on a module instance.
    pub fn create_mod_iterm(
        &mut self,
        mod_inst: ModInstId,
        name: impl Into<ArcStr>,
    ) -> DbResult<ModITermId> {
        let name = name.into();
        let inst = self
            .mod_insts
            .get(mod_inst)
            .ok_or(DbError::NotFound(mod_inst.object()))?;
        if inst.mod_iterms.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: inst.name.clone(),
            });
        }
        let id = self.mod_iterms.insert(ModITerm {
            name: name.clone(),
            mod_inst,
            mod_net: None,
        });
        if let Some(inst) = self.mod_insts.get_mut(mod_inst) {
            inst.mod_iterms.insert(name, id);
        }
        Ok(id)
    }

    /// Creates a boundary terminal on a module definition.
    pub fn create_mod_bterm(
        &mut self,
        module: ModuleId,
        name: impl Into<ArcStr>,
    ) -> DbResult<ModBTermId> {
        let name = name.into();
        let m = self
            .modules
            .get(module)
            .ok_or(DbError::NotFound(module.object()))?;
        if m.mod_bterms.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: m.name.clone(),
            });
        }
        let id = self.mod_bterms.insert(ModBTerm {
            name: name.clone(),
            module,
            mod_net: None,
            sig: SigType::Signal,
            io: IoType::Input,
        });
        if let Some(m) = self.modules.get_mut(module) {
            m.mod_bterms.insert(name, id);
        }
        Ok(id)
    }

    /// Creates a net scoped to `module`.
    pub fn create_mod_net(&mut self, module: ModuleId, name: impl Into<ArcStr>) -> DbResult<ModNetId> {
        let name = name.into();
        let m = self
            .modules
            .get(module)
            .ok_or(DbError::NotFound(module.object()))?;
        if m.mod_nets.contains_key(&name) {
            return Err(DbError::DuplicateName {
                name,
                scope: m.name.clone(),
            });
        }
        let id = self.mod_nets.insert(ModNet {
            name: name.clone(),
            module,
            iterms: IndexSet::new(),
            bterms: IndexSet::new(),
            mod_iterms: IndexSet::new(),
            mod_bterms: IndexSet::new(),
        });
        if let Some(m) = self.modules.get_mut(module) {
            m.mod_nets.insert(name, id);
        }
        Ok(id)
    }

    // ----- Attributes -----

    /// Sets the signal type of a flat net.
    pub fn set_net_sig_type(&mut self, net: NetId, sig: SigType) {
        if let Some(net) = self.nets.get_mut(net) {
            net.sig = sig;
        }
    }

    /// Marks a flat net as special.
    pub fn set_net_special(&mut self, net: NetId, special: bool) {
        if let Some(net) = self.nets.get_mut(net) {
            net.special = special;
        }
    }

    /// Sets the signal and IO types of a block terminal.
    pub fn set_bterm_types(&mut self, bterm: BTermId, sig: SigType, io: IoType) {
        if let Some(bterm) = self.bterms.get_mut(bterm) {
            bterm.sig = sig;
            bterm.io = io;
        }
    }

    /// Sets the signal and IO types of a module boundary terminal.
    pub fn set_mod_bterm_types(&mut self, mod_bterm: ModBTermId, sig: SigType, io: IoType) {
        if let Some(mod_bterm) = self.mod_bterms.get_mut(mod_bterm) {
            mod_bterm.sig = sig;
            mod_bterm.io = io;
        }
    }

    pub(crate) fn rebind_inst(
        &mut self,
        inst: InstId,
        master: MasterId,
        mterms: &IndexMap<ArcStr, MTermId>,
    ) {
        let Some(i) = self.insts.get_mut(inst) else {
            return;
        };
        i.master = master;
        let iterms: Vec<_> = i.iterms.values().copied().collect();
        for iterm in iterms {
            if let Some(iterm) = self.iterms.get_mut(iterm) {
                if let Some(&mterm) = mterms.get(&iterm.name) {
                    iterm.mterm = mterm;
                }
            }
        }
    }

    // ----- Connection -----

    /// Connects an instance terminal to a flat net,
    /// replacing any previous flat net connection.
    pub fn connect_iterm(&mut self, iterm: ITermId, net: NetId) {
        self.disconnect_iterm_net(iterm);
        if let (Some(t), Some(n)) = (self.iterms.get_mut(iterm), self.nets.get_mut(net)) {
            t.net = Some(net);
            n.iterms.insert(iterm);
        }
    }

    /// Connects an instance terminal to a module net,
    /// replacing any previous module net connection.
    pub fn connect_iterm_mod_net(&mut self, iterm: ITermId, mod_net: ModNetId) {
        self.disconnect_iterm_mod_net(iterm);
        if let (Some(t), Some(n)) = (self.iterms.get_mut(iterm), self.mod_nets.get_mut(mod_net)) {
            t.mod_net = Some(mod_net);
            n.iterms.insert(iterm);
        }
    }

    /// Disconnects an instance terminal from both its flat and module nets.
    pub fn disconnect_iterm(&mut self, iterm: ITermId) {
        self.disconnect_iterm_net(iterm);
        self.disconnect_iterm_mod_net(iterm);
    }

    fn disconnect_iterm_net(&mut self, iterm: ITermId) {
        let Some(t) = self.iterms.get_mut(iterm) else {
            return;
        };
        if let Some(net) = t.net.take() {
            if let Some(net) = self.nets.get_mut(net) {
                net.iterms.shift_remove(&iterm);
            }
        }
    }

    fn disconnect_iterm_mod_net(&mut self, iterm: ITermId) {
        let Some(t) = self.iterms.get_mut(iterm) else {
            return;
        };
        if let Some(mod_net) = t.mod_net.take() {
            if let Some(mod_net) = self.mod_nets.get_mut(mod_net) {
                mod_net.iterms.shift_remove(&iterm);
            }
        }
    }

    /// Connects a block terminal to a flat net,
    /// replacing any previous flat net connection.
    pub fn connect_bterm(&mut self, bterm: BTermId, net: NetId) {
        self.disconnect_bterm_net(bterm);
        if let (Some(t), Some(n)) = (self.bterms.get_mut(bterm), self.nets.get_mut(net)) {
            t.net = Some(net);
            n.bterms.insert(bterm);
        }
    }

    /// Connects a block terminal to a module net of the top module,
    /// replacing any previous module net connection.
    pub fn connect_bterm_mod_net(&mut self, bterm: BTermId, mod_net: ModNetId) {
        self.disconnect_bterm_mod_net(bterm);
        if let (Some(t), Some(n)) = (self.bterms.get_mut(bterm), self.mod_nets.get_mut(mod_net)) {
            t.mod_net = Some(mod_net);
            n.bterms.insert(bterm);
        }
    }

    /// Disconnects a block terminal from both its flat and module nets.
    pub fn disconnect_bterm(&mut self, bterm: BTermId) {
        self.disconnect_bterm_net(bterm);
        self.disconnect_bterm_mod_net(bterm);
    }

    fn disconnect_bterm_net(&mut self, bterm: BTermId) {
        let Some(t) = self.bterms.get_mut(bterm) else {
            return;
        };
        if let Some(net) = t.net.take() {
            if let Some(net) = self.nets.get_mut(net) {
                net.bterms.shift_remove(&bterm);
            }
        }
    }

    fn disconnect_bterm_mod_net(&mut self, bterm: BTermId) {
        let Some(t) = self.bterms.get_mut(bterm) else {
            return;
        };
        if let Some(mod_net) = t.mod_net.take() {
            if let Some(mod_net) = self.mod_nets.get_mut(mod_net) {
                mod_net.bterms.shift_remove(&bterm);
            }
        }
    }

    /// Connects a module instance terminal to a module net of the parent module.
    pub fn connect_mod_iterm(&mut self, mod_iterm: ModITermId, mod_net: ModNetId) {
        self.disconnect_mod_iterm(mod_iterm);
        if let (Some(t), Some(n)) = (
            self.mod_iterms.get_mut(mod_iterm),
            self.mod_nets.get_mut(mod_net),
        ) {
            t.mod_net = Some(mod_net);
            n.mod_iterms.insert(mod_iterm);
        }
    }

    /// Disconnects a module instance terminal from its module net.
    pub fn disconnect_mod_iterm(&mut self, mod_iterm: ModITermId) {
        let Some(t) = self.mod_iterms.get_mut(mod_iterm) else {
            return;
        };
        if let Some(mod_net) = t.mod_net.take() {
            if let Some(mod_net) = self.mod_nets.get_mut(mod_net) {
                mod_net.mod_iterms.shift_remove(&mod_iterm);
            }
        }
    }

    /// Connects a module boundary terminal to a module net inside its module.
    pub fn connect_mod_bterm(&mut self, mod_bterm: ModBTermId, mod_net: ModNetId) {
        self.disconnect_mod_bterm(mod_bterm);
        if let (Some(t), Some(n)) = (
            self.mod_bterms.get_mut(mod_bterm),
            self.mod_nets.get_mut(mod_net),
        ) {
            t.mod_net = Some(mod_net);
            n.mod_bterms.insert(mod_bterm);
        }
    }

    /// Disconnects a module boundary terminal from its module net.
    pub fn disconnect_mod_bterm(&mut self, mod_bterm: ModBTermId) {
        let Some(t) = self.mod_bterms.get_mut(mod_bterm) else {
            return;
        };
        if let Some(mod_net) = t.mod_net.take() {
            if let Some(mod_net) = self.mod_nets.get_mut(mod_net) {
                mod_net.mod_bterms.shift_remove(&mod_bterm);
            }
        }
    }

    // ----- Destruction -----

    /// Destroys a flat instance and its terminals.
    pub fn destroy_inst(&mut self, id: InstId) -> DbResult<()> {
        let inst = self.insts.remove(id).ok_or(DbError::NotFound(id.object()))?;
        for iterm in inst.iterms() {
            self.disconnect_iterm(iterm);
            self.iterms.remove(iterm);
        }
        self.inst_names.shift_remove(&inst.name);
        if let Some(module) = self.modules.get_mut(inst.module) {
            module.insts.shift_remove(&id);
        }
        debug!("destroyed {id}");
        Ok(())
    }

    /// Destroys a flat net, disconnecting every terminal on it.
    pub fn destroy_net(&mut self, id: NetId) -> DbResult<()> {
        let net = self.nets.remove(id).ok_or(DbError::NotFound(id.object()))?;
        for iterm in net.iterms() {
            if let Some(t) = self.iterms.get_mut(iterm) {
                t.net = None;
            }
        }
        for bterm in net.bterms() {
            if let Some(t) = self.bterms.get_mut(bterm) {
                t.net = None;
            }
        }
        self.net_names.shift_remove(&net.name);
        debug!("destroyed {id}");
        Ok(())
    }

    /// Destroys a block terminal.
    pub fn destroy_bterm(&mut self, id: BTermId) -> DbResult<()> {
        if !self.bterms.contains(id) {
            return Err(DbError::NotFound(id.object()));
        }
        self.disconnect_bterm(id);
        if let Some(bterm) = self.bterms.remove(id) {
            self.bterm_names.shift_remove(&bterm.name);
        }
        Ok(())
    }

    /// Destroys a module instance and its terminals.
    ///
    /// The instantiated module definition is kept and may be instantiated again.
    pub fn destroy_mod_inst(&mut self, id: ModInstId) -> DbResult<()> {
        let inst = self
            .mod_insts
            .remove(id)
            .ok_or(DbError::NotFound(id.object()))?;
        for mod_iterm in inst.mod_iterms() {
            self.disconnect_mod_iterm(mod_iterm);
            self.mod_iterms.remove(mod_iterm);
        }
        if let Some(parent) = self.modules.get_mut(inst.parent) {
            parent.mod_insts.shift_remove(&inst.name);
        }
        if let Some(master) = self.modules.get_mut(inst.master) {
            master.mod_inst = None;
        }
        debug!("destroyed {id}");
        Ok(())
    }

    /// Destroys a module instance terminal.
    pub fn destroy_mod_iterm(&mut self, id: ModITermId) -> DbResult<()> {
        if !self.mod_iterms.contains(id) {
            return Err(DbError::NotFound(id.object()));
        }
        self.disconnect_mod_iterm(id);
        if let Some(t) = self.mod_iterms.remove(id) {
            if let Some(inst) = self.mod_insts.get_mut(t.mod_inst) {
                inst.mod_iterms.shift_remove(&t.name);
            }
        }
        Ok(())
    }

    /// Destroys a module boundary terminal.
    pub fn destroy_mod_bterm(&mut self, id: ModBTermId) -> DbResult<()> {
        if !self.mod_bterms.contains(id) {
            return Err(DbError::NotFound(id.object()));
        }
        self.disconnect_mod_bterm(id);
        if let Some(t) = self.mod_bterms.remove(id) {
            if let Some(module) = self.modules.get_mut(t.module) {
                module.mod_bterms.shift_remove(&t.name);
            }
        }
        Ok(())
    }

    /// Destroys a module net, disconnecting every terminal on it.
    pub fn destroy_mod_net(&mut self, id: ModNetId) -> DbResult<()> {
        let net = self
            .mod_nets
            .remove(id)
            .ok_or(DbError::NotFound(id.object()))?;
        for iterm in net.iterms() {
            if let Some(t) = self.iterms.get_mut(iterm) {
                t.mod_net = None;
            }
        }
        for bterm in net.bterms() {
            if let Some(t) = self.bterms.get_mut(bterm) {
                t.mod_net = None;
            }
        }
        for mod_iterm in net.mod_iterms() {
            if let Some(t) = self.mod_iterms.get_mut(mod_iterm) {
                t.mod_net = None;
            }
        }
        for mod_bterm in net.mod_bterms() {
            if let Some(t) = self.mod_bterms.get_mut(mod_bterm) {
                t.mod_net = None;
            }
        }
        if let Some(module) = self.modules.get_mut(net.module) {
            module.mod_nets.shift_remove(&net.name);
        }
        debug!("destroyed {id}");
        Ok(())
    }
}

impl Module {
    fn new(name: ArcStr) -> Self {
        Self {
            name,
            mod_inst: None,
            insts: IndexSet::new(),
            mod_insts: IndexMap::new(),
            mod_bterms: IndexMap::new(),
            mod_nets: IndexMap::new(),
        }
    }
}
