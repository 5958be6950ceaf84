//! Hierarchy and scope navigation.
//!
//! Without hierarchy, every flat instance is a direct child of
//! [`Instance::Top`]. With hierarchy, children are the module instances
//! and flat instances placed in the instance's module.

use arcstr::ArcStr;
use physdb::{Block, IoType, ModuleId, SigType};
use regex::Regex;
use timinglib::PortDirection;

use crate::entity::{direction_from_types, Instance, Net, Pin, Term};
use crate::error::{fatal, FatalError};
use crate::library::{CellId, PortId};
use crate::Network;

/// A lazy iterator over the direct children of an instance.
pub struct ChildIter<'a> {
    inner: Box<dyn Iterator<Item = Instance> + 'a>,
}

impl<'a> ChildIter<'a> {
    fn new(inner: impl Iterator<Item = Instance> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for ChildIter<'_> {
    type Item = Instance;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

fn module_children(block: &Block, module: ModuleId) -> ChildIter<'_> {
    let m = block.module(module);
    ChildIter::new(
        m.mod_insts()
            .map(Instance::Module)
            .chain(m.insts().map(Instance::Flat)),
    )
}

/// The instance owning the inside of `module`.
fn module_instance(block: &Block, module: ModuleId) -> Instance {
    match block.module(module).mod_inst() {
        Some(mod_inst) => Instance::Module(mod_inst),
        None => Instance::Top,
    }
}

/// Converts a `*`/`?` wildcard pattern into an anchored regex.
fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{escaped}$")).ok()
}

impl Network {
    fn require_hierarchy(&self, instance: Instance) {
        if !self.config.hierarchy {
            if let Some(object) = instance.object() {
                fatal(FatalError::HierarchyDisabled(object));
            }
        }
    }

    /// The top instance.
    #[inline]
    pub fn top_instance(&self) -> Instance {
        Instance::Top
    }

    /// Iterates over the direct children of `instance`.
    pub fn child_iter(&self, instance: Instance) -> ChildIter<'_> {
        let Some(block) = self.db.block() else {
            return ChildIter::empty();
        };
        match instance {
            Instance::Top if self.config.hierarchy => module_children(block, block.top_module()),
            Instance::Top => ChildIter::new(block.insts().map(|(id, _)| Instance::Flat(id))),
            Instance::Flat(_) => ChildIter::empty(),
            Instance::Module(id) => {
                self.require_hierarchy(instance);
                module_children(block, block.mod_inst(id).master())
            }
        }
    }

    /// The parent of `instance`, or `None` for the top instance.
    pub fn parent(&self, instance: Instance) -> Option<Instance> {
        match instance {
            Instance::Top => None,
            Instance::Flat(_) if !self.config.hierarchy => Some(Instance::Top),
            Instance::Flat(id) => {
                let block = self.block();
                Some(module_instance(block, block.inst(id).module()))
            }
            Instance::Module(id) => {
                let block = self.block();
                Some(module_instance(block, block.mod_inst(id).parent()))
            }
        }
    }

    /// Returns `true` if the instance is a leaf instance of a physical cell.
    #[inline]
    pub fn is_leaf(&self, instance: Instance) -> bool {
        matches!(instance, Instance::Flat(_))
    }

    /// The cell of `instance`, if it has been built.
    pub fn cell(&self, instance: Instance) -> Option<CellId> {
        match instance {
            Instance::Top => self.libs.top_cell(),
            Instance::Flat(id) => self.libs.cell_of_master(self.block().inst(id).master()),
            Instance::Module(id) => self.libs.cell_of_module(self.block().mod_inst(id).master()),
        }
    }

    /// The local name of `instance`.
    ///
    /// The top instance is named after the design.
    pub fn name(&self, instance: Instance) -> ArcStr {
        let block = self.block();
        match instance {
            Instance::Top => block.name().clone(),
            Instance::Flat(id) => block.inst(id).name().clone(),
            Instance::Module(id) => block.mod_inst(id).name().clone(),
        }
    }

    /// The hierarchical path of `instance` from the top.
    ///
    /// The top instance has an empty path.
    pub fn path_name(&self, instance: Instance) -> String {
        match instance {
            Instance::Top => String::new(),
            Instance::Flat(id) => self.block().inst(id).name().to_string(),
            Instance::Module(id) => self.block().mod_inst_path(id, self.config.path_divider),
        }
    }

    /// Finds a direct child of `parent` by local name.
    ///
    /// Below the top, a module sub-instance is tried first, then a leaf
    /// named `<path><divider><name>`. The leaf must belong to the module of
    /// `parent`, so every child found here has `parent` as its parent.
    pub fn find_child(&self, parent: Instance, name: &str) -> Option<Instance> {
        let block = self.db.block()?;
        match parent {
            Instance::Top => {
                if self.config.hierarchy {
                    if let Some(id) = block.find_mod_inst(block.top_module(), name) {
                        return Some(Instance::Module(id));
                    }
                }
                block.find_inst(name).map(Instance::Flat)
            }
            Instance::Flat(_) => None,
            Instance::Module(id) => {
                self.require_hierarchy(parent);
                let master = block.mod_inst(id).master();
                if let Some(child) = block.find_mod_inst(master, name) {
                    return Some(Instance::Module(child));
                }
                let divider = self.config.path_divider;
                let flat_name = format!("{}{divider}{name}", block.mod_inst_path(id, divider));
                block
                    .find_inst(&flat_name)
                    .filter(|&inst| block.inst(inst).module() == master)
                    .map(Instance::Flat)
            }
        }
    }

    /// Finds an instance by hierarchical path.
    pub fn find_instance(&self, path: &str) -> Option<Instance> {
        let block = self.db.block()?;
        if let Some(inst) = block.find_inst(path) {
            return Some(Instance::Flat(inst));
        }
        if !self.config.hierarchy {
            return None;
        }
        let mut module = block.top_module();
        let mut found = None;
        for segment in path.split(self.config.path_divider) {
            let mod_inst = block.find_mod_inst(module, segment)?;
            module = block.mod_inst(mod_inst).master();
            found = Some(Instance::Module(mod_inst));
        }
        found
    }

    /// Finds a pin of `instance` by port name.
    pub fn find_pin(&self, instance: Instance, port: &str) -> Option<Pin> {
        let block = self.db.block()?;
        match instance {
            Instance::Top => block.find_bterm(port).map(Pin::Boundary),
            Instance::Flat(id) => block.find_iterm(id, port).map(Pin::Flat),
            Instance::Module(id) => block.find_mod_iterm(id, port).map(Pin::Module),
        }
    }

    /// Finds the pin of `instance` for a logical port.
    pub fn find_pin_by_port(&self, instance: Instance, port: PortId) -> Option<Pin> {
        let name = self.libs.try_port(port)?.name().clone();
        self.find_pin(instance, &name)
    }

    /// Finds a net in the scope of `instance` by local name.
    ///
    /// With hierarchy, module nets shadow flat nets of the same name.
    pub fn find_net(&self, instance: Instance, name: &str) -> Option<Net> {
        let block = self.db.block()?;
        match instance {
            Instance::Top => {
                if self.config.hierarchy {
                    if let Some(id) = block.find_mod_net(block.top_module(), name) {
                        return Some(Net::Module(id));
                    }
                }
                block.find_net(name).map(Net::Flat)
            }
            Instance::Flat(_) => None,
            Instance::Module(id) => {
                self.require_hierarchy(instance);
                if let Some(net) = block.find_mod_net(block.mod_inst(id).master(), name) {
                    return Some(Net::Module(net));
                }
                let divider = self.config.path_divider;
                let flat_name = format!("{}{divider}{name}", block.mod_inst_path(id, divider));
                block.find_net(&flat_name).map(Net::Flat)
            }
        }
    }

    /// Finds the nets of the top scope whose names match a `*`/`?` wildcard pattern.
    ///
    /// Other scopes are not searched.
    pub fn find_nets_matching(&self, instance: Instance, pattern: &str) -> Vec<Net> {
        if !instance.is_top() {
            tracing::debug!("net pattern search below the top instance is not supported");
            return Vec::new();
        }
        let (Some(block), Some(regex)) = (self.db.block(), wildcard_regex(pattern)) else {
            return Vec::new();
        };
        let mut nets = Vec::new();
        if self.config.hierarchy {
            nets.extend(
                block
                    .module(block.top_module())
                    .mod_nets()
                    .filter(|&id| regex.is_match(block.mod_net(id).name()))
                    .map(Net::Module),
            );
        }
        nets.extend(
            block
                .nets()
                .filter(|(_, net)| regex.is_match(net.name()))
                .map(|(id, _)| Net::Flat(id)),
        );
        nets
    }

    /// The non-supply pins of `instance`.
    ///
    /// The pins of the top instance are the design's boundary terminals.
    pub fn instance_pins(&self, instance: Instance) -> Vec<Pin> {
        let Some(block) = self.db.block() else {
            return Vec::new();
        };
        let pins: Vec<_> = match instance {
            Instance::Top => block.bterms().map(|(id, _)| Pin::Boundary(id)).collect(),
            Instance::Flat(id) => block.inst(id).iterms().map(Pin::Flat).collect(),
            Instance::Module(id) => block.mod_inst(id).mod_iterms().map(Pin::Module).collect(),
        };
        pins.into_iter()
            .filter(|&pin| !self.is_supply_pin(pin))
            .collect()
    }

    /// The nets in the scope of `instance`.
    pub fn instance_nets(&self, instance: Instance) -> Vec<Net> {
        let Some(block) = self.db.block() else {
            return Vec::new();
        };
        match instance {
            Instance::Top => {
                let mut nets = Vec::new();
                if self.config.hierarchy {
                    nets.extend(block.module(block.top_module()).mod_nets().map(Net::Module));
                }
                nets.extend(block.nets().map(|(id, _)| Net::Flat(id)));
                nets
            }
            Instance::Flat(_) => Vec::new(),
            Instance::Module(id) => block
                .module(block.mod_inst(id).master())
                .mod_nets()
                .map(Net::Module)
                .collect(),
        }
    }

    /// The instance owning `pin`.
    pub fn instance(&self, pin: Pin) -> Instance {
        let block = self.block();
        match pin {
            Pin::Flat(id) => Instance::Flat(block.iterm(id).inst()),
            Pin::Boundary(_) => Instance::Top,
            Pin::Module(id) => Instance::Module(block.mod_iterm(id).mod_inst()),
            Pin::ModuleBoundary(id) => module_instance(block, block.mod_bterm(id).module()),
        }
    }

    /// The module boundary terminal inside the child module facing a module terminal.
    pub(crate) fn inner_boundary(&self, pin: Pin) -> Option<physdb::ModBTermId> {
        let block = self.db.block()?;
        let id = pin.as_module()?;
        let mod_iterm = block.mod_iterm(id);
        let master = block.mod_inst(mod_iterm.mod_inst()).master();
        self.libs.boundary(master, mod_iterm.name())
    }

    /// The module terminal on the parent side of a module boundary terminal.
    pub(crate) fn outer_terminal(&self, pin: Pin) -> Option<physdb::ModITermId> {
        let block = self.db.block()?;
        let id = pin.as_module_boundary()?;
        let mod_bterm = block.mod_bterm(id);
        let mod_inst = block.module(mod_bterm.module()).mod_inst()?;
        block.find_mod_iterm(mod_inst, mod_bterm.name())
    }

    /// The logical port of `pin`.
    pub fn port(&self, pin: Pin) -> Option<PortId> {
        let block = self.db.block()?;
        match pin {
            Pin::Flat(id) => self.libs.port_of_mterm(block.iterm(id).mterm()),
            Pin::Boundary(id) => self
                .libs
                .find_port(self.libs.top_cell()?, block.bterm(id).name()),
            Pin::Module(_) => self.libs.port_of_mod_bterm(self.inner_boundary(pin)?),
            Pin::ModuleBoundary(id) => self.libs.port_of_mod_bterm(id),
        }
    }

    pub(crate) fn pin_types(&self, pin: Pin) -> Option<(SigType, IoType)> {
        let block = self.db.block()?;
        match pin {
            Pin::Flat(id) => self.db.iterm_types(id),
            Pin::Boundary(id) => {
                let bterm = block.bterm(id);
                Some((bterm.sig_type(), bterm.io_type()))
            }
            Pin::Module(_) => {
                let mod_bterm = block.mod_bterm(self.inner_boundary(pin)?);
                Some((mod_bterm.sig_type(), mod_bterm.io_type()))
            }
            Pin::ModuleBoundary(id) => {
                let mod_bterm = block.mod_bterm(id);
                Some((mod_bterm.sig_type(), mod_bterm.io_type()))
            }
        }
    }

    /// Returns `true` if `pin` carries power or ground.
    pub fn is_supply_pin(&self, pin: Pin) -> bool {
        self.pin_types(pin)
            .map(|(sig, _)| sig.is_supply())
            .unwrap_or(false)
    }

    /// The direction of `pin`.
    ///
    /// Leaf pins take the direction of their linked timing port when
    /// there is one. All others take the direction of their native terminal.
    pub fn direction(&self, pin: Pin) -> PortDirection {
        if let Pin::Flat(_) = pin {
            let timing = self
                .port(pin)
                .and_then(|port| self.libs.try_port(port))
                .and_then(|port| port.timing())
                .and_then(|port| self.timing_port(port));
            if let Some(port) = timing {
                return port.direction();
            }
        }
        self.pin_types(pin)
            .map(|(sig, io)| direction_from_types(sig, io))
            .unwrap_or_default()
    }

    /// The term of `pin`.
    ///
    /// A module terminal maps to the boundary terminal inside its module.
    /// Leaf terminals have no term.
    pub fn term(&self, pin: Pin) -> Option<Term> {
        match pin {
            Pin::Flat(_) => None,
            Pin::Boundary(id) => Some(Term::Boundary(id)),
            Pin::Module(_) => self.inner_boundary(pin).map(Term::ModuleBoundary),
            Pin::ModuleBoundary(id) => Some(Term::ModuleBoundary(id)),
        }
    }

    /// The pin of `term`.
    ///
    /// A module boundary term maps to the terminal on its module's instance,
    /// or to the boundary terminal itself if the module is not instantiated.
    pub fn term_pin(&self, term: Term) -> Pin {
        match term {
            Term::Boundary(id) => Pin::Boundary(id),
            Term::ModuleBoundary(id) => self
                .outer_terminal(Pin::ModuleBoundary(id))
                .map(Pin::Module)
                .unwrap_or(Pin::ModuleBoundary(id)),
        }
    }

    /// The port-local name of `pin`.
    pub fn pin_name(&self, pin: Pin) -> ArcStr {
        let block = self.block();
        match pin {
            Pin::Flat(id) => block.iterm(id).name().clone(),
            Pin::Boundary(id) => block.bterm(id).name().clone(),
            Pin::Module(id) => block.mod_iterm(id).name().clone(),
            Pin::ModuleBoundary(id) => block.mod_bterm(id).name().clone(),
        }
    }

    /// The hierarchical name of `pin`: its instance path, the divider, and its port name.
    ///
    /// Pins of the top instance are named by port alone.
    pub fn pin_path_name(&self, pin: Pin) -> String {
        let name = self.pin_name(pin);
        match self.instance(pin) {
            Instance::Top => name.to_string(),
            instance => format!(
                "{}{}{}",
                self.path_name(instance),
                self.config.path_divider,
                name
            ),
        }
    }

    /// The local name of `net`.
    pub fn net_name(&self, net: Net) -> ArcStr {
        let block = self.block();
        match net {
            Net::Flat(id) => block.net(id).name().clone(),
            Net::Module(id) => block.mod_net(id).name().clone(),
        }
    }

    /// The instance whose scope contains `net`.
    pub fn net_instance(&self, net: Net) -> Instance {
        match net {
            Net::Flat(_) => Instance::Top,
            Net::Module(id) => {
                let block = self.block();
                module_instance(block, block.mod_net(id).module())
            }
        }
    }

    /// Returns `true` if `pin` is a terminal on the design boundary.
    #[inline]
    pub fn is_top_level_port(&self, pin: Pin) -> bool {
        matches!(pin, Pin::Boundary(_))
    }
}
