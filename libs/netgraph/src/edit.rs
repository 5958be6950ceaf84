//! Network edits.
//!
//! Each edit classifies its arguments, delegates the change to the database,
//! and keeps the driver index current around it.

use arcstr::ArcStr;
use physdb::{BTermId, DbResult, ModInstId};
use timinglib::PortDirection;
use tracing::{debug, warn};

use crate::entity::{types_from_direction, Instance, Net, Pin};
use crate::error::{fatal, FatalError};
use crate::library::{CellId, CellSource, PortId, PortSource, TimingCellRef, TimingPortRef};
use crate::Network;

impl Network {
    /// Makes a leaf instance of a timing cell under the top instance.
    ///
    /// Returns `None` if `parent` is not the top instance, if no physical
    /// master matches the timing cell, or if the name is taken.
    pub fn make_instance(
        &mut self,
        cell: &TimingCellRef,
        name: impl Into<ArcStr>,
        parent: Instance,
    ) -> Option<Instance> {
        let name = name.into();
        if !parent.is_top() {
            warn!("leaf instance `{name}` can only be made under the top instance");
            return None;
        }
        let Some(master) = self.libs.timing_master(cell.library, &cell.cell) else {
            warn!("no physical master for timing cell `{}`", cell.cell);
            return None;
        };
        match self.db.create_inst(master, name, None) {
            Ok(id) => {
                debug!("made instance {id} of `{}`", cell.cell);
                Some(Instance::Flat(id))
            }
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    /// Makes an instance of a module cell under `parent`, with one pin per
    /// boundary terminal of the module.
    ///
    /// Returns `None` without hierarchy, if `cell` is not a module cell,
    /// if `parent` is a leaf, or if the module cannot be instantiated there.
    pub fn make_module_instance(
        &mut self,
        cell: CellId,
        name: impl Into<ArcStr>,
        parent: Instance,
    ) -> Option<Instance> {
        let name = name.into();
        if !self.config.hierarchy {
            warn!("module instance `{name}` requires hierarchy");
            return None;
        }
        let CellSource::Module(module) = self.libs.cell(cell).source() else {
            warn!("{cell} is not a module cell");
            return None;
        };
        let block = self.block_mut();
        let parent_module = match parent {
            Instance::Top => block.top_module(),
            Instance::Module(id) => block.mod_inst(id).master(),
            Instance::Flat(_) => return None,
        };
        let mod_inst = match block.create_mod_inst(parent_module, module, name) {
            Ok(id) => id,
            Err(err) => {
                warn!("{err}");
                return None;
            }
        };
        let names: Vec<_> = block
            .module(module)
            .mod_bterms()
            .map(|id| block.mod_bterm(id).name().clone())
            .collect();
        for name in names {
            if let Err(err) = block.create_mod_iterm(mod_inst, name) {
                warn!("{err}");
            }
        }
        debug!("made module instance {mod_inst}");
        Some(Instance::Module(mod_inst))
    }

    /// Deletes an instance and its pins.
    pub fn delete_instance(&mut self, instance: Instance) {
        match instance {
            Instance::Top => warn!("the top instance cannot be deleted"),
            Instance::Flat(id) => {
                let pins: Vec<_> = self.block().inst(id).iterms().map(Pin::Flat).collect();
                for &pin in &pins {
                    self.before_disconnect(pin);
                }
                if let Err(err) = self.block_mut().destroy_inst(id) {
                    warn!("{err}");
                }
            }
            Instance::Module(id) => {
                let pins: Vec<_> = self
                    .block()
                    .mod_inst(id)
                    .mod_iterms()
                    .map(Pin::Module)
                    .collect();
                for &pin in &pins {
                    self.before_disconnect(pin);
                }
                if let Err(err) = self.block_mut().destroy_mod_inst(id) {
                    warn!("{err}");
                }
            }
        }
    }

    /// Makes a net in the scope of `parent`.
    ///
    /// Returns `None` for leaf instances or if the name is taken.
    pub fn make_net(&mut self, name: impl Into<ArcStr>, parent: Instance) -> Option<Net> {
        let block = self.block_mut();
        let result = match parent {
            Instance::Top => block.create_net(name).map(Net::Flat),
            Instance::Module(id) => {
                let module = block.mod_inst(id).master();
                block.create_mod_net(module, name).map(Net::Module)
            }
            Instance::Flat(_) => return None,
        };
        match result {
            Ok(net) => {
                debug!("made net {net}");
                Some(net)
            }
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    /// Deletes a net, disconnecting every pin on it.
    pub fn delete_net(&mut self, net: Net) {
        self.before_delete_net(net);
        let result = match net {
            Net::Flat(id) => {
                self.constants.shift_remove(&id);
                self.block_mut().destroy_net(id)
            }
            Net::Module(id) => self.block_mut().destroy_mod_net(id),
        };
        if let Err(err) = result {
            warn!("{err}");
        }
    }

    /// Makes the pin of `instance` for `port`, optionally connected to `net`.
    ///
    /// Leaf instances already have a pin per port, which is returned.
    /// Pins of the top instance are only made by [`Network::connect`],
    /// so `None` is returned for it.
    pub fn make_pin(&mut self, instance: Instance, port: PortId, net: Option<Net>) -> Option<Pin> {
        let pin = match instance {
            Instance::Top => {
                tracing::error!("pins of the top instance are made by connecting its ports");
                return None;
            }
            Instance::Flat(_) => self.find_pin_by_port(instance, port)?,
            Instance::Module(id) => {
                let name = self.libs.try_port(port)?.name().clone();
                Pin::Module(self.module_terminal(id, name)?)
            }
        };
        if let Some(net) = net {
            self.connect_pin(pin, net);
        }
        Some(pin)
    }

    fn module_terminal(&mut self, mod_inst: ModInstId, name: ArcStr) -> Option<physdb::ModITermId> {
        let block = self.block_mut();
        if let Some(id) = block.find_mod_iterm(mod_inst, &name) {
            return Some(id);
        }
        match block.create_mod_iterm(mod_inst, name) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    /// Deletes a pin.
    ///
    /// Ports of deleted boundary terminals remain on their cell until the
    /// design is reloaded.
    ///
    /// # Panics
    ///
    /// Panics for leaf terminals, which only go away with their instance.
    pub fn delete_pin(&mut self, pin: Pin) {
        if let Pin::Flat(_) = pin {
            fatal(FatalError::Unimplemented("delete_pin of a leaf terminal"));
        }
        self.before_disconnect(pin);
        let result = match pin {
            Pin::Flat(_) => Ok(()),
            Pin::Boundary(id) => self.block_mut().destroy_bterm(id),
            Pin::Module(id) => self.block_mut().destroy_mod_iterm(id),
            Pin::ModuleBoundary(id) => {
                self.libs.unindex_boundary(id);
                self.block_mut().destroy_mod_bterm(id)
            }
        };
        if let Err(err) = result {
            warn!("{err}");
        }
    }

    /// Connects the pin of `instance` for `port` to `net`, returning the pin.
    ///
    /// On the top instance a boundary terminal named after the port is
    /// made if needed, and its signal and IO types are set from the port
    /// direction.
    pub fn connect(&mut self, instance: Instance, port: PortId, net: Net) -> Option<Pin> {
        let p = self.libs.try_port(port)?;
        let (name, direction, source) = (p.name().clone(), p.direction(), p.source());
        let pin = match instance {
            Instance::Top => Pin::Boundary(self.top_terminal(name, direction)?),
            Instance::Flat(id) => {
                let block = self.block();
                let iterm = match source {
                    PortSource::Physical(mterm) => block.find_iterm_by_mterm(id, mterm),
                    PortSource::ModuleBoundary(_) | PortSource::Design | PortSource::Group => {
                        block.find_iterm(id, &name)
                    }
                };
                Pin::Flat(iterm?)
            }
            Instance::Module(id) => Pin::Module(self.module_terminal(id, name)?),
        };
        self.connect_pin(pin, net).then_some(pin)
    }

    /// Connects the pin of `instance` for a timing port to `net`, returning the pin.
    pub fn connect_timing_port(
        &mut self,
        instance: Instance,
        port: &TimingPortRef,
        net: Net,
    ) -> Option<Pin> {
        if instance.is_top() {
            let direction = self.timing_port(port)?.direction();
            let pin = Pin::Boundary(self.top_terminal(port.port.clone(), direction)?);
            return self.connect_pin(pin, net).then_some(pin);
        }
        let cell = self.cell(instance)?;
        let port = self.libs.find_port(cell, &port.port)?;
        self.connect(instance, port, net)
    }

    /// Finds or makes the boundary terminal `name` and sets its types from `direction`.
    fn top_terminal(&mut self, name: ArcStr, direction: PortDirection) -> Option<BTermId> {
        let block = self.block_mut();
        let bterm = match block.find_bterm(&name) {
            Some(id) => id,
            None => match block.create_bterm(name.clone(), None) {
                Ok(id) => id,
                Err(err) => {
                    warn!("{err}");
                    return None;
                }
            },
        };
        let (sig, io) = types_from_direction(direction);
        block.set_bterm_types(bterm, sig, io);
        if let Some(top) = self.libs.top_cell() {
            match self.libs.find_port(top, &name) {
                Some(port) => self.libs.set_port_direction(port, direction),
                None => {
                    self.libs
                        .make_port(top, name, PortSource::Design, direction);
                }
            }
        }
        Some(bterm)
    }

    /// Connects an existing pin to `net`, replacing its connection of the same kind.
    ///
    /// Hierarchical pins can only be connected to module nets. Returns `false`,
    /// leaving the pin untouched, if the connection is refused.
    pub fn connect_pin(&mut self, pin: Pin, net: Net) -> bool {
        if let (Pin::Module(_) | Pin::ModuleBoundary(_), Net::Flat(_)) = (pin, net) {
            warn!("hierarchical pin {pin} cannot connect to flat net {net}");
            return false;
        }
        self.before_disconnect(pin);
        let block = self.block_mut();
        match (pin, net) {
            (Pin::Flat(id), Net::Flat(net)) => block.connect_iterm(id, net),
            (Pin::Flat(id), Net::Module(net)) => block.connect_iterm_mod_net(id, net),
            (Pin::Boundary(id), Net::Flat(net)) => block.connect_bterm(id, net),
            (Pin::Boundary(id), Net::Module(net)) => block.connect_bterm_mod_net(id, net),
            (Pin::Module(id), Net::Module(net)) => block.connect_mod_iterm(id, net),
            (Pin::ModuleBoundary(id), Net::Module(net)) => block.connect_mod_bterm(id, net),
            (Pin::Module(_) | Pin::ModuleBoundary(_), Net::Flat(_)) => return false,
        }
        debug!("connected {pin} to {net}");
        self.after_connect(pin);
        true
    }

    /// Disconnects `pin` from every net it is on.
    pub fn disconnect(&mut self, pin: Pin) {
        self.before_disconnect(pin);
        let block = self.block_mut();
        match pin {
            Pin::Flat(id) => block.disconnect_iterm(id),
            Pin::Boundary(id) => block.disconnect_bterm(id),
            Pin::Module(id) => block.disconnect_mod_iterm(id),
            Pin::ModuleBoundary(id) => block.disconnect_mod_bterm(id),
        }
        debug!("disconnected {pin}");
    }

    /// Replaces the cell of a leaf instance, keeping its connections.
    ///
    /// The new cell must be a physical cell with the same terminal names.
    ///
    /// # Panics
    ///
    /// Panics if `instance` is not a leaf instance or `cell` is not a physical cell.
    pub fn replace_cell(&mut self, instance: Instance, cell: CellId) -> DbResult<()> {
        let Instance::Flat(id) = instance else {
            fatal(FatalError::Unimplemented("replace_cell of a non-leaf instance"));
        };
        let CellSource::Physical(master) = self.libs.cell(cell).source() else {
            fatal(FatalError::Unimplemented("replace_cell with a non-physical cell"));
        };
        let pins: Vec<_> = self.block().inst(id).iterms().map(Pin::Flat).collect();
        for &pin in &pins {
            self.before_disconnect(pin);
        }
        let result = self.db.swap_master(id, master);
        for &pin in &pins {
            self.after_connect(pin);
        }
        if result.is_ok() {
            debug!("replaced cell of {id} with {cell}");
        }
        result
    }

    /// Merges `from` into `into`.
    ///
    /// # Panics
    ///
    /// Always panics; merging nets is not supported.
    pub fn merge_into(&mut self, from: Net, into: Net) {
        debug!("merge of {from} into {into} requested");
        fatal(FatalError::Unimplemented("merge_into"));
    }

    /// The net `net` was merged into.
    ///
    /// # Panics
    ///
    /// Always panics; merging nets is not supported.
    pub fn merged_into(&self, net: Net) -> Option<Net> {
        debug!("merge target of {net} requested");
        fatal(FatalError::Unimplemented("merged_into"));
    }
}
