//! The per-net driver index.
//!
//! Entries are computed from the connectivity traversal on first query
//! and then kept current by the edit operations. An entry is only ever
//! updated, never created, by an edit.

use indexmap::{IndexMap, IndexSet};

use crate::entity::{Net, Pin};
use crate::Network;

#[derive(Debug, Default)]
pub(crate) struct DriverIndex {
    entries: IndexMap<Net, IndexSet<Pin>>,
}

impl DriverIndex {
    fn get(&self, net: Net) -> Option<&IndexSet<Pin>> {
        self.entries.get(&net)
    }

    fn insert(&mut self, net: Net, drivers: IndexSet<Pin>) {
        self.entries.insert(net, drivers);
    }

    fn add(&mut self, net: Net, pin: Pin) {
        if let Some(drivers) = self.entries.get_mut(&net) {
            drivers.insert(pin);
        }
    }

    fn remove(&mut self, net: Net, pin: Pin) {
        if let Some(drivers) = self.entries.get_mut(&net) {
            drivers.shift_remove(&pin);
        }
    }

    fn invalidate(&mut self, net: Net) {
        self.entries.shift_remove(&net);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Network {
    /// Returns `true` if `pin` drives its net.
    ///
    /// Design boundary terminals drive when they bring a signal in.
    /// Leaf terminals drive when they put one out. Hierarchical pins
    /// never drive.
    pub fn is_driver(&self, pin: Pin) -> bool {
        match pin {
            Pin::Boundary(_) => self.direction(pin).is_any_input(),
            Pin::Flat(_) => self.direction(pin).is_any_output(),
            Pin::Module(_) | Pin::ModuleBoundary(_) => false,
        }
    }

    /// The pins driving `net`, across module boundaries.
    pub fn drivers(&self, net: Net) -> IndexSet<Pin> {
        let cached = self.drivers.borrow().get(net).cloned();
        if let Some(drivers) = cached {
            return drivers;
        }
        let mut drivers = IndexSet::new();
        self.visit_connected_pins(
            net,
            &mut |pin| {
                if self.is_driver(pin) {
                    drivers.insert(pin);
                }
            },
            &mut IndexSet::new(),
        );
        self.drivers.borrow_mut().insert(net, drivers.clone());
        drivers
    }

    /// Returns `true` if the driver set of `net` has been computed and is current.
    pub fn has_cached_drivers(&self, net: Net) -> bool {
        self.drivers.borrow().get(net).is_some()
    }

    pub(crate) fn clear_drivers(&self) {
        self.drivers.borrow_mut().clear();
    }

    /// The nets reachable from any net `pin` is currently on.
    fn reachable_nets(&self, pin: Pin) -> IndexSet<Net> {
        let mut nets = IndexSet::new();
        for net in self.pin_memberships(pin) {
            self.traverse(net, &mut nets, |_| ());
        }
        nets
    }

    /// Removes `pin` from the driver sets it may be in, before it is disconnected.
    ///
    /// Hierarchical pins join nets together, so every reachable entry is
    /// dropped instead.
    pub(crate) fn before_disconnect(&self, pin: Pin) {
        let nets = self.reachable_nets(pin);
        let mut index = self.drivers.borrow_mut();
        for net in nets {
            if pin.is_hierarchical() {
                index.invalidate(net);
            } else {
                index.remove(net, pin);
            }
        }
    }

    /// Adds `pin` to the driver sets of its new nets, after it is connected.
    pub(crate) fn after_connect(&self, pin: Pin) {
        let hierarchical = pin.is_hierarchical();
        if !hierarchical && !self.is_driver(pin) {
            return;
        }
        let nets = self.reachable_nets(pin);
        let mut index = self.drivers.borrow_mut();
        for net in nets {
            if hierarchical {
                index.invalidate(net);
            } else {
                index.add(net, pin);
            }
        }
    }

    /// Drops the driver entries of `net` and every net reachable from it,
    /// before `net` is deleted.
    pub(crate) fn before_delete_net(&self, net: Net) {
        let nets = self.connected_nets(net);
        let mut index = self.drivers.borrow_mut();
        for net in nets {
            index.invalidate(net);
        }
    }
}
