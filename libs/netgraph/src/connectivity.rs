//! Connectivity traversal.
//!
//! A flat net only connects the terminals listed on it. A module net also
//! reaches through every module terminal into the child module ("below")
//! and through every module boundary terminal out to the parent ("above").

use indexmap::IndexSet;
use physdb::SigType;
use serde::{Deserialize, Serialize};

use crate::entity::{Net, Pin, Term};
use crate::Network;

/// A constant logic value.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum LogicValue {
    /// Logic zero, driven by ground.
    Zero,
    /// Logic one, driven by power.
    One,
}

impl Network {
    /// The net `pin` is connected to.
    ///
    /// With hierarchy enabled, a terminal on both a module net and a flat
    /// net resolves to the module net.
    pub fn net(&self, pin: Pin) -> Option<Net> {
        let block = self.db.block()?;
        match pin {
            Pin::Flat(id) => {
                let iterm = block.iterm(id);
                match iterm.mod_net() {
                    Some(mod_net) if self.config.hierarchy => Some(Net::Module(mod_net)),
                    _ => iterm.net().map(Net::Flat),
                }
            }
            Pin::Boundary(id) => {
                let bterm = block.bterm(id);
                match bterm.mod_net() {
                    Some(mod_net) if self.config.hierarchy => Some(Net::Module(mod_net)),
                    _ => bterm.net().map(Net::Flat),
                }
            }
            Pin::Module(id) => block.mod_iterm(id).mod_net().map(Net::Module),
            Pin::ModuleBoundary(id) => block.mod_bterm(id).mod_net().map(Net::Module),
        }
    }

    /// The net `term` is connected to.
    pub fn term_net(&self, term: Term) -> Option<Net> {
        self.net(Pin::from(term))
    }

    /// The net memberships of `pin`, ignoring module net precedence.
    pub(crate) fn pin_memberships(&self, pin: Pin) -> Vec<Net> {
        let Some(block) = self.db.block() else {
            return Vec::new();
        };
        let (net, mod_net) = match pin {
            Pin::Flat(id) => (block.iterm(id).net(), block.iterm(id).mod_net()),
            Pin::Boundary(id) => (block.bterm(id).net(), block.bterm(id).mod_net()),
            Pin::Module(id) => (None, block.mod_iterm(id).mod_net()),
            Pin::ModuleBoundary(id) => (None, block.mod_bterm(id).mod_net()),
        };
        net.map(Net::Flat)
            .into_iter()
            .chain(mod_net.map(Net::Module))
            .collect()
    }

    /// The pins listed directly on `net`, including supply pins.
    fn direct_pins(&self, net: Net) -> Vec<Pin> {
        let Some(block) = self.db.block() else {
            return Vec::new();
        };
        match net {
            Net::Flat(id) => {
                if !block.contains_net(id) {
                    return Vec::new();
                }
                let n = block.net(id);
                n.iterms()
                    .map(Pin::Flat)
                    .chain(n.bterms().map(Pin::Boundary))
                    .collect()
            }
            Net::Module(id) => {
                if !block.contains_mod_net(id) {
                    return Vec::new();
                }
                let n = block.mod_net(id);
                n.iterms()
                    .map(Pin::Flat)
                    .chain(n.bterms().map(Pin::Boundary))
                    .chain(n.mod_bterms().map(Pin::ModuleBoundary))
                    .chain(n.mod_iterms().map(Pin::Module))
                    .collect()
            }
        }
    }

    /// Visits every pin reachable from `net` exactly once, supply pins included.
    ///
    /// Nets already in `visited_nets` are not entered. Every net entered is
    /// added to it.
    pub(crate) fn traverse(
        &self,
        net: Net,
        visited_nets: &mut IndexSet<Net>,
        mut visit: impl FnMut(Pin),
    ) {
        let Some(block) = self.db.block() else {
            return;
        };
        let mut visited_pins = IndexSet::new();
        let mut worklist = vec![net];
        while let Some(net) = worklist.pop() {
            if !visited_nets.insert(net) {
                continue;
            }
            for pin in self.direct_pins(net) {
                if visited_pins.insert(pin) {
                    visit(pin);
                }
                match pin {
                    Pin::Module(_) => {
                        let Some(inner) = self.inner_boundary(pin) else {
                            continue;
                        };
                        if visited_pins.insert(Pin::ModuleBoundary(inner)) {
                            visit(Pin::ModuleBoundary(inner));
                        }
                        if let Some(below) = block.mod_bterm(inner).mod_net() {
                            worklist.push(Net::Module(below));
                        }
                    }
                    Pin::ModuleBoundary(_) => {
                        let Some(outer) = self.outer_terminal(pin) else {
                            continue;
                        };
                        if visited_pins.insert(Pin::Module(outer)) {
                            visit(Pin::Module(outer));
                        }
                        if let Some(above) = block.mod_iterm(outer).mod_net() {
                            worklist.push(Net::Module(above));
                        }
                    }
                    Pin::Flat(_) | Pin::Boundary(_) => (),
                }
            }
        }
    }

    /// Visits every non-supply pin connected to `net`, across module boundaries.
    ///
    /// Nets already in `visited_nets` are skipped. Each pin is visited once.
    pub fn visit_connected_pins(
        &self,
        net: Net,
        visitor: &mut dyn FnMut(Pin),
        visited_nets: &mut IndexSet<Net>,
    ) {
        self.traverse(net, visited_nets, |pin| {
            if !self.is_supply_pin(pin) {
                visitor(pin);
            }
        });
    }

    /// The non-supply pins connected to `net`, across module boundaries.
    pub fn connected_pins(&self, net: Net) -> Vec<Pin> {
        let mut pins = Vec::new();
        self.visit_connected_pins(net, &mut |pin| pins.push(pin), &mut IndexSet::new());
        pins
    }

    /// The nets reachable from `net`, including `net` itself.
    pub fn connected_nets(&self, net: Net) -> IndexSet<Net> {
        let mut nets = IndexSet::new();
        self.traverse(net, &mut nets, |_| ());
        nets
    }

    /// The non-supply pins listed directly on `net`.
    pub fn net_pins(&self, net: Net) -> Vec<Pin> {
        self.direct_pins(net)
            .into_iter()
            .filter(|&pin| !self.is_supply_pin(pin))
            .collect()
    }

    /// The terms listed directly on `net`.
    pub fn net_terms(&self, net: Net) -> Vec<Term> {
        self.direct_pins(net)
            .into_iter()
            .filter_map(|pin| match pin {
                Pin::Boundary(id) => Some(Term::Boundary(id)),
                Pin::ModuleBoundary(id) => Some(Term::ModuleBoundary(id)),
                Pin::Flat(_) | Pin::Module(_) => None,
            })
            .collect()
    }

    fn carries(&self, net: Net, sig: SigType) -> bool {
        match net {
            Net::Flat(id) => self
                .db
                .block()
                .is_some_and(|block| block.contains_net(id) && block.net(id).sig_type() == sig),
            Net::Module(_) => self
                .direct_pins(net)
                .into_iter()
                .filter(|pin| matches!(pin, Pin::Flat(_) | Pin::Boundary(_)))
                .any(|pin| self.pin_types(pin).is_some_and(|(s, _)| s == sig)),
        }
    }

    /// Returns `true` if `net` carries power.
    ///
    /// A module net carries power if any leaf or boundary terminal on it does.
    pub fn is_power(&self, net: Net) -> bool {
        self.carries(net, SigType::Power)
    }

    /// Returns `true` if `net` carries ground.
    ///
    /// A module net carries ground if any leaf or boundary terminal on it does.
    pub fn is_ground(&self, net: Net) -> bool {
        self.carries(net, SigType::Ground)
    }

    /// Returns `true` for special (pre-routed) flat nets.
    ///
    /// Module nets are never special.
    pub fn is_special(&self, net: Net) -> bool {
        match net {
            Net::Flat(id) => self
                .db
                .block()
                .is_some_and(|block| block.contains_net(id) && block.net(id).is_special()),
            Net::Module(_) => false,
        }
    }

    /// The highest-level net connected to `net`.
    ///
    /// Always `net` itself.
    #[inline]
    pub fn highest_connected_net(&self, net: Net) -> Net {
        net
    }

    /// The constant value held by `net`, if it is a supply net.
    pub fn constant_value(&self, net: Net) -> Option<LogicValue> {
        match net {
            Net::Flat(id) => self.constants.get(&id).copied(),
            Net::Module(_) if self.is_power(net) => Some(LogicValue::One),
            Net::Module(_) if self.is_ground(net) => Some(LogicValue::Zero),
            Net::Module(_) => None,
        }
    }

    /// The flat nets found to hold `value` at the last design load.
    pub fn constant_nets(&self, value: LogicValue) -> Vec<Net> {
        self.constants
            .iter()
            .filter(|(_, &v)| v == value)
            .map(|(&id, _)| Net::Flat(id))
            .collect()
    }
}
