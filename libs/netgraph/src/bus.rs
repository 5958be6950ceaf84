//! Bus and bundle port grouping.

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use timinglib::PortDirection;

use crate::library::{CellId, LibraryStore, PortId, PortShape};

lazy_static! {
    /// Matches bus bit names of the form `name[index]` or `name<index>`.
    static ref BUS_BIT_REGEX: Regex =
        Regex::new(r"^(?P<bus>.+)(?:\[(?P<a>\d+)\]|<(?P<b>\d+)>)$").unwrap();
}

/// Splits a bus bit name into its bus name and index.
///
/// Returns `None` if the name is not of the form `name[index]` or `name<index>`.
pub fn parse_bus_bit(name: &str) -> Option<(&str, i64)> {
    let caps = BUS_BIT_REGEX.captures(name)?;
    let bus = caps.name("bus")?.as_str();
    let index = caps.name("a").or_else(|| caps.name("b"))?.as_str();
    Some((bus, index.parse().ok()?))
}

/// The direction shared by all `members`, or [`PortDirection::Unknown`] if they differ.
fn common_direction(store: &LibraryStore, members: &[PortId]) -> PortDirection {
    members
        .iter()
        .map(|&port| store.port(port).direction())
        .all_equal_value()
        .unwrap_or(PortDirection::Unknown)
}

impl LibraryStore {
    /// Groups the scalar ports of `cell` whose names match a bus bit pattern
    /// into bus ports.
    ///
    /// `msb_first` is called with each bus name; when it returns `true`
    /// the highest index comes first. Bits repeating an index already seen
    /// on the same bus stay scalar and are returned.
    pub(crate) fn group_bus_ports(
        &mut self,
        cell: CellId,
        msb_first: impl Fn(&str) -> bool,
    ) -> Vec<PortId> {
        let mut buses: IndexMap<ArcStr, Vec<(i64, PortId)>> = IndexMap::new();
        for port in self.cell(cell).ports() {
            let p = self.port(port);
            if *p.shape() != PortShape::Scalar {
                continue;
            }
            if let Some((bus, index)) = parse_bus_bit(p.name()) {
                buses
                    .entry(ArcStr::from(bus))
                    .or_default()
                    .push((index, port));
            }
        }

        let mut duplicates = Vec::new();
        for (name, bits) in buses {
            if self.find_port(cell, &name).is_some() {
                tracing::debug!("not grouping bus `{name}` of {cell}: a port with that name exists");
                continue;
            }
            let msb_first = msb_first(&name);
            let mut seen = IndexSet::new();
            let (bits, repeated): (Vec<_>, Vec<_>) = bits
                .into_iter()
                .partition(|(index, _)| seen.insert(*index));
            duplicates.extend(repeated.into_iter().map(|(_, port)| port));
            let bits: Vec<_> = bits
                .into_iter()
                .sorted_by(|a, b| {
                    if msb_first {
                        b.0.cmp(&a.0)
                    } else {
                        a.0.cmp(&b.0)
                    }
                })
                .collect();
            let (Some(&(from, _)), Some(&(to, _))) = (bits.first(), bits.last()) else {
                continue;
            };
            let members: Vec<_> = bits.iter().map(|&(_, port)| port).collect();
            let direction = common_direction(self, &members);
            let bus =
                self.make_group_port(cell, name, direction, PortShape::Bus { from, to, members });
            for (index, port) in bits {
                self.set_port_shape(port, PortShape::BusBit { bus, index });
            }
        }
        duplicates
    }

    /// Groups existing top-level ports of `cell` into a bundle.
    ///
    /// Returns `None` if `members` is empty, if any member is not a top-level
    /// port of `cell`, or if a port named `name` already exists.
    pub(crate) fn make_bundle(
        &mut self,
        cell: CellId,
        name: ArcStr,
        members: Vec<PortId>,
    ) -> Option<PortId> {
        if members.is_empty() || self.find_port(cell, &name).is_some() {
            return None;
        }
        let top_level: Vec<_> = self.cell(cell).ports().collect();
        if !members.iter().all(|port| top_level.contains(port)) {
            return None;
        }
        let direction = common_direction(self, &members);
        Some(self.make_group_port(cell, name, direction, PortShape::Bundle { members }))
    }
}
