//! Timing library cells and ports.
//!
//! A [`TimingLibrary`] is a named collection of [`TimingCell`]s. Each cell
//! declares logic ports with a [`PortDirection`] and, separately, its
//! power/ground pins. Only the structural facts needed to cross-reference
//! a physical library are modeled; no timing arcs or electrical data.
#![warn(missing_docs)]

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
pub(crate) mod tests;

/// The direction of a port.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PortDirection {
    /// An input.
    Input,
    /// An output.
    Output,
    /// An output that may be driven to high impedance.
    Tristate,
    /// A bidirectional port.
    Bidirect,
    /// A port internal to the cell.
    Internal,
    /// A ground supply.
    Ground,
    /// A power supply.
    Power,
    /// Unknown direction.
    #[default]
    Unknown,
}

impl PortDirection {
    /// Returns `true` for input and bidirect ports.
    #[inline]
    pub fn is_any_input(&self) -> bool {
        matches!(self, Self::Input | Self::Bidirect)
    }

    /// Returns `true` for output, tristate, and bidirect ports.
    #[inline]
    pub fn is_any_output(&self) -> bool {
        matches!(self, Self::Output | Self::Tristate | Self::Bidirect)
    }

    /// Returns `true` for power and ground ports.
    #[inline]
    pub fn is_power_ground(&self) -> bool {
        matches!(self, Self::Power | Self::Ground)
    }

    /// The lowercase name of the direction.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Tristate => "tristate",
            Self::Bidirect => "bidirect",
            Self::Internal => "internal",
            Self::Ground => "ground",
            Self::Power => "power",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The supply kind of a power/ground pin.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PgKind {
    /// A primary power pin.
    Power,
    /// A primary ground pin.
    Ground,
}

/// An error in constructing a timing library.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimingLibError {
    /// A cell with the same name already exists in the library.
    #[error("duplicate cell `{cell}` in timing library `{lib}`")]
    DuplicateCell {
        /// The library name.
        lib: ArcStr,
        /// The duplicated cell name.
        cell: ArcStr,
    },
    /// A port or power/ground pin with the same name already exists on the cell.
    #[error("duplicate port `{port}` on timing cell `{cell}`")]
    DuplicatePort {
        /// The cell name.
        cell: ArcStr,
        /// The duplicated port name.
        port: ArcStr,
    },
}

/// A logic port of a timing cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingPort {
    name: ArcStr,
    direction: PortDirection,
}

impl TimingPort {
    /// The name of the port.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The direction of the port.
    #[inline]
    pub fn direction(&self) -> PortDirection {
        self.direction
    }
}

/// A power/ground pin of a timing cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PgPin {
    name: ArcStr,
    kind: PgKind,
}

impl PgPin {
    /// The name of the pin.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The supply kind of the pin.
    #[inline]
    pub fn kind(&self) -> PgKind {
        self.kind
    }
}

/// A cell of a timing library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingCell {
    name: ArcStr,
    ports: IndexMap<ArcStr, TimingPort>,
    pg_pins: IndexMap<ArcStr, PgPin>,
}

impl TimingCell {
    /// Creates a new cell with no ports.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ports: IndexMap::new(),
            pg_pins: IndexMap::new(),
        }
    }

    /// The name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Adds a logic port.
    pub fn add_port(
        &mut self,
        name: impl Into<ArcStr>,
        direction: PortDirection,
    ) -> Result<(), TimingLibError> {
        let name = name.into();
        self.check_unique(&name)?;
        self.ports
            .insert(name.clone(), TimingPort { name, direction });
        Ok(())
    }

    /// Adds a power/ground pin.
    pub fn add_pg_pin(&mut self, name: impl Into<ArcStr>, kind: PgKind) -> Result<(), TimingLibError> {
        let name = name.into();
        self.check_unique(&name)?;
        self.pg_pins.insert(name.clone(), PgPin { name, kind });
        Ok(())
    }

    /// Adds a logic port, returning the cell.
    ///
    /// # Panics
    ///
    /// Panics if the port name is already in use.
    pub fn with_port(mut self, name: impl Into<ArcStr>, direction: PortDirection) -> Self {
        if let Err(e) = self.add_port(name, direction) {
            panic!("{e}");
        }
        self
    }

    /// Adds a power/ground pin, returning the cell.
    ///
    /// # Panics
    ///
    /// Panics if the pin name is already in use.
    pub fn with_pg_pin(mut self, name: impl Into<ArcStr>, kind: PgKind) -> Self {
        if let Err(e) = self.add_pg_pin(name, kind) {
            panic!("{e}");
        }
        self
    }

    fn check_unique(&self, name: &ArcStr) -> Result<(), TimingLibError> {
        if self.ports.contains_key(name) || self.pg_pins.contains_key(name) {
            return Err(TimingLibError::DuplicatePort {
                cell: self.name.clone(),
                port: name.clone(),
            });
        }
        Ok(())
    }

    /// Finds a logic port by name.
    pub fn find_port(&self, name: &str) -> Option<&TimingPort> {
        self.ports.get(name)
    }

    /// Finds a power/ground pin by name.
    pub fn find_pg_pin(&self, name: &str) -> Option<&PgPin> {
        self.pg_pins.get(name)
    }

    /// The logic ports of the cell, in declaration order.
    pub fn ports(&self) -> impl Iterator<Item = &TimingPort> {
        self.ports.values()
    }

    /// The power/ground pins of the cell, in declaration order.
    pub fn pg_pins(&self) -> impl Iterator<Item = &PgPin> {
        self.pg_pins.values()
    }
}

/// A timing library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingLibrary {
    name: ArcStr,
    cells: IndexMap<ArcStr, TimingCell>,
}

impl TimingLibrary {
    /// Creates a new, empty library.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            cells: IndexMap::new(),
        }
    }

    /// The name of the library.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Adds a cell to the library.
    pub fn add_cell(&mut self, cell: TimingCell) -> Result<(), TimingLibError> {
        if self.cells.contains_key(&cell.name) {
            return Err(TimingLibError::DuplicateCell {
                lib: self.name.clone(),
                cell: cell.name.clone(),
            });
        }
        debug!(
            "added timing cell `{}` with {} ports to `{}`",
            cell.name,
            cell.ports.len(),
            self.name
        );
        self.cells.insert(cell.name.clone(), cell);
        Ok(())
    }

    /// Finds a cell by name.
    pub fn find_cell(&self, name: &str) -> Option<&TimingCell> {
        self.cells.get(name)
    }

    /// The cells of the library, in insertion order.
    pub fn cells(&self) -> impl Iterator<Item = &TimingCell> {
        self.cells.values()
    }

    /// The number of cells in the library.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the library has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
