//! Native object kinds and electrical classifications.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The native type of a database object.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ObjectType {
    /// A physical library.
    Lib,
    /// A leaf cell master within a library.
    Master,
    /// A terminal on a master.
    MTerm,
    /// The design block.
    Block,
    /// A flat (leaf) instance.
    Inst,
    /// A terminal on a flat instance.
    ITerm,
    /// A terminal on the block boundary.
    BTerm,
    /// A flat net.
    Net,
    /// A module definition.
    Module,
    /// An instance of a module.
    ModInst,
    /// A terminal on a module instance.
    ModITerm,
    /// A terminal on the boundary of a module definition.
    ModBTerm,
    /// A net scoped to a module.
    ModNet,
}

impl ObjectType {
    /// A short lowercase prefix used when displaying IDs.
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Lib => "lib",
            Self::Master => "master",
            Self::MTerm => "mterm",
            Self::Block => "block",
            Self::Inst => "inst",
            Self::ITerm => "iterm",
            Self::BTerm => "bterm",
            Self::Net => "net",
            Self::Module => "module",
            Self::ModInst => "modinst",
            Self::ModITerm => "moditerm",
            Self::ModBTerm => "modbterm",
            Self::ModNet => "modnet",
        }
    }
}

/// An untyped handle to a database object.
///
/// Consumers classify handles by their [`ObjectType`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DbObject {
    ty: ObjectType,
    seq: u64,
}

impl DbObject {
    /// Creates a handle from a native type and sequence number.
    #[inline]
    pub const fn new(ty: ObjectType, seq: u64) -> Self {
        Self { ty, seq }
    }

    /// The native type of the object.
    #[inline]
    pub const fn object_type(&self) -> ObjectType {
        self.ty
    }

    /// The per-kind sequence number of the object.
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

impl Display for DbObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.ty.prefix(), self.seq)
    }
}

/// The signal type of a terminal or net.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum SigType {
    /// An ordinary logic signal.
    #[default]
    Signal,
    /// A power supply.
    Power,
    /// A ground supply.
    Ground,
    /// A clock.
    Clock,
    /// An analog signal.
    Analog,
}

impl SigType {
    /// Returns `true` for power and ground.
    #[inline]
    pub fn is_supply(&self) -> bool {
        matches!(self, Self::Power | Self::Ground)
    }
}

/// The IO type of a terminal.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum IoType {
    /// An input.
    #[default]
    Input,
    /// An output.
    Output,
    /// A bidirectional terminal.
    Inout,
    /// A terminal passing straight through the cell.
    Feedthru,
}
