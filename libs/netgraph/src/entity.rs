//! Logical entities and their native database counterparts.
//!
//! Every logical entity is a closed enum over the native kinds it may
//! wrap. Classifying a [`DbObject`] of any other kind is a fatal error.

use std::fmt::{Display, Formatter};

use physdb::{
    BTermId, DbObject, ITermId, InstId, IoType, ModBTermId, ModITermId, ModInstId, ModNetId,
    NetId, ObjectType, SigType,
};
use serde::{Deserialize, Serialize};
use timinglib::PortDirection;

use crate::error::{fatal, FatalError};

/// An instance in the design hierarchy.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Instance {
    /// The design root.
    Top,
    /// A leaf instance of a library master.
    Flat(InstId),
    /// An instance of a module.
    Module(ModInstId),
}

/// A connection point on an instance.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Pin {
    /// A terminal of a leaf instance.
    Flat(ITermId),
    /// A terminal on the design boundary, owned by [`Instance::Top`].
    Boundary(BTermId),
    /// A terminal of a module instance, facing its parent.
    Module(ModITermId),
    /// A terminal on the inside of a module boundary, facing its children.
    ModuleBoundary(ModBTermId),
}

/// A net.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Net {
    /// A net of the flat netlist.
    Flat(NetId),
    /// A net scoped to a module.
    Module(ModNetId),
}

/// A boundary-facing port occurrence.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Term {
    /// A terminal on the design boundary.
    Boundary(BTermId),
    /// A terminal on a module boundary.
    ModuleBoundary(ModBTermId),
}

fn classification_error(object: DbObject, expected: &'static str) -> ! {
    fatal(FatalError::Classification { object, expected })
}

impl Instance {
    /// Classifies a native object as an instance.
    ///
    /// # Panics
    ///
    /// Panics if the object is neither an instance nor a module instance.
    pub fn from_object(object: DbObject) -> Self {
        match object.object_type() {
            ObjectType::Inst => Self::Flat(InstId::from_raw(object.seq())),
            ObjectType::ModInst => Self::Module(ModInstId::from_raw(object.seq())),
            _ => classification_error(object, "an instance"),
        }
    }

    /// The native object, or `None` for [`Instance::Top`].
    pub fn object(&self) -> Option<DbObject> {
        match *self {
            Self::Top => None,
            Self::Flat(id) => Some(id.object()),
            Self::Module(id) => Some(id.object()),
        }
    }

    /// Returns `true` for [`Instance::Top`].
    #[inline]
    pub fn is_top(&self) -> bool {
        matches!(self, Self::Top)
    }

    /// The leaf instance, if this is one.
    #[inline]
    pub fn as_flat(&self) -> Option<InstId> {
        match *self {
            Self::Flat(id) => Some(id),
            _ => None,
        }
    }

    /// The module instance, if this is one.
    #[inline]
    pub fn as_module(&self) -> Option<ModInstId> {
        match *self {
            Self::Module(id) => Some(id),
            _ => None,
        }
    }
}

impl Pin {
    /// Classifies a native object as a pin.
    ///
    /// # Panics
    ///
    /// Panics if the object is not one of the four terminal kinds.
    pub fn from_object(object: DbObject) -> Self {
        let seq = object.seq();
        match object.object_type() {
            ObjectType::ITerm => Self::Flat(ITermId::from_raw(seq)),
            ObjectType::BTerm => Self::Boundary(BTermId::from_raw(seq)),
            ObjectType::ModITerm => Self::Module(ModITermId::from_raw(seq)),
            ObjectType::ModBTerm => Self::ModuleBoundary(ModBTermId::from_raw(seq)),
            _ => classification_error(object, "a pin"),
        }
    }

    /// The native object.
    pub fn object(&self) -> DbObject {
        match *self {
            Self::Flat(id) => id.object(),
            Self::Boundary(id) => id.object(),
            Self::Module(id) => id.object(),
            Self::ModuleBoundary(id) => id.object(),
        }
    }

    /// The leaf instance terminal, if this is one.
    #[inline]
    pub fn as_flat(&self) -> Option<ITermId> {
        match *self {
            Self::Flat(id) => Some(id),
            _ => None,
        }
    }

    /// The design boundary terminal, if this is one.
    #[inline]
    pub fn as_boundary(&self) -> Option<BTermId> {
        match *self {
            Self::Boundary(id) => Some(id),
            _ => None,
        }
    }

    /// The module instance terminal, if this is one.
    #[inline]
    pub fn as_module(&self) -> Option<ModITermId> {
        match *self {
            Self::Module(id) => Some(id),
            _ => None,
        }
    }

    /// The module boundary terminal, if this is one.
    #[inline]
    pub fn as_module_boundary(&self) -> Option<ModBTermId> {
        match *self {
            Self::ModuleBoundary(id) => Some(id),
            _ => None,
        }
    }

    /// Returns `true` for pins on the module hierarchy.
    #[inline]
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Self::Module(_) | Self::ModuleBoundary(_))
    }
}

impl Net {
    /// Classifies a native object as a net.
    ///
    /// # Panics
    ///
    /// Panics if the object is neither a net nor a module net.
    pub fn from_object(object: DbObject) -> Self {
        match object.object_type() {
            ObjectType::Net => Self::Flat(NetId::from_raw(object.seq())),
            ObjectType::ModNet => Self::Module(ModNetId::from_raw(object.seq())),
            _ => classification_error(object, "a net"),
        }
    }

    /// The native object.
    pub fn object(&self) -> DbObject {
        match *self {
            Self::Flat(id) => id.object(),
            Self::Module(id) => id.object(),
        }
    }

    /// The flat net, if this is one.
    #[inline]
    pub fn as_flat(&self) -> Option<NetId> {
        match *self {
            Self::Flat(id) => Some(id),
            Self::Module(_) => None,
        }
    }

    /// The module net, if this is one.
    #[inline]
    pub fn as_module(&self) -> Option<ModNetId> {
        match *self {
            Self::Module(id) => Some(id),
            Self::Flat(_) => None,
        }
    }
}

impl Term {
    /// Classifies a native object as a term.
    ///
    /// # Panics
    ///
    /// Panics if the object is not a boundary or module boundary terminal.
    pub fn from_object(object: DbObject) -> Self {
        match object.object_type() {
            ObjectType::BTerm => Self::Boundary(BTermId::from_raw(object.seq())),
            ObjectType::ModBTerm => Self::ModuleBoundary(ModBTermId::from_raw(object.seq())),
            _ => classification_error(object, "a term"),
        }
    }

    /// The native object.
    pub fn object(&self) -> DbObject {
        match *self {
            Self::Boundary(id) => id.object(),
            Self::ModuleBoundary(id) => id.object(),
        }
    }

    /// The design boundary terminal, if this is one.
    #[inline]
    pub fn as_boundary(&self) -> Option<BTermId> {
        match *self {
            Self::Boundary(id) => Some(id),
            Self::ModuleBoundary(_) => None,
        }
    }

    /// The module boundary terminal, if this is one.
    #[inline]
    pub fn as_module_boundary(&self) -> Option<ModBTermId> {
        match *self {
            Self::ModuleBoundary(id) => Some(id),
            Self::Boundary(_) => None,
        }
    }
}

impl From<Term> for Pin {
    fn from(value: Term) -> Self {
        match value {
            Term::Boundary(id) => Self::Boundary(id),
            Term::ModuleBoundary(id) => Self::ModuleBoundary(id),
        }
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Flat(id) => write!(f, "{id}"),
            Self::Module(id) => write!(f, "{id}"),
        }
    }
}

impl Display for Pin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.object())
    }
}

impl Display for Net {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.object())
    }
}

/// Any logical entity with a native counterpart.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum NetworkObject {
    /// An instance.
    Instance(Instance),
    /// A pin.
    Pin(Pin),
    /// A net.
    Net(Net),
    /// A term.
    Term(Term),
}

impl From<Instance> for NetworkObject {
    fn from(value: Instance) -> Self {
        Self::Instance(value)
    }
}

impl From<Pin> for NetworkObject {
    fn from(value: Pin) -> Self {
        Self::Pin(value)
    }
}

impl From<Net> for NetworkObject {
    fn from(value: Net) -> Self {
        Self::Net(value)
    }
}

impl From<Term> for NetworkObject {
    fn from(value: Term) -> Self {
        Self::Term(value)
    }
}

/// Maps a native signal/IO type pair to a port direction.
///
/// Power and ground signal types take precedence over the IO type.
pub fn direction_from_types(sig: SigType, io: IoType) -> PortDirection {
    match (sig, io) {
        (SigType::Power, _) => PortDirection::Power,
        (SigType::Ground, _) => PortDirection::Ground,
        (_, IoType::Input) => PortDirection::Input,
        (_, IoType::Output) => PortDirection::Output,
        (_, IoType::Inout | IoType::Feedthru) => PortDirection::Bidirect,
    }
}

/// Maps a port direction to a native signal/IO type pair.
///
/// # Panics
///
/// Panics for directions with no native equivalent
/// (tristate, internal, and unknown).
pub fn types_from_direction(direction: PortDirection) -> (SigType, IoType) {
    match direction {
        PortDirection::Input => (SigType::Signal, IoType::Input),
        PortDirection::Output => (SigType::Signal, IoType::Output),
        PortDirection::Bidirect => (SigType::Signal, IoType::Inout),
        PortDirection::Power => (SigType::Power, IoType::Inout),
        PortDirection::Ground => (SigType::Ground, IoType::Inout),
        PortDirection::Tristate | PortDirection::Internal | PortDirection::Unknown => {
            fatal(FatalError::UnmappableDirection(direction))
        }
    }
}
