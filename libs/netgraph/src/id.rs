//! Object identity.
//!
//! With hierarchy enabled, every native object ID packs a 4-bit
//! [`ObjectTag`] below the native sequence number. With hierarchy
//! disabled, only pins need disambiguation: flat terminals use even
//! IDs and boundary terminals odd ones. The top instance is always 0.

use physdb::{DbObject, ModuleId, ObjectType};

use crate::entity::{Instance, Net, NetworkObject, Pin, Term};
use crate::error::{fatal, FatalError};
use crate::Network;

/// A network-wide object identifier.
pub type ObjectId = u64;

/// The number of low bits holding the [`ObjectTag`].
pub const TAG_WIDTH: u32 = 4;

/// The identifier of the top instance.
pub const TOP_ID: ObjectId = 0;

/// The type tag stored in the low bits of an [`ObjectId`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[repr(u64)]
pub enum ObjectTag {
    /// A leaf instance.
    Inst = 1,
    /// A leaf instance terminal.
    ITerm = 2,
    /// A design boundary terminal.
    BTerm = 3,
    /// A flat net.
    Net = 4,
    /// A module instance.
    ModInst = 5,
    /// A module instance terminal.
    ModITerm = 6,
    /// A module boundary terminal.
    ModBTerm = 7,
    /// A module net.
    ModNet = 8,
    /// A module definition.
    Module = 9,
}

impl ObjectTag {
    /// The tag for a native object type, if it has one.
    pub fn of(ty: ObjectType) -> Option<Self> {
        Some(match ty {
            ObjectType::Inst => Self::Inst,
            ObjectType::ITerm => Self::ITerm,
            ObjectType::BTerm => Self::BTerm,
            ObjectType::Net => Self::Net,
            ObjectType::ModInst => Self::ModInst,
            ObjectType::ModITerm => Self::ModITerm,
            ObjectType::ModBTerm => Self::ModBTerm,
            ObjectType::ModNet => Self::ModNet,
            ObjectType::Module => Self::Module,
            ObjectType::Lib | ObjectType::Master | ObjectType::MTerm | ObjectType::Block => {
                return None
            }
        })
    }

    /// Extracts the tag from an identifier.
    pub fn from_id(id: ObjectId) -> Option<Self> {
        Some(match id & ((1 << TAG_WIDTH) - 1) {
            1 => Self::Inst,
            2 => Self::ITerm,
            3 => Self::BTerm,
            4 => Self::Net,
            5 => Self::ModInst,
            6 => Self::ModITerm,
            7 => Self::ModBTerm,
            8 => Self::ModNet,
            9 => Self::Module,
            _ => return None,
        })
    }
}

/// Encodes a native object as a tagged identifier.
///
/// # Panics
///
/// Panics if the sequence number does not fit above the tag bits,
/// or if the object's native type has no tag.
pub fn tagged_id(object: DbObject) -> ObjectId {
    let Some(tag) = ObjectTag::of(object.object_type()) else {
        fatal(FatalError::Classification {
            object,
            expected: "a network object",
        })
    };
    let seq = object.seq();
    if seq > (ObjectId::MAX >> TAG_WIDTH) {
        fatal(FatalError::IdOverflow {
            kind: object.object_type(),
            seq,
        });
    }
    (seq << TAG_WIDTH) | tag as ObjectId
}

fn pin_bit_id(object: DbObject, boundary: bool) -> ObjectId {
    let seq = object.seq();
    if seq > (ObjectId::MAX >> 1) {
        fatal(FatalError::IdOverflow {
            kind: object.object_type(),
            seq,
        });
    }
    (seq << 1) | boundary as ObjectId
}

impl Network {
    /// The identifier of a logical entity.
    ///
    /// Identifiers are unique among entities of the same logical kind
    /// (instances, pins, nets, terms) and stable for the entity's lifetime.
    /// With hierarchy enabled they are unique across all kinds.
    ///
    /// # Panics
    ///
    /// Panics if a native sequence number is too large to encode,
    /// or if a module entity is identified while hierarchy is disabled.
    pub fn id(&self, object: impl Into<NetworkObject>) -> ObjectId {
        match object.into() {
            NetworkObject::Instance(instance) => self.instance_id(instance),
            NetworkObject::Pin(pin) => self.pin_id(pin),
            NetworkObject::Net(net) => self.net_id(net),
            NetworkObject::Term(term) => self.term_id(term),
        }
    }

    /// The identifier of an instance.
    pub fn instance_id(&self, instance: Instance) -> ObjectId {
        match instance {
            Instance::Top => TOP_ID,
            Instance::Flat(id) => self.native_id(id.object()),
            Instance::Module(id) => self.native_id(id.object()),
        }
    }

    /// The identifier of a pin.
    pub fn pin_id(&self, pin: Pin) -> ObjectId {
        if self.config.hierarchy {
            return tagged_id(pin.object());
        }
        match pin {
            Pin::Flat(id) => pin_bit_id(id.object(), false),
            Pin::Boundary(id) => pin_bit_id(id.object(), true),
            Pin::Module(_) | Pin::ModuleBoundary(_) => {
                fatal(FatalError::HierarchyDisabled(pin.object()))
            }
        }
    }

    /// The identifier of a net.
    pub fn net_id(&self, net: Net) -> ObjectId {
        self.native_id(net.object())
    }

    /// The identifier of a term.
    pub fn term_id(&self, term: Term) -> ObjectId {
        self.native_id(term.object())
    }

    /// The identifier of a module definition.
    pub fn module_id(&self, module: ModuleId) -> ObjectId {
        tagged_id(module.object())
    }

    fn native_id(&self, object: DbObject) -> ObjectId {
        if self.config.hierarchy {
            return tagged_id(object);
        }
        match object.object_type() {
            ObjectType::Inst | ObjectType::Net | ObjectType::BTerm | ObjectType::ITerm => {
                object.seq()
            }
            ObjectType::ModInst
            | ObjectType::ModITerm
            | ObjectType::ModBTerm
            | ObjectType::ModNet
            | ObjectType::Module => fatal(FatalError::HierarchyDisabled(object)),
            ObjectType::Lib | ObjectType::Master | ObjectType::MTerm | ObjectType::Block => {
                fatal(FatalError::Classification {
                    object,
                    expected: "a network object",
                })
            }
        }
    }
}
