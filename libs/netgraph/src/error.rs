//! Fatal invariant violations.

use physdb::{DbObject, ObjectType};
use thiserror::Error;
use timinglib::PortDirection;

/// A broken invariant of the network.
///
/// These are never returned to callers. They are passed to [`fatal`],
/// which logs them and panics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FatalError {
    /// A native sequence number is too large to encode as an object ID.
    #[error("database id exceeds capacity: {kind:?} sequence number {seq}")]
    IdOverflow {
        /// The native kind of the object.
        kind: ObjectType,
        /// The offending sequence number.
        seq: u64,
    },
    /// A native object could not be classified as the requested logical kind.
    #[error("{object} ({:?}) is not {expected}", .object.object_type())]
    Classification {
        /// The native object.
        object: DbObject,
        /// The logical kind that was requested.
        expected: &'static str,
    },
    /// A module object was used while hierarchy is disabled.
    #[error("{0} is part of the module hierarchy, which is disabled")]
    HierarchyDisabled(DbObject),
    /// A network function with no implementation was called.
    #[error("unimplemented network function {0}")]
    Unimplemented(&'static str),
    /// A port direction has no signal/IO type equivalent.
    #[error("unhandled port direction {0}")]
    UnmappableDirection(PortDirection),
    /// An operation required a design block but none is loaded.
    #[error("no design block is loaded")]
    NoBlock,
}

/// Logs a fatal error, then panics.
#[track_caller]
pub(crate) fn fatal(err: FatalError) -> ! {
    tracing::error!("{err}");
    panic!("{err}");
}
