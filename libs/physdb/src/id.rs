//! Typed sequence numbers and the tables that allocate them.

use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{DbObject, ObjectType};

/// A database object kind with a fixed native type tag.
pub trait DbObjectKind {
    /// The native type recorded on every object of this kind.
    const TYPE: ObjectType;
}

/// The sequence number of a database object of kind `T`.
///
/// Sequence numbers are scoped per kind and start at 1.
/// Freed sequence numbers are handed out again by later allocations,
/// so an ID must not be used after its object has been destroyed.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T>(u64, #[serde(skip)] PhantomData<T>);

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = std::any::type_name::<T>();
        let kind = kind.rsplit("::").next().unwrap_or(kind);
        write!(f, "{}#{}", kind, self.0)
    }
}

impl<T: DbObjectKind> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", T::TYPE.prefix(), self.0)
    }
}

impl<T> Id<T> {
    /// Creates an ID from a raw sequence number.
    ///
    /// The ID is only meaningful if an object with this sequence number exists.
    #[inline]
    pub const fn from_raw(seq: u64) -> Self {
        Self(seq, PhantomData)
    }

    /// The native sequence number.
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.0
    }
}

impl<T: DbObjectKind> Id<T> {
    /// The untyped handle for this object.
    #[inline]
    pub fn object(self) -> DbObject {
        DbObject::new(T::TYPE, self.0)
    }
}

/// Storage for objects of one kind, in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Table<T> {
    items: IndexMap<Id<T>, T>,
    /// Sequence numbers released by [`Table::remove`], reused smallest first.
    free: BTreeSet<u64>,
    /// The largest sequence number handed out so far.
    last: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            free: BTreeSet::new(),
            last: 0,
        }
    }
}

impl<T> Table<T> {
    pub(crate) fn insert(&mut self, item: T) -> Id<T> {
        let seq = match self.free.pop_first() {
            Some(seq) => seq,
            None => {
                self.last += 1;
                self.last
            }
        };
        let id = Id::from_raw(seq);
        self.items.insert(id, item);
        id
    }

    pub(crate) fn remove(&mut self, id: Id<T>) -> Option<T> {
        let item = self.items.shift_remove(&id)?;
        self.free.insert(id.0);
        Some(item)
    }

    #[inline]
    pub(crate) fn get(&self, id: Id<T>) -> Option<&T> {
        self.items.get(&id)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    #[inline]
    pub(crate) fn contains(&self, id: Id<T>) -> bool {
        self.items.contains_key(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
