//! Load state and load notifications.

use arcstr::ArcStr;
use indexmap::IndexMap;
use physdb::Database;
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

use crate::library::{LibraryId, LibraryStore, TimingLibId};
use crate::Network;

/// The load state of a [`Network`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    generation: u64,
    design_loaded: bool,
}

impl NetworkState {
    /// The number of design loads since the network was created.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` once a design has been loaded and not torn down.
    #[inline]
    pub fn design_loaded(&self) -> bool {
        self.design_loaded
    }
}

/// A notification sent to [`NetworkObserver`]s after a load completes.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum LoadEvent {
    /// A physical library was loaded.
    Library {
        /// The logical library built from it.
        library: LibraryId,
        /// The library name.
        name: ArcStr,
    },
    /// A timing library was loaded and linked.
    TimingLibrary {
        /// The loaded library.
        library: TimingLibId,
        /// The library name.
        name: ArcStr,
    },
    /// A design was loaded or reloaded.
    Design {
        /// The design name.
        name: ArcStr,
        /// The generation after the load.
        generation: u64,
    },
    /// The network and its database were cleared.
    Teardown,
}

/// Receives [`LoadEvent`]s from a [`Network`].
pub trait NetworkObserver {
    /// Called after each load completes.
    fn on_load(&mut self, event: &LoadEvent);
}

impl<F: FnMut(&LoadEvent)> NetworkObserver for F {
    fn on_load(&mut self, event: &LoadEvent) {
        self(event)
    }
}

/// A handle identifying a registered [`NetworkObserver`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ObserverKey(u64);

#[derive(Default)]
pub(crate) struct Observers {
    next: u64,
    entries: IndexMap<ObserverKey, Box<dyn NetworkObserver>>,
}

impl Observers {
    fn insert(&mut self, observer: Box<dyn NetworkObserver>) -> ObserverKey {
        self.next += 1;
        let key = ObserverKey(self.next);
        self.entries.insert(key, observer);
        key
    }

    fn remove(&mut self, key: ObserverKey) -> Option<Box<dyn NetworkObserver>> {
        self.entries.shift_remove(&key)
    }

    fn notify(&mut self, event: &LoadEvent) {
        for observer in self.entries.values_mut() {
            observer.on_load(event);
        }
    }
}

impl Network {
    /// Registers an observer to be notified after every load.
    pub fn add_observer(&mut self, observer: impl NetworkObserver + 'static) -> ObserverKey {
        self.observers.insert(Box::new(observer))
    }

    /// Unregisters an observer, returning it if it was registered.
    pub fn remove_observer(&mut self, key: ObserverKey) -> Option<Box<dyn NetworkObserver>> {
        self.observers.remove(key)
    }

    pub(crate) fn notify(&mut self, event: LoadEvent) {
        tracing::debug!(?event, "network load complete");
        self.observers.notify(&event);
    }

    pub(crate) fn bump_generation(&mut self) -> u64 {
        self.state.generation += 1;
        self.state.design_loaded = true;
        self.state.generation
    }

    /// Replaces the database and builds the network over it.
    ///
    /// Every physical library is loaded, followed by the design if the
    /// database has a block. Previously built libraries are discarded.
    /// Loaded timing libraries are kept and relinked.
    pub fn read_db(&mut self, db: Database) {
        let span = span!(Level::INFO, "reading database");
        let _guard = span.enter();

        self.db = db;
        self.libs = LibraryStore::default();
        self.issues.clear();
        self.constants.clear();
        self.clear_drivers();
        self.state.design_loaded = false;

        let libs: Vec<_> = self.db.libs().map(|(id, _)| id).collect();
        for lib in libs {
            self.read_lef_after(lib);
        }
        for i in 0..self.timing.len() {
            self.record_timing_masters(TimingLibId(i));
        }
        if self.db.block().is_some() {
            self.read_def_after();
        }
    }

    /// Rebuilds the design view after the block was changed outside the network.
    ///
    /// Does nothing if no block exists.
    pub fn reload(&mut self) {
        if self.db.block().is_none() {
            tracing::warn!("reload requested with no design block");
            return;
        }
        self.read_def_after();
    }

    /// Clears the network and its database.
    ///
    /// The configuration and registered observers are kept.
    pub fn teardown(&mut self) {
        self.db = Database::new();
        self.timing.clear();
        self.libs = LibraryStore::default();
        self.issues.clear();
        self.constants.clear();
        self.clear_drivers();
        self.state.design_loaded = false;
        self.notify(LoadEvent::Teardown);
    }
}
