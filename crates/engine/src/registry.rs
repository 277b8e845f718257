//! Identity-keyed registry of cell records.
//!
//! Maps displayed items to their [`CellRecord`]s by *reference identity*:
//! two structurally identical items are distinct keys. Backed by a DashMap
//! (sharded writes, lock-free reads) keyed on the item's `Arc` pointer
//! address, with FxHash for cheap integer hashing.
//!
//! # Lifetime and reclamation
//!
//! The displayed collection is externally owned and churns (paging,
//! filtering, refetch). The registry must never be the thing keeping an
//! item alive, and must not grow with "every item ever seen", so each slot
//! holds a `Weak<I>`:
//!
//! - a slot whose item has been dropped is invisible to every lookup;
//! - dead slots are pruned by an amortized sweep every
//!   [`sweep_interval`](CellRegistry::with_sweep_interval) mutating
//!   operations, or eagerly via [`sweep`](CellRegistry::sweep);
//! - a reallocated address over a dead slot is a miss, and the slot is
//!   rebuilt for the new item.
//!
//! Memory therefore tracks the live working set, with a dead-slot window
//! bounded by the sweep interval.
//!
//! # Thread safety
//!
//! `get_or_create` goes through the map's entry API, so overlapping
//! creation requests for one item resolve to a single winner. Creation is
//! rare next to read-heavy rendering; the shard lock is an accepted cost.

use gridstate_core::{CellRecord, Error, Result, SharedRecord};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

type FxBuild = BuildHasherDefault<FxHasher>;

/// Prune dead slots after this many mutating operations, unless overridden.
const DEFAULT_SWEEP_INTERVAL: u64 = 256;

struct Slot<I, V> {
    item: Weak<I>,
    record: SharedRecord<V>,
}

impl<I, V: Clone> Slot<I, V> {
    fn new(item: &Arc<I>, initial: V) -> Self {
        Slot {
            item: Arc::downgrade(item),
            record: SharedRecord::new(CellRecord::new(initial)),
        }
    }

    /// A slot only counts as a hit for the exact item it was created for:
    /// the weak ref must still be live *and* point at the probe's
    /// allocation. A dead weak under a reused address is a miss.
    fn is_live_for(&self, item: &Arc<I>) -> bool {
        self.item
            .upgrade()
            .map(|live| Arc::ptr_eq(&live, item))
            .unwrap_or(false)
    }

    fn is_dead(&self) -> bool {
        self.item.strong_count() == 0
    }
}

/// Identity-keyed concurrent store of cell records.
///
/// Exactly one record exists per distinct live item reference at any time.
pub struct CellRegistry<I, V> {
    slots: DashMap<usize, Slot<I, V>, FxBuild>,
    disposed: AtomicBool,
    /// Mutating ops since creation; drives the amortized sweep.
    ops: AtomicU64,
    sweep_interval: u64,
    created: AtomicU64,
}

fn key_of<I>(item: &Arc<I>) -> usize {
    Arc::as_ptr(item) as usize
}

impl<I, V: Clone> CellRegistry<I, V> {
    /// Create a registry with the default sweep interval.
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// Create a registry pruning dead slots every `interval` mutating ops.
    pub fn with_sweep_interval(interval: u64) -> Self {
        CellRegistry {
            slots: DashMap::with_hasher(FxBuild::default()),
            disposed: AtomicBool::new(false),
            ops: AtomicU64::new(0),
            sweep_interval: interval.max(1),
            created: AtomicU64::new(0),
        }
    }

    /// Get the record for `item`, creating it in `Reading` state on first
    /// sight.
    ///
    /// Idempotent: on a hit the existing record is returned and `initial`
    /// is ignored (first-write-wins). An already-cancelled `token` fails
    /// with [`Error::Cancelled`] before any record is created. Overlapping
    /// calls for the same item never produce two records; the map's entry
    /// section picks a single winner.
    pub fn get_or_create(
        &self,
        item: &Arc<I>,
        initial: V,
        token: &CancellationToken,
    ) -> Result<SharedRecord<V>> {
        self.ensure_live()?;
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.count_op();

        match self.slots.entry(key_of(item)) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live_for(item) {
                    trace!(key = key_of(item), "registry hit");
                    return Ok(occupied.get().record.clone());
                }
                // Address reuse over a dead slot: rebuild for the new item.
                let slot = Slot::new(item, initial);
                let record = slot.record.clone();
                occupied.insert(slot);
                self.created.fetch_add(1, Ordering::Relaxed);
                debug!(key = key_of(item), "registry slot rebuilt after reuse");
                Ok(record)
            }
            Entry::Vacant(vacant) => {
                let slot = Slot::new(item, initial);
                let record = slot.record.clone();
                vacant.insert(slot);
                self.created.fetch_add(1, Ordering::Relaxed);
                debug!(key = key_of(item), "cell record created");
                Ok(record)
            }
        }
    }

    /// Get the record for `item` if one exists and the item is still live.
    pub fn try_get(&self, item: &Arc<I>) -> Option<SharedRecord<V>> {
        let slot = self.slots.get(&key_of(item))?;
        if slot.is_live_for(item) {
            Some(slot.record.clone())
        } else {
            None
        }
    }

    /// Drop the record for `item`. Returns whether a live record existed.
    pub fn remove(&self, item: &Arc<I>) -> bool {
        self.count_op();
        match self.slots.entry(key_of(item)) {
            Entry::Occupied(occupied) => {
                let live = occupied.get().is_live_for(item);
                if live {
                    occupied.remove();
                }
                live
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Prune every slot whose item has been dropped. Returns the number of
    /// slots removed.
    pub fn sweep(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !slot.is_dead());
        let removed = before - self.slots.len();
        if removed > 0 {
            trace!(removed, "registry sweep");
        }
        removed
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_dead()).count()
    }

    /// Whether no live records exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total records created over the registry's lifetime.
    pub fn records_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Drop every record and refuse further creation. Idempotent.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.slots.clear();
            debug!("registry disposed");
        }
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn count_op(&self) {
        let ops = self.ops.fetch_add(1, Ordering::Relaxed) + 1;
        if ops % self.sweep_interval == 0 {
            self.sweep();
        }
    }
}

impl<I, V: Clone> Default for CellRegistry<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, V> std::fmt::Debug for CellRegistry<I, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellRegistry")
            .field("slots", &self.slots.len())
            .field("created", &self.created.load(Ordering::Relaxed))
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}
