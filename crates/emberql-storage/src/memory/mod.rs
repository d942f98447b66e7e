//! Thread-local pooled memory for query execution
//!
//! A wrapper around a set of pools local to the current thread. Two
//! allocation disciplines are offered:
//!
//! - exact-sized object pools for fixed-shape structures that are allocated
//!   and freed in volume ([`allocate_exact_sized_object`]);
//! - compacting pools for variable-length payloads referenced through a
//!   single persistent pointer ([`allocate_relocatable`]), which relocate
//!   payloads to keep each size class contiguous.
//!
//! The pools have no locks and no cross-thread sharing: a payload allocated
//! on a thread must be freed on that thread. Some [`PoolHandle`] must be
//! kept alive on the thread's stack to guarantee initialization and
//! teardown; handles are reference counted and the thread state is freed
//! when the last one drops.
//!
//! Freeing normally compacts eagerly. Wrapping a region in
//! [`ScopedDeferredRelease`] batches the frees instead: freed payloads are
//! tombstoned and reclaimed when the guard drops, which avoids copying
//! payloads that are about to be freed anyway during bulk deletion.

mod compacting;
mod exact;
mod page;
mod string_ref;

pub use compacting::{PAYLOAD_PREFIX_BYTES, POOLED_MAX_VALUE_LENGTH};
pub use string_ref::{PooledRef, StringRef};

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

use compacting::CompactingPools;
use exact::ExactSizedPool;

struct ThreadPoolState {
    refs: usize,
    exact: HashMap<usize, ExactSizedPool>,
    compacting: CompactingPools,
    deferred: bool,
    /// Tombstoned allocations pending bulk release, ordered by size class
    /// then address.
    deferred_set: BTreeSet<(usize, usize)>,
}

impl ThreadPoolState {
    fn new() -> ThreadPoolState {
        ThreadPoolState {
            refs: 0,
            exact: HashMap::new(),
            compacting: CompactingPools::new(),
            deferred: false,
            deferred_set: BTreeSet::new(),
        }
    }

    fn live_allocations(&self) -> usize {
        let exact: usize = self.exact.values().map(|p| p.live_count()).sum();
        exact + self.compacting.live_count()
    }
}

thread_local! {
    static POOLS: RefCell<Option<ThreadPoolState>> = const { RefCell::new(None) };
}

fn with_state<R>(f: impl FnOnce(&mut ThreadPoolState) -> R) -> R {
    POOLS.with(|cell| {
        let mut state = cell.borrow_mut();
        f(state.get_or_insert_with(ThreadPoolState::new))
    })
}

/// Reference-counted scoped holder of the thread's pool state.
///
/// The first handle on a thread initializes the state lazily; dropping the
/// last handle tears it down and returns every page. Creating multiple
/// handles is fine. All allocations must be freed before the last handle on
/// the thread drops.
#[derive(Debug)]
pub struct PoolHandle {
    _not_send: PhantomData<*mut u8>,
}

impl PoolHandle {
    pub fn new() -> PoolHandle {
        with_state(|state| state.refs += 1);
        PoolHandle { _not_send: PhantomData }
    }
}

impl Default for PoolHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PoolHandle {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        POOLS.with(|cell| {
            let mut slot = cell.borrow_mut();
            let last = {
                let state = slot.as_mut().expect("pool state exists while a handle lives");
                state.refs -= 1;
                state.refs == 0
            };
            if last {
                let state = slot.take().expect("checked above");
                debug_assert_eq!(
                    state.live_allocations(),
                    0,
                    "thread pools torn down with live allocations"
                );
                trace!("thread pool state torn down");
                drop(state);
            }
        });
    }
}

/// Allocate a block from a page of objects of the requested exact size.
///
/// Each new size splinters off its own pool of pages of that size. The
/// returned block is uninitialized.
pub fn allocate_exact_sized_object(size: usize) -> NonNull<u8> {
    with_state(|state| {
        state
            .exact
            .entry(size)
            .or_insert_with(|| ExactSizedPool::new(size))
            .allocate()
    })
}

/// Return a block obtained from [`allocate_exact_sized_object`].
///
/// # Safety
///
/// `object` must have been returned by `allocate_exact_sized_object(size)`
/// on this thread with the same `size`, and must not be used afterwards.
pub unsafe fn free_exact_sized_object(size: usize, object: NonNull<u8>) {
    with_state(|state| {
        state
            .exact
            .get_mut(&size)
            .expect("free of a size this thread never allocated")
            .free(object)
    })
}

/// Aggregate bytes currently reserved by this thread's pools, including
/// unused slack in partially filled pages.
pub fn pool_allocation_size() -> usize {
    with_state(|state| {
        let exact: usize = state.exact.values().map(|p| p.reserved_bytes()).sum();
        exact + state.compacting.reserved_bytes()
    })
}

/// Allocations currently outstanding on this thread, both disciplines.
/// Tombstoned payloads count until their deferred batch drains.
pub fn pool_live_allocation_count() -> usize {
    with_state(|state| state.live_allocations())
}

/// Allocate a relocatable payload of `size` user bytes.
///
/// The payload is prefixed with its logical size; the returned pointer
/// addresses the prefix and user bytes start [`PAYLOAD_PREFIX_BYTES`] in.
/// The pool writes the payload's current address through `referrer` now and
/// again every time the payload is relocated.
///
/// # Safety
///
/// `referrer` must remain valid at a stable address until the payload is
/// freed. There can be only this one persistent pointer to the payload.
///
/// # Panics
///
/// Panics if `size` exceeds [`POOLED_MAX_VALUE_LENGTH`]; callers are
/// expected to guard against this fatal condition.
pub unsafe fn allocate_relocatable(referrer: NonNull<Cell<NonNull<u8>>>, size: u32) -> NonNull<u8> {
    // SAFETY: forwarded from this function's contract.
    with_state(|state| unsafe { state.compacting.allocate(referrer, size) })
}

/// The rounded-up footprint allocated for a relocatable payload.
///
/// # Safety
///
/// `payload` must be a live allocation from [`allocate_relocatable`].
pub unsafe fn relocatable_allocation_size(payload: NonNull<u8>) -> usize {
    compacting::payload_footprint(payload)
}

/// Free a payload obtained from [`allocate_relocatable`].
///
/// In immediate mode this compacts the payload's size class, which can have
/// the side effect of relocating some other allocation of the class. In
/// deferred mode the payload is only tombstoned; it is reclaimed when the
/// enclosing [`ScopedDeferredRelease`] drops.
///
/// # Safety
///
/// `payload` must be a live allocation from this thread's pool, freed at
/// most once, with no reads through its referrer afterwards.
pub unsafe fn free_relocatable(payload: NonNull<u8>) {
    // SAFETY: forwarded from this function's contract.
    with_state(|state| unsafe {
        if state.deferred {
            let footprint = compacting::payload_footprint(payload);
            state.deferred_set.insert((footprint, payload.as_ptr() as usize));
        } else {
            state.compacting.free_immediate(payload);
        }
    })
}

/// Switch the thread to deferred release mode for the current scope.
///
/// On entry the mode flips to deferred unless it already was. On exit the
/// guard that flipped it restores immediate mode and then drains the
/// tombstone set, highest size class and address first, so relocations
/// during the drain never target a still-tombstoned slot. Drop runs on
/// every exit path, so the mode survives unwinding.
pub struct ScopedDeferredRelease {
    flipped: bool,
    _not_send: PhantomData<*mut u8>,
}

impl ScopedDeferredRelease {
    pub fn new() -> ScopedDeferredRelease {
        let flipped = with_state(|state| {
            if state.deferred {
                false
            } else {
                state.deferred = true;
                true
            }
        });
        ScopedDeferredRelease { flipped, _not_send: PhantomData }
    }
}

impl Default for ScopedDeferredRelease {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedDeferredRelease {
    fn drop(&mut self) {
        if !self.flipped {
            return;
        }
        with_state(|state| {
            // Restore the prior mode first: the drain itself must compact.
            state.deferred = false;
            let tombstones = state.deferred_set.len();
            // Highest size class first; the class drains its own tombstones
            // top slot downwards.
            while let Some(&(footprint, _)) = state.deferred_set.iter().next_back() {
                let addrs: Vec<usize> = state
                    .deferred_set
                    .range((footprint, 0)..=(footprint, usize::MAX))
                    .map(|&(_, addr)| addr)
                    .collect();
                for &addr in &addrs {
                    state.deferred_set.remove(&(footprint, addr));
                }
                // SAFETY: only live payloads of this thread enter the set,
                // and each entry is drained exactly once.
                unsafe { state.compacting.drain_class(footprint, &addrs) };
            }
            if tombstones > 0 {
                trace!(tombstones, "deferred release drained");
            }
        });
    }
}
