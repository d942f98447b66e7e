//! The single-persistent-pointer handle over a relocatable payload
//!
//! A [`StringRef`] is the one place that knows a relocatable payload's
//! current address: the pool rewrites the handle's interior pointer whenever
//! it moves the payload. The handle's own backing store comes from the
//! exact-sized pool, since every handle has the same shape.
//!
//! Handles are created through [`StringRef::create`], which returns an
//! owning [`PooledRef`]. Dropping the `PooledRef` frees the payload and
//! returns the handle storage. Neither type is `Send`: pooled allocations
//! never cross threads.

use std::cell::Cell;
use std::mem;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use super::{
    allocate_exact_sized_object, allocate_relocatable, free_exact_sized_object, free_relocatable,
    relocatable_allocation_size, PAYLOAD_PREFIX_BYTES, POOLED_MAX_VALUE_LENGTH,
};

/// A relocatable payload's registered owner.
pub struct StringRef {
    /// Current payload address; rewritten by the pool on relocation.
    payload: Cell<NonNull<u8>>,
}

impl StringRef {
    /// Allocate a payload holding a copy of `bytes` and return its handle.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is longer than
    /// [`POOLED_MAX_VALUE_LENGTH`](super::POOLED_MAX_VALUE_LENGTH).
    pub fn create(bytes: &[u8]) -> PooledRef {
        assert!(
            bytes.len() <= POOLED_MAX_VALUE_LENGTH,
            "relocatable allocation of {} bytes exceeds the {} byte limit",
            bytes.len(),
            POOLED_MAX_VALUE_LENGTH
        );
        let storage = allocate_exact_sized_object(mem::size_of::<StringRef>());
        let handle = storage.cast::<StringRef>();
        // SAFETY: storage is a fresh, suitably aligned block of the right
        // size; writing initializes it.
        unsafe {
            ptr::write(
                handle.as_ptr(),
                StringRef { payload: Cell::new(NonNull::dangling()) },
            );
        }

        // SAFETY: the referrer lives inside pool-backed storage that stays
        // at a fixed address until PooledRef::drop frees the payload first.
        let payload = unsafe {
            let referrer = NonNull::from(&handle.as_ref().payload);
            allocate_relocatable(referrer, bytes.len() as u32)
        };
        // SAFETY: the payload has room for `bytes` after the size prefix.
        unsafe {
            ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                payload.as_ptr().add(PAYLOAD_PREFIX_BYTES),
                bytes.len(),
            );
        }

        PooledRef { handle }
    }

    /// Logical length of the payload in bytes, read from the size prefix.
    pub fn len(&self) -> usize {
        // SAFETY: the prefix of a live payload is always initialized.
        unsafe { ptr::read_unaligned(self.payload.get().as_ptr() as *const u32) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the payload bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        // SAFETY: no pool operation can run during the copy on this thread.
        unsafe { self.as_bytes().to_vec() }
    }

    /// Borrow the payload bytes in place.
    ///
    /// # Safety
    ///
    /// The payload may be relocated by any free in its size class. The
    /// caller must not free or allocate relocatable payloads while the
    /// returned slice is alive.
    pub unsafe fn as_bytes(&self) -> &[u8] {
        let data = self.payload.get().as_ptr().add(PAYLOAD_PREFIX_BYTES);
        std::slice::from_raw_parts(data, self.len())
    }

    /// The rounded-up footprint this payload's size class allocates.
    pub fn allocated_footprint(&self) -> usize {
        // SAFETY: the payload is live while the handle exists.
        unsafe { relocatable_allocation_size(self.payload.get()) }
    }
}

impl Drop for StringRef {
    fn drop(&mut self) {
        // SAFETY: the handle owns exactly one live payload.
        unsafe { free_relocatable(self.payload.get()) };
    }
}

/// Owning pointer to a pool-backed [`StringRef`].
pub struct PooledRef {
    handle: NonNull<StringRef>,
}

impl Deref for PooledRef {
    type Target = StringRef;

    fn deref(&self) -> &StringRef {
        // SAFETY: the handle storage is live until this PooledRef drops.
        unsafe { self.handle.as_ref() }
    }
}

impl Drop for PooledRef {
    fn drop(&mut self) {
        // SAFETY: drops the StringRef in place (freeing its payload), then
        // returns the handle storage to its exact-sized pool.
        unsafe {
            ptr::drop_in_place(self.handle.as_ptr());
            free_exact_sized_object(mem::size_of::<StringRef>(), self.handle.cast());
        }
    }
}

impl std::fmt::Debug for PooledRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledRef")
            .field("len", &self.len())
            .field("footprint", &self.allocated_footprint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{pool_live_allocation_count, PoolHandle, ScopedDeferredRelease};
    use super::*;

    #[test]
    fn test_create_read_drop() {
        let _holder = PoolHandle::new();
        let baseline = pool_live_allocation_count();

        let payload = StringRef::create(b"hello, pooled world");
        // One handle from the exact pool, one payload from the compacting pool
        assert_eq!(pool_live_allocation_count(), baseline + 2);
        assert_eq!(payload.len(), 19);
        assert_eq!(payload.to_vec(), b"hello, pooled world");

        drop(payload);
        assert_eq!(pool_live_allocation_count(), baseline);
    }

    #[test]
    fn test_handles_survive_relocation() {
        let _holder = PoolHandle::new();
        let refs: Vec<PooledRef> = (0..16)
            .map(|i| StringRef::create(format!("payload-{:02}", i).as_bytes()))
            .collect();

        // Free a middle run, relocating tails into the holes
        let survivors: Vec<PooledRef> = refs
            .into_iter()
            .enumerate()
            .filter_map(|(i, r)| (i % 3 != 0).then_some(r))
            .collect();

        for (slot, r) in survivors.iter().enumerate() {
            let expect = survivors_expected(slot);
            assert_eq!(r.to_vec(), expect.as_bytes());
        }
    }

    fn survivors_expected(slot: usize) -> String {
        let kept: Vec<usize> = (0..16).filter(|i| i % 3 != 0).collect();
        format!("payload-{:02}", kept[slot])
    }

    #[test]
    fn test_mass_drop_under_deferred_release() {
        let _holder = PoolHandle::new();
        let baseline = pool_live_allocation_count();

        let refs: Vec<PooledRef> =
            (0..32).map(|i| StringRef::create(&[i as u8; 40])).collect();
        let keeper = StringRef::create(b"keeper");

        {
            let _guard = ScopedDeferredRelease::new();
            drop(refs);
        }

        assert_eq!(keeper.to_vec(), b"keeper");
        assert_eq!(pool_live_allocation_count(), baseline + 2);
    }

    #[test]
    fn test_empty_payload() {
        let _holder = PoolHandle::new();
        let empty = StringRef::create(b"");
        assert!(empty.is_empty());
        assert_eq!(empty.to_vec(), Vec::<u8>::new());
    }
}
