//! Raw page allocations backing the thread-local pools

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Alignment for every pool page and therefore every carved slot.
pub(super) const SLOT_ALIGN: usize = 16;

/// One contiguous allocation owned by a pool. Pages are only handed back to
/// the allocator when the owning pool is torn down.
pub(super) struct RawPage {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawPage {
    /// Allocate a page of `bytes` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is zero or exceeds isize::MAX when rounded up.
    pub(super) fn new(bytes: usize) -> RawPage {
        assert!(bytes > 0, "page size must be greater than 0");
        let layout = Layout::from_size_align(bytes, SLOT_ALIGN).expect("invalid page layout");
        // SAFETY: layout has non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            alloc::handle_alloc_error(layout);
        };
        RawPage { ptr, layout }
    }

    /// Base address of the page.
    #[inline]
    pub(super) fn base(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Size of the page in bytes.
    #[inline]
    pub(super) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Pointer to the slot at `offset` bytes into the page.
    ///
    /// # Panics
    ///
    /// Debug-asserts that the offset stays inside the page.
    #[inline]
    pub(super) fn slot(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset < self.layout.size());
        // SAFETY: offset is within the allocation.
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    /// True if `addr` falls inside this page.
    #[inline]
    pub(super) fn contains(&self, addr: usize) -> bool {
        addr >= self.base() && addr < self.base() + self.layout.size()
    }
}

impl Drop for RawPage {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with this layout and is only freed here.
        unsafe {
            alloc::dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}
