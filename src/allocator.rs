//! The allocator boundary.
//!
//! Every byte of heap memory a [`PodVec`](crate::PodVec) touches flows
//! through the two-operation [`PodAlloc`] capability. The default
//! [`SysAlloc`] forwards to the global allocator; [`CountingAlloc`] wraps it
//! with per-value call counters for leak verification in tests and
//! instrumented builds.

use alloc::rc::Rc;
use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

/// A minimal, substitutable allocate/release interface.
///
/// Allocation failure is fatal: implementations abort (via
/// [`handle_alloc_error`](alloc::alloc::handle_alloc_error) or equivalent)
/// rather than report a recoverable error, so callers never see a partial
/// state. Zero-sized layouts must be served without touching the underlying
/// memory source.
pub trait PodAlloc {
    /// Allocates a block for `layout`, aborting the process on failure.
    ///
    /// For zero-sized layouts the returned pointer is a well-aligned
    /// dangling pointer that must not be dereferenced.
    fn allocate(&mut self, layout: Layout) -> NonNull<u8>;

    /// Releases a block previously returned by [`allocate`](Self::allocate).
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate` on this value (or a clone
    /// sharing its state) with the same `layout`, and must not be used
    /// afterwards.
    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout);
}

/// The default allocator: forwards to the global allocator and aborts on
/// failure.
///
/// # Examples
///
/// ```
/// use podvec::{PodVec, SysAlloc};
///
/// let vec: PodVec<u32, 8> = PodVec::new_in(SysAlloc);
/// assert_eq!(vec.capacity(), 8);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SysAlloc;

impl PodAlloc for SysAlloc {
    fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        if layout.size() == 0 {
            // Zero-sized layouts never reach the system allocator.
            // SAFETY: alignments are non-zero powers of two.
            return unsafe { NonNull::new_unchecked(layout.align() as *mut u8) };
        }
        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { alloc::alloc::alloc(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => alloc::alloc::handle_alloc_error(layout),
        }
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            // SAFETY: per the trait contract, `ptr` came from `allocate`
            // with this exact layout.
            unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

/// An instrumented allocator that counts allocate and release calls.
///
/// Clones share their counters, so the value handed to a container keeps
/// reporting after the container takes ownership. The counters are owned by
/// the value (not process-wide), so parallel tests don't interfere.
///
/// # Examples
///
/// ```
/// use podvec::{CountingAlloc, PodVec};
///
/// let counting = CountingAlloc::new();
/// {
///     let mut vec: PodVec<u32, 4, 0, CountingAlloc> =
///         PodVec::new_in(counting.clone());
///     vec.extend([1, 2, 3, 4, 5]);
///     assert_eq!(counting.allocations(), 1);
/// }
/// // Dropping the vector released the one heap buffer.
/// assert!(counting.balanced());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CountingAlloc {
    counters: Rc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    allocations: Cell<usize>,
    releases: Cell<usize>,
}

impl CountingAlloc {
    /// Creates a counting allocator with both counters at zero.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `allocate` calls seen so far.
    #[inline]
    pub fn allocations(&self) -> usize {
        self.counters.allocations.get()
    }

    /// Total number of `release` calls seen so far.
    #[inline]
    pub fn releases(&self) -> usize {
        self.counters.releases.get()
    }

    /// Returns `true` when every allocation has been matched by a release.
    #[inline]
    pub fn balanced(&self) -> bool {
        self.allocations() == self.releases()
    }
}

impl PodAlloc for CountingAlloc {
    fn allocate(&mut self, layout: Layout) -> NonNull<u8> {
        self.counters
            .allocations
            .set(self.counters.allocations.get() + 1);
        SysAlloc.allocate(layout)
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        self.counters.releases.set(self.counters.releases.get() + 1);
        // SAFETY: forwarded contract.
        unsafe { SysAlloc.release(ptr, layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sys_alloc_round_trip() {
        let mut alloc = SysAlloc;
        let layout = Layout::array::<u64>(32).unwrap();
        let ptr = alloc.allocate(layout);
        unsafe {
            ptr.as_ptr().cast::<u64>().write(7);
            assert_eq!(ptr.as_ptr().cast::<u64>().read(), 7);
            alloc.release(ptr, layout);
        }
    }

    #[test]
    fn zero_sized_layout_skips_the_allocator() {
        let counting = CountingAlloc::new();
        let mut alloc = counting.clone();
        let layout = Layout::array::<u64>(0).unwrap();
        let ptr = alloc.allocate(layout);
        assert_eq!(ptr.as_ptr() as usize, layout.align());
        unsafe { alloc.release(ptr, layout) };
        // The calls are counted even though no memory moved.
        assert_eq!(counting.allocations(), 1);
        assert!(counting.balanced());
    }

    #[test]
    fn clones_share_counters() {
        let counting = CountingAlloc::new();
        let mut a = counting.clone();
        let mut b = counting.clone();
        let layout = Layout::array::<u8>(16).unwrap();
        let p = a.allocate(layout);
        unsafe { b.release(p, layout) };
        assert_eq!(counting.allocations(), 1);
        assert_eq!(counting.releases(), 1);
    }
}
