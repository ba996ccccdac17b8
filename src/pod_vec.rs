use core::alloc::Layout;
use core::{
    fmt,
    iter::FusedIterator,
    mem::MaybeUninit,
    ptr::{self, NonNull},
    slice,
};

use crate::allocator::{PodAlloc, SysAlloc};
use crate::utils::{cold_path, split_range_bound};

/// Which buffer currently backs the element run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Active {
    Inline,
    Heap,
}

/// The storage selector's verdict for a desired capacity.
///
/// A `Heap` verdict carries a buffer that is *not yet active*: the caller
/// moves the elements across and commits the switch afterwards, so the old
/// run stays intact until the copy is done.
enum Chosen<T> {
    /// The currently active buffer already fits.
    Current,
    /// Revert to the inline region; the heap buffer is retained for reuse.
    Inline,
    /// Move into this heap buffer (freshly allocated or pre-warmed).
    Heap(NonNull<T>, usize),
}

/// Extra slots granted on first promotion to the heap, so a single push
/// right after crossing the inline boundary does not reallocate again.
const PROMOTE_SLACK: usize = 4;

/// A vector that stores up to `N` elements inline and transparently spills
/// to a heap buffer past that, restricted to trivially copyable elements.
///
/// The `T: Copy` bound is what licenses the implementation: every
/// relocation, whether a growth step or a buffer switch, is a flat byte
/// copy with no per-element construction or destruction.
///
/// `R` is the revert-to-inline low-water mark (see the
/// [crate docs](crate#hysteresis)); it must not exceed `N + 1`, which is
/// checked at compile time. With the default `R = 0` the vector never
/// reverts implicitly. `A` is the [allocator boundary](crate::allocator)
/// through which all heap memory flows.
///
/// # Panics
/// Out-of-range indices and malformed ranges panic. Allocation failure
/// aborts the process; there is no recoverable-error channel.
///
/// # Examples
///
/// ```
/// use podvec::PodVec;
///
/// let mut vec: PodVec<u64, 8> = PodVec::new();
/// assert_eq!(vec.capacity(), 8);
///
/// vec.push(1);
/// vec.push(2);
/// assert_eq!(vec, [1, 2]);
/// assert!(vec.is_inline());
///
/// // Spills to the heap only when the inline capacity is exceeded.
/// vec.extend(3..=9);
/// assert!(!vec.is_inline());
/// assert_eq!(vec.len(), 9);
/// ```
pub struct PodVec<T: Copy, const N: usize, const R: usize = 0, A: PodAlloc = SysAlloc> {
    active: Active,
    len: usize,
    inline: [MaybeUninit<T>; N],
    /// Null until the first promotion; may be non-null while inactive
    /// (pre-warmed by `reserve`, or retained across a hysteresis reversion).
    heap: *mut T,
    heap_cap: usize,
    alloc: A,
}

unsafe impl<T: Copy + Send, const N: usize, const R: usize, A: PodAlloc + Send> Send
    for PodVec<T, N, R, A>
{
}
unsafe impl<T: Copy + Sync, const N: usize, const R: usize, A: PodAlloc + Sync> Sync
    for PodVec<T, N, R, A>
{
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> Drop for PodVec<T, N, R, A> {
    fn drop(&mut self) {
        // The inline region needs no action; only the heap buffer is owned.
        self.release_heap();
    }
}

/// Creates a [`PodVec`] containing the arguments.
///
/// The syntax is similar to [`vec!`](https://doc.rust-lang.org/std/macro.vec.html);
/// the inline capacity comes from the target type.
///
/// # Examples
///
/// ```
/// # use podvec::{podvec, PodVec};
/// let vec: PodVec<i64, 10> = podvec![];
/// let vec: PodVec<i64, 10> = podvec![1; 5];
/// let vec: PodVec<_, 10> = podvec![1, 2, 3, 4];
/// ```
#[macro_export]
macro_rules! podvec {
    [] => { $crate::PodVec::new() };
    [$elem:expr; $n:expr] => { $crate::PodVec::from_elem($elem, $n) };
    [$($item:expr),+ $(,)?] => { $crate::PodVec::from_buf([ $($item),+ ]) };
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> PodVec<T, N, R, A> {
    /// Evaluated at monomorphization; rejects an over-wide hysteresis band.
    const REVERT_BOUND: () = assert!(
        R <= N + 1,
        "the revert-to-inline size shouldn't exceed the inline capacity by more than one"
    );

    /// Constructs a new, empty `PodVec` holding the given allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{PodVec, SysAlloc};
    /// let vec: PodVec<u32, 8> = PodVec::new_in(SysAlloc);
    /// assert!(vec.is_empty());
    /// ```
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        let () = Self::REVERT_BOUND;
        Self {
            active: Active::Inline,
            len: 0,
            inline: Self::uninit_inline(),
            heap: ptr::null_mut(),
            heap_cap: 0,
            alloc,
        }
    }

    /// Constructs a new, empty `PodVec`.
    ///
    /// The inline capacity is part of the type; no heap memory is touched.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::PodVec;
    /// let vec: PodVec<u32, 8> = PodVec::new();
    /// assert_eq!(vec.capacity(), 8);
    /// ```
    #[inline]
    pub fn new() -> Self
    where
        A: Default,
    {
        Self::new_in(A::default())
    }

    /// Constructs an empty `PodVec` able to hold `capacity` elements.
    ///
    /// When `capacity` fits inline this is equivalent to [`new`](Self::new).
    /// With a non-zero `R` the allocated heap buffer is held as a pre-warm
    /// and the inline region stays active until the size actually demands
    /// the switch.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self
    where
        A: Default,
    {
        Self::with_capacity_in(capacity, A::default())
    }

    /// Like [`with_capacity`](Self::with_capacity) with an explicit allocator.
    #[inline]
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut vec = Self::new_in(alloc);
        vec.reserve(capacity);
        vec
    }

    /// Creates a `PodVec` from an array, spilling to the heap if the array
    /// is longer than the inline capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::PodVec;
    /// let vec: PodVec<i32, 5> = PodVec::from_buf([1, 2, 3]);
    /// assert_eq!(vec.len(), 3);
    /// assert!(vec.is_inline());
    /// ```
    #[inline]
    pub fn from_buf<const P: usize>(arr: [T; P]) -> Self
    where
        A: Default,
    {
        let mut vec = Self::new();
        let dst = vec.prepare_assign(P);
        unsafe {
            ptr::copy_nonoverlapping(arr.as_ptr(), dst, P);
        }
        vec.len = P;
        vec
    }

    /// Creates a `PodVec` with `count` copies of `elem`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::PodVec;
    /// let vec: PodVec<i32, 5> = PodVec::from_elem(1, 4);
    /// assert_eq!(vec, [1, 1, 1, 1]);
    /// ```
    #[inline]
    pub fn from_elem(elem: T, count: usize) -> Self
    where
        A: Default,
    {
        let mut vec = Self::new();
        vec.assign(count, elem);
        vec
    }

    /// Returns the number of elements in the vector.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector contains no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the currently active buffer.
    ///
    /// This is `N` while the inline region is active, and the heap buffer's
    /// capacity otherwise. A pre-warmed heap buffer held by `reserve` does
    /// not show up here until it becomes active.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        match self.active {
            Active::Inline => N,
            Active::Heap => self.heap_cap,
        }
    }

    /// Returns `true` while the elements live in the inline region.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<i32, 2> = podvec![1, 2];
    /// assert!(vec.is_inline());
    ///
    /// vec.push(3);
    /// assert!(!vec.is_inline());
    /// ```
    #[inline(always)]
    pub const fn is_inline(&self) -> bool {
        matches!(self.active, Active::Inline)
    }

    /// Returns a copy of the held allocator value.
    #[inline]
    pub fn allocator(&self) -> A
    where
        A: Clone,
    {
        self.alloc.clone()
    }

    /// Returns a raw pointer to the active buffer.
    ///
    /// The pointer is invalidated by any operation that switches or
    /// reallocates the buffer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.active_ptr()
    }

    /// Returns a raw mutable pointer to the active buffer.
    ///
    /// The pointer is invalidated by any operation that switches or
    /// reallocates the buffer.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.active_mut_ptr()
    }

    /// Extracts a slice containing the entire vector.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots of the active buffer are initialized.
        unsafe { slice::from_raw_parts(self.active_ptr(), self.len) }
    }

    /// Extracts a mutable slice containing the entire vector.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        // SAFETY: the first `len` slots of the active buffer are initialized.
        unsafe { slice::from_raw_parts_mut(self.active_mut_ptr(), len) }
    }

    /// Forces the length of the vector to `new_len`.
    ///
    /// # Safety
    /// - `new_len` must not exceed [`capacity()`](Self::capacity).
    /// - Elements below `new_len` must have been initialized (e.g. through
    ///   [`spare_capacity_mut`](Self::spare_capacity_mut)).
    #[inline(always)]
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity());
        self.len = new_len;
    }

    /// Returns the spare capacity of the active buffer as uninitialized
    /// slots, for raw filling followed by [`set_len`](Self::set_len).
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::PodVec;
    /// let mut vec: PodVec<u32, 8> = PodVec::new();
    ///
    /// let spare = vec.spare_capacity_mut();
    /// spare[0].write(10);
    /// spare[1].write(20);
    /// unsafe { vec.set_len(2) };
    ///
    /// assert_eq!(vec, [10, 20]);
    /// ```
    #[inline]
    pub fn spare_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
        let cap = self.capacity();
        let len = self.len;
        let base = self.active_mut_ptr() as *mut MaybeUninit<T>;
        // SAFETY: `[len, cap)` lies inside the active buffer.
        unsafe { slice::from_raw_parts_mut(base.add(len), cap - len) }
    }

    /// Appends an element to the back of the vector, spilling to the heap
    /// when the active buffer is full.
    ///
    /// # Time complexity
    /// Amortized O(1); O(len) when the buffer switches or grows.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 2];
    /// vec.push(3);
    /// assert_eq!(vec, [1, 2, 3]);
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        let gap = self.grow_at(self.len, 1);
        // SAFETY: `grow_at` opened one slot at the end.
        unsafe { ptr::write(gap, value) };
    }

    /// Removes the last element and returns it, or `None` if empty.
    ///
    /// This is a plain length cut: it never switches buffers, so a
    /// heap-backed vector stays heap-backed no matter how far it pops. The
    /// splice operations ([`remove`](Self::remove),
    /// [`remove_range`](Self::remove_range)) are the ones that honor the
    /// hysteresis mark.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 2, 3];
    /// assert_eq!(vec.pop(), Some(3));
    /// assert_eq!(vec, [1, 2]);
    /// ```
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            cold_path();
            None
        } else {
            self.len -= 1;
            // SAFETY: the slot at the old `len - 1` is initialized.
            Some(unsafe { ptr::read(self.active_ptr().add(self.len)) })
        }
    }

    /// Inserts an element at position `index`, shifting everything after it
    /// to the right.
    ///
    /// # Panics
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec!['a', 'b', 'c'];
    /// vec.insert(1, 'd');
    /// assert_eq!(vec, ['a', 'd', 'b', 'c']);
    /// ```
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len, "insertion index should be <= len");
        let gap = self.grow_at(index, 1);
        // SAFETY: `grow_at` opened one slot at `index`.
        unsafe { ptr::write(gap, value) };
    }

    /// Inserts all elements of a slice at position `index`, shifting
    /// everything after it to the right.
    ///
    /// # Panics
    /// Panics if `index > len`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 5];
    /// vec.insert_from_slice(1, &[2, 3, 4]);
    /// assert_eq!(vec, [1, 2, 3, 4, 5]);
    /// ```
    pub fn insert_from_slice(&mut self, index: usize, other: &[T]) {
        assert!(index <= self.len, "insertion index should be <= len");
        if other.is_empty() {
            return;
        }
        let gap = self.grow_at(index, other.len());
        // SAFETY: the gap holds exactly `other.len()` slots, and `other`
        // cannot alias the active buffer while `self` is borrowed mutably.
        unsafe { ptr::copy_nonoverlapping(other.as_ptr(), gap, other.len()) };
    }

    /// Copies all elements of a slice to the back of the vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 5> = podvec![1];
    /// vec.extend_from_slice(&[2, 3, 4]);
    /// assert_eq!(vec, [1, 2, 3, 4]);
    /// ```
    #[inline]
    pub fn extend_from_slice(&mut self, other: &[T]) {
        self.insert_from_slice(self.len, other);
    }

    /// Removes and returns the element at `index`, shifting everything
    /// after it to the left.
    ///
    /// Dropping below the hysteresis mark moves the survivors back into the
    /// inline region; the heap buffer is retained for reuse.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec!['a', 'b', 'c'];
    /// assert_eq!(vec.remove(1), 'b');
    /// assert_eq!(vec, ['a', 'c']);
    /// ```
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "removal index should be < len");
        // Read before the splice possibly relocates the run.
        let value = unsafe { ptr::read(self.active_ptr().add(index)) };
        self.shrink_at(index, 1);
        value
    }

    /// Removes the given range of elements, shifting the tail to the left.
    ///
    /// # Panics
    /// Panics if the range is decreasing or reaches past `len`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 8> = podvec![1, 2, 3, 4, 5];
    /// vec.remove_range(1..4);
    /// assert_eq!(vec, [1, 5]);
    /// ```
    pub fn remove_range<B: core::ops::RangeBounds<usize>>(&mut self, range: B) {
        let (start, end) = split_range_bound(&range, self.len);
        assert!(
            start <= end && end <= self.len,
            "removal range out of bounds"
        );
        if start == end {
            return;
        }
        self.shrink_at(start, end - start);
    }

    /// Reserves capacity for at least `new_cap` elements in total.
    ///
    /// No-op when the active buffer already fits. When the current size is
    /// still below the hysteresis mark, the larger heap buffer is allocated
    /// and *held*: the inline region stays active and no copy happens, so
    /// the eventual promotion is a single move into pre-warmed memory.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::PodVec;
    /// let mut vec: PodVec<i32, 8> = PodVec::new();
    /// vec.reserve(20);
    /// assert!(vec.capacity() >= 20);
    /// assert!(!vec.is_inline());
    /// ```
    pub fn reserve(&mut self, new_cap: usize) {
        if new_cap <= self.capacity() {
            return;
        }
        match self.select_buffer(new_cap) {
            Chosen::Heap(ptr, cap) => {
                if self.len < R && matches!(self.active, Active::Inline) {
                    // Pre-warm: the buffer is held, the switch is deferred.
                    debug_assert_eq!(self.heap, ptr.as_ptr());
                    return;
                }
                let src = self.active_ptr();
                // SAFETY: the fresh buffer holds at least `len` slots and
                // does not overlap the active one.
                unsafe {
                    ptr::copy_nonoverlapping(src, ptr.as_ptr(), self.len);
                    self.commit_heap(ptr, cap);
                }
            }
            // Capacity can only grow through the heap.
            Chosen::Current | Chosen::Inline => {
                unreachable!("reserve past capacity must select a heap buffer")
            }
        }
    }

    /// Drops excess capacity.
    ///
    /// No-op when the inline region is active or the heap buffer is already
    /// exact (so calling it twice in a row does nothing the second time).
    /// When the elements fit inline, reverts and releases the heap buffer;
    /// otherwise reallocates to the exact size.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 2, 3, 4, 5, 6];
    /// assert!(!vec.is_inline());
    ///
    /// vec.remove_range(2..);
    /// vec.shrink_to_fit();
    /// assert!(vec.is_inline());
    /// assert_eq!(vec.capacity(), 4);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        if matches!(self.active, Active::Inline) {
            return;
        }
        let len = self.len;
        if len == self.heap_cap {
            return;
        }
        if len <= N {
            let src = self.heap;
            let dst = self.inline.as_mut_ptr() as *mut T;
            // SAFETY: heap and inline regions never overlap.
            unsafe { ptr::copy_nonoverlapping(src, dst, len) };
            self.active = Active::Inline;
            self.release_heap();
        } else {
            let ptr = self.alloc.allocate(Self::layout_for(len)).cast::<T>();
            // SAFETY: the exact-size buffer is fresh and disjoint.
            unsafe {
                ptr::copy_nonoverlapping(self.heap, ptr.as_ptr(), len);
                self.commit_heap(ptr, len);
            }
        }
    }

    /// Clears the vector, removing all values.
    ///
    /// With a non-zero hysteresis mark the inline region becomes active
    /// again and the heap buffer is retained for reuse; with `R = 0` only
    /// the length is cut and the active buffer is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 2> = podvec![1, 2, 3];
    /// assert!(!vec.is_inline());
    ///
    /// vec.clear();
    /// assert!(vec.is_empty());
    /// assert!(!vec.is_inline()); // R = 0: the heap buffer stays active
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        if R > 0 {
            self.active = Active::Inline;
        }
        self.len = 0;
    }

    /// Resizes the vector so that `len` equals `new_len`.
    ///
    /// Grown slots are filled with `value`; surplus elements are discarded.
    /// Both directions run through the storage selector, so shrinking below
    /// the hysteresis mark reverts to the inline region.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 5> = podvec!["hello"];
    /// vec.resize(3, "world");
    /// assert_eq!(vec, ["hello", "world", "world"]);
    ///
    /// vec.resize(1, "");
    /// assert_eq!(vec, ["hello"]);
    /// ```
    #[inline]
    pub fn resize(&mut self, new_len: usize, value: T) {
        self.resize_with(new_len, || value);
    }

    /// Resizes the vector, filling grown slots with the closure's results.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 2];
    /// let mut p = 1;
    /// vec.resize_with(4, || { p *= 2; p });
    /// assert_eq!(vec, [1, 2, 2, 4]);
    /// ```
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) {
        let old_len = self.len;
        self.relocate_for(new_len);
        if new_len > old_len {
            let base = self.active_mut_ptr();
            for index in old_len..new_len {
                // SAFETY: the target buffer holds at least `new_len` slots.
                unsafe { ptr::write(base.add(index), f()) };
            }
        }
        self.len = new_len;
    }

    /// Replaces the contents with `count` copies of `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 2, 3];
    /// vec.assign(2, 9);
    /// assert_eq!(vec, [9, 9]);
    /// ```
    pub fn assign(&mut self, count: usize, value: T) {
        let dst = self.prepare_assign(count);
        for index in 0..count {
            // SAFETY: the chosen buffer holds at least `count` slots.
            unsafe { ptr::write(dst.add(index), value) };
        }
        self.len = count;
    }

    /// Replaces the contents with a copy of a slice.
    ///
    /// # Examples
    ///
    /// ```
    /// # use podvec::{podvec, PodVec};
    /// let mut vec: PodVec<_, 4> = podvec![1, 2, 3];
    /// vec.assign_from_slice(&[7, 8]);
    /// assert_eq!(vec, [7, 8]);
    /// ```
    pub fn assign_from_slice(&mut self, other: &[T]) {
        let dst = self.prepare_assign(other.len());
        // SAFETY: disjoint per the mutable borrow of `self`.
        unsafe { ptr::copy_nonoverlapping(other.as_ptr(), dst, other.len()) };
        self.len = other.len();
    }

    // ---- internals ------------------------------------------------------

    #[inline]
    const fn uninit_inline() -> [MaybeUninit<T>; N] {
        // SAFETY: an uninitialized array of `MaybeUninit` is itself valid.
        unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() }
    }

    fn layout_for(cap: usize) -> Layout {
        match Layout::array::<T>(cap) {
            Ok(layout) => layout,
            Err(_) => panic!("capacity overflow"),
        }
    }

    #[inline]
    fn active_ptr(&self) -> *const T {
        match self.active {
            Active::Inline => self.inline.as_ptr() as *const T,
            Active::Heap => self.heap,
        }
    }

    #[inline]
    fn active_mut_ptr(&mut self) -> *mut T {
        match self.active {
            Active::Inline => self.inline.as_mut_ptr() as *mut T,
            Active::Heap => self.heap,
        }
    }

    /// The storage selector: picks the buffer that should back `desired`
    /// elements, allocating or growing the heap buffer as a side effect.
    ///
    /// A returned [`Chosen::Heap`] buffer is not yet active; the caller
    /// moves the elements and commits the switch via
    /// [`commit_heap`](Self::commit_heap).
    fn select_buffer(&mut self, desired: usize) -> Chosen<T> {
        match self.active {
            Active::Heap => {
                if desired > self.heap_cap {
                    // The active heap capacity is never zero, so the
                    // doubling terminates.
                    debug_assert!(self.heap_cap > 0);
                    let mut cap = self.heap_cap;
                    while cap < desired {
                        cap = cap.saturating_mul(2);
                    }
                    let ptr = self.alloc.allocate(Self::layout_for(cap)).cast::<T>();
                    Chosen::Heap(ptr, cap)
                } else if desired < R {
                    Chosen::Inline
                } else {
                    Chosen::Current
                }
            }
            Active::Inline => {
                if desired > N {
                    if self.heap.is_null() || self.heap_cap < desired {
                        // Nothing lives in the held buffer, so it can go
                        // before the replacement is allocated.
                        self.release_heap();
                        let cap = desired + PROMOTE_SLACK;
                        self.heap = self.alloc.allocate(Self::layout_for(cap)).cast().as_ptr();
                        self.heap_cap = cap;
                    }
                    // SAFETY: just allocated, or a retained non-null buffer.
                    Chosen::Heap(unsafe { NonNull::new_unchecked(self.heap) }, self.heap_cap)
                } else {
                    Chosen::Current
                }
            }
        }
    }

    /// Adopts `ptr` as the active heap buffer, releasing the previously
    /// active heap buffer when it is being replaced.
    ///
    /// # Safety
    /// Every element of the run must already have been moved out of the
    /// previously active buffer.
    unsafe fn commit_heap(&mut self, ptr: NonNull<T>, cap: usize) {
        if matches!(self.active, Active::Heap) && self.heap != ptr.as_ptr() {
            let layout = Self::layout_for(self.heap_cap);
            // SAFETY: the old buffer is fully evacuated and uniquely owned.
            unsafe {
                self.alloc
                    .release(NonNull::new_unchecked(self.heap).cast(), layout)
            };
        }
        self.heap = ptr.as_ptr();
        self.heap_cap = cap;
        self.active = Active::Heap;
    }

    /// Releases the held heap buffer, if any. The inline region is never
    /// passed here.
    fn release_heap(&mut self) {
        if let Some(ptr) = NonNull::new(self.heap) {
            let layout = Self::layout_for(self.heap_cap);
            // SAFETY: `heap` always originates from `alloc` with this layout.
            unsafe { self.alloc.release(ptr.cast(), layout) };
            self.heap = ptr::null_mut();
            self.heap_cap = 0;
        }
    }

    /// Splice engine, growth half: opens a gap of `count` uninitialized
    /// slots at `index` and grows the size by `count`. Returns a pointer to
    /// the gap, valid in whichever buffer ends up active.
    fn grow_at(&mut self, index: usize, count: usize) -> *mut T {
        debug_assert!(index <= self.len);
        let old_len = self.len;
        let new_len = match old_len.checked_add(count) {
            Some(new_len) => new_len,
            None => panic!("length overflow during growth"),
        };
        match self.select_buffer(new_len) {
            Chosen::Current => {
                let base = self.active_mut_ptr();
                // SAFETY: in-buffer overlapping shift of the tail.
                unsafe {
                    ptr::copy(base.add(index), base.add(index + count), old_len - index);
                    self.len = new_len;
                    base.add(index)
                }
            }
            Chosen::Inline => {
                // A pop-heavy run can leave the heap active below the
                // hysteresis mark; the gap then opens straight inline.
                debug_assert!(matches!(self.active, Active::Heap));
                let src = self.heap;
                let dst = self.inline.as_mut_ptr() as *mut T;
                // SAFETY: heap and inline regions never overlap; the gap
                // splits the run into two disjoint copies.
                unsafe {
                    ptr::copy_nonoverlapping(src, dst, index);
                    ptr::copy_nonoverlapping(
                        src.add(index),
                        dst.add(index + count),
                        old_len - index,
                    );
                    self.active = Active::Inline;
                    self.len = new_len;
                    dst.add(index)
                }
            }
            Chosen::Heap(new_ptr, cap) => {
                let src = self.active_ptr();
                let dst = new_ptr.as_ptr();
                // SAFETY: the target buffer is disjoint from the active one
                // and holds at least `new_len` slots; the old heap
                // buffer is only released after both copies.
                unsafe {
                    ptr::copy_nonoverlapping(src, dst, index);
                    ptr::copy_nonoverlapping(
                        src.add(index),
                        dst.add(index + count),
                        old_len - index,
                    );
                    self.commit_heap(new_ptr, cap);
                    self.len = new_len;
                    dst.add(index)
                }
            }
        }
    }

    /// Splice engine, shrink half: closes a gap of `count` elements
    /// starting at `index`.
    fn shrink_at(&mut self, index: usize, count: usize) {
        debug_assert!(index + count <= self.len);
        let old_len = self.len;
        let new_len = old_len - count;
        if new_len == 0 {
            self.clear();
            return;
        }
        match self.select_buffer(new_len) {
            Chosen::Current => {
                let base = self.active_mut_ptr();
                // SAFETY: in-buffer overlapping shift of the tail.
                unsafe {
                    ptr::copy(
                        base.add(index + count),
                        base.add(index),
                        old_len - index - count,
                    );
                }
                self.len = new_len;
            }
            Chosen::Inline => {
                // Reversion: retained prefix, then retained suffix, skipping
                // the removed range. The heap buffer stays warm.
                debug_assert!(matches!(self.active, Active::Heap));
                let src = self.heap;
                let dst = self.inline.as_mut_ptr() as *mut T;
                // SAFETY: heap and inline regions never overlap.
                unsafe {
                    ptr::copy_nonoverlapping(src, dst, index);
                    ptr::copy_nonoverlapping(
                        src.add(index + count),
                        dst.add(index),
                        old_len - index - count,
                    );
                }
                self.active = Active::Inline;
                self.len = new_len;
            }
            Chosen::Heap(..) => unreachable!("shrinking never grows the heap buffer"),
        }
    }

    /// Structural capacity-target transition for `resize`: moves the
    /// retained prefix to whichever buffer the selector picks. The length
    /// is left for the caller to settle.
    fn relocate_for(&mut self, new_len: usize) {
        let keep = self.len.min(new_len);
        match self.select_buffer(new_len) {
            Chosen::Current => {}
            Chosen::Inline => {
                debug_assert!(matches!(self.active, Active::Heap));
                let src = self.heap;
                let dst = self.inline.as_mut_ptr() as *mut T;
                // SAFETY: heap and inline regions never overlap.
                unsafe { ptr::copy_nonoverlapping(src, dst, keep) };
                self.active = Active::Inline;
            }
            Chosen::Heap(ptr, cap) => {
                let src = self.active_ptr();
                // SAFETY: fresh or pre-warmed buffer, disjoint from the
                // active one.
                unsafe {
                    ptr::copy_nonoverlapping(src, ptr.as_ptr(), keep);
                    self.commit_heap(ptr, cap);
                }
            }
        }
    }

    /// Clears, then returns a buffer chosen (and activated) for `count`
    /// elements. The caller fills it and settles the length.
    fn prepare_assign(&mut self, count: usize) -> *mut T {
        self.clear();
        match self.select_buffer(count) {
            Chosen::Current => self.active_mut_ptr(),
            Chosen::Inline => {
                self.active = Active::Inline;
                self.inline.as_mut_ptr() as *mut T
            }
            Chosen::Heap(ptr, cap) => {
                // SAFETY: the run is empty, nothing needs moving.
                unsafe { self.commit_heap(ptr, cap) };
                ptr.as_ptr()
            }
        }
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc + Clone> Clone for PodVec<T, N, R, A> {
    /// Duplicates the contents into a buffer sized to the source: inline if
    /// the elements fit, otherwise an exact heap allocation. The allocator
    /// value is cloned along.
    fn clone(&self) -> Self {
        let mut alloc = self.alloc.clone();
        if self.len > N {
            let cap = self.len;
            let ptr = alloc.allocate(Self::layout_for(cap)).cast::<T>();
            // SAFETY: fresh buffer of exactly `len` slots.
            unsafe { ptr::copy_nonoverlapping(self.as_ptr(), ptr.as_ptr(), self.len) };
            Self {
                active: Active::Heap,
                len: self.len,
                inline: Self::uninit_inline(),
                heap: ptr.as_ptr(),
                heap_cap: cap,
                alloc,
            }
        } else {
            let mut vec = Self::new_in(alloc);
            // SAFETY: the source fits in the inline region.
            unsafe {
                ptr::copy_nonoverlapping(
                    self.as_ptr(),
                    vec.inline.as_mut_ptr() as *mut T,
                    self.len,
                );
            }
            vec.len = self.len;
            vec
        }
    }

    /// Releases the previously owned heap buffer before adopting the
    /// source's contents and allocator.
    fn clone_from(&mut self, source: &Self) {
        self.active = Active::Inline;
        self.len = 0;
        self.release_heap();
        self.alloc = source.alloc.clone();
        let dst = if source.len > N {
            let cap = source.len;
            let ptr = self.alloc.allocate(Self::layout_for(cap)).cast::<T>();
            self.heap = ptr.as_ptr();
            self.heap_cap = cap;
            self.active = Active::Heap;
            ptr.as_ptr()
        } else {
            self.inline.as_mut_ptr() as *mut T
        };
        // SAFETY: the target holds at least `source.len` slots.
        unsafe { ptr::copy_nonoverlapping(source.as_ptr(), dst, source.len) };
        self.len = source.len;
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc + Default> Default
    for PodVec<T, N, R, A>
{
    /// Constructs a new, empty `PodVec`, equal to [`PodVec::new`].
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> Extend<T> for PodVec<T, N, R, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (hint, _) = iter.size_hint();
        self.reserve(self.len + hint);
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: 'a + Copy, const N: usize, const R: usize, A: PodAlloc> Extend<&'a T>
    for PodVec<T, N, R, A>
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (hint, _) = iter.size_hint();
        self.reserve(self.len + hint);
        for item in iter {
            self.push(*item);
        }
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc + Default> FromIterator<T>
    for PodVec<T, N, R, A>
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        vec.extend(iter);
        vec
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc + Default> From<&[T]>
    for PodVec<T, N, R, A>
{
    fn from(value: &[T]) -> Self {
        let mut vec = Self::new();
        vec.assign_from_slice(value);
        vec
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc + Default> From<&mut [T]>
    for PodVec<T, N, R, A>
{
    #[inline]
    fn from(value: &mut [T]) -> Self {
        <Self as From<&[T]>>::from(value)
    }
}

impl<T: Copy, const N: usize, const R: usize, const P: usize, A: PodAlloc + Default> From<[T; P]>
    for PodVec<T, N, R, A>
{
    #[inline]
    fn from(value: [T; P]) -> Self {
        Self::from_buf(value)
    }
}

impl<T: Copy, const N: usize, const R: usize, const P: usize, A: PodAlloc + Default> From<&[T; P]>
    for PodVec<T, N, R, A>
{
    #[inline]
    fn from(value: &[T; P]) -> Self {
        <Self as From<&[T]>>::from(value)
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> core::ops::Deref
    for PodVec<T, N, R, A>
{
    type Target = [T];
    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> core::ops::DerefMut
    for PodVec<T, N, R, A>
{
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Copy + fmt::Debug, const N: usize, const R: usize, A: PodAlloc> fmt::Debug
    for PodVec<T, N, R, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> AsRef<[T]> for PodVec<T, N, R, A> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> AsMut<[T]> for PodVec<T, N, R, A> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy, I: core::slice::SliceIndex<[T]>, const N: usize, const R: usize, A: PodAlloc>
    core::ops::Index<I> for PodVec<T, N, R, A>
{
    type Output = <I as core::slice::SliceIndex<[T]>>::Output;
    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        core::ops::Index::index(self.as_slice(), index)
    }
}

impl<T: Copy, I: core::slice::SliceIndex<[T]>, const N: usize, const R: usize, A: PodAlloc>
    core::ops::IndexMut<I> for PodVec<T, N, R, A>
{
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        core::ops::IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<'a, T: Copy, const N: usize, const R: usize, A: PodAlloc> IntoIterator
    for &'a PodVec<T, N, R, A>
{
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T: Copy, const N: usize, const R: usize, A: PodAlloc> IntoIterator
    for &'a mut PodVec<T, N, R, A>
{
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, U, const N: usize, const R: usize, A: PodAlloc> PartialEq<PodVec<U, N, R, A>>
    for PodVec<T, N, R, A>
where
    T: Copy + PartialEq<U>,
    U: Copy,
{
    #[inline]
    fn eq(&self, other: &PodVec<U, N, R, A>) -> bool {
        PartialEq::eq(self.as_slice(), other.as_slice())
    }
}

impl<T, U, const N: usize, const R: usize, A: PodAlloc> PartialEq<[U]> for PodVec<T, N, R, A>
where
    T: Copy + PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &[U]) -> bool {
        PartialEq::eq(self.as_slice(), other)
    }
}

impl<T, U, const N: usize, const R: usize, A: PodAlloc> PartialEq<&[U]> for PodVec<T, N, R, A>
where
    T: Copy + PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &&[U]) -> bool {
        PartialEq::eq(self.as_slice(), *other)
    }
}

impl<T, U, const N: usize, const R: usize, const P: usize, A: PodAlloc> PartialEq<[U; P]>
    for PodVec<T, N, R, A>
where
    T: Copy + PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &[U; P]) -> bool {
        PartialEq::eq(self.as_slice(), other.as_slice())
    }
}

impl<T, U, const N: usize, const R: usize, const P: usize, A: PodAlloc> PartialEq<&[U; P]>
    for PodVec<T, N, R, A>
where
    T: Copy + PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &&[U; P]) -> bool {
        PartialEq::eq(self.as_slice(), other.as_slice())
    }
}

impl<T: Copy + Eq, const N: usize, const R: usize, A: PodAlloc> Eq for PodVec<T, N, R, A> {}

impl<T: Copy + PartialOrd, const N: usize, const R: usize, A: PodAlloc> PartialOrd
    for PodVec<T, N, R, A>
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        PartialOrd::partial_cmp(self.as_slice(), other.as_slice())
    }
}

impl<T: Copy + Ord, const N: usize, const R: usize, A: PodAlloc> Ord for PodVec<T, N, R, A> {
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        Ord::cmp(self.as_slice(), other.as_slice())
    }
}

impl<T: Copy + core::hash::Hash, const N: usize, const R: usize, A: PodAlloc> core::hash::Hash
    for PodVec<T, N, R, A>
{
    #[inline]
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        core::hash::Hash::hash(self.as_slice(), state);
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> IntoIterator for PodVec<T, N, R, A> {
    type Item = T;
    type IntoIter = IntoIter<T, N, R, A>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        let back = self.len;
        IntoIter {
            vec: self,
            front: 0,
            back,
        }
    }
}

/// An iterator that consumes a [`PodVec`] and yields its items by value.
///
/// # Examples
///
/// ```
/// # use podvec::{podvec, PodVec};
/// let vec: PodVec<i32, 3> = podvec![1, 2, 3];
/// let mut iter = vec.into_iter();
///
/// assert_eq!(iter.next(), Some(1));
/// assert_eq!(iter.next_back(), Some(3));
/// assert_eq!(iter.len(), 1);
/// ```
#[derive(Clone)]
pub struct IntoIter<T: Copy, const N: usize, const R: usize = 0, A: PodAlloc = SysAlloc> {
    vec: PodVec<T, N, R, A>,
    front: usize,
    back: usize,
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> IntoIter<T, N, R, A> {
    /// The remaining items as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.vec.as_slice()[self.front..self.back]
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> Iterator for IntoIter<T, N, R, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            None
        } else {
            let item = self.vec.as_slice()[self.front];
            self.front += 1;
            Some(item)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> DoubleEndedIterator
    for IntoIter<T, N, R, A>
{
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            None
        } else {
            self.back -= 1;
            Some(self.vec.as_slice()[self.back])
        }
    }
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> ExactSizeIterator
    for IntoIter<T, N, R, A>
{
}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc> FusedIterator for IntoIter<T, N, R, A> {}

impl<T: Copy, const N: usize, const R: usize, A: PodAlloc + Default> Default
    for IntoIter<T, N, R, A>
{
    fn default() -> Self {
        PodVec::new().into_iter()
    }
}

impl<T: Copy + fmt::Debug, const N: usize, const R: usize, A: PodAlloc> fmt::Debug
    for IntoIter<T, N, R, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::allocator::CountingAlloc;
    use crate::{podvec, PodVec};
    use core::mem;

    #[test]
    fn starts_empty_and_inline() {
        let vec: PodVec<i32, 4> = PodVec::new();
        assert!(vec.is_empty());
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.capacity(), 4);
        assert!(vec.is_inline());
    }

    #[test]
    fn push_pop_round_trip_restores_the_prefix() {
        let mut vec: PodVec<i32, 4> = podvec![10, 20];
        vec.push(30);
        vec.push(40);
        vec.push(50); // spills
        assert_eq!(vec.pop(), Some(50));
        assert_eq!(vec.pop(), Some(40));
        assert_eq!(vec.pop(), Some(30));
        assert_eq!(vec.as_slice(), [10, 20]);
        assert_eq!(vec.pop(), Some(20));
        assert_eq!(vec.pop(), Some(10));
        assert_eq!(vec.pop(), None);
    }

    #[test]
    fn crossing_the_inline_boundary() {
        let mut vec: PodVec<i32, 4> = PodVec::new();
        for value in 1..=4 {
            vec.push(value);
        }
        assert!(vec.is_inline());
        assert_eq!(vec.capacity(), 4);

        vec.push(5);
        assert!(!vec.is_inline());
        assert_eq!(vec.len(), 5);
        assert!(vec.capacity() >= 5);
        assert_eq!(vec.as_slice(), [1, 2, 3, 4, 5]);
        assert_eq!(*vec.first().unwrap(), 1);
        assert_eq!(*vec.last().unwrap(), 5);
    }

    #[test]
    fn hysteresis_band_is_sticky() {
        let mut vec: PodVec<i32, 4, 2> = PodVec::new();
        vec.extend([1, 2, 3, 4, 5]);
        assert!(!vec.is_inline());
        let heap_cap = vec.capacity();

        // Size 3 sits inside the band: no reversion.
        vec.remove_range(3..);
        assert_eq!(vec.as_slice(), [1, 2, 3]);
        assert!(!vec.is_inline());
        assert_eq!(vec.capacity(), heap_cap);

        // Size 1 drops below the mark: back to the inline region.
        vec.remove_range(1..);
        assert_eq!(vec.as_slice(), [1]);
        assert!(vec.is_inline());
        assert_eq!(vec.capacity(), 4);
    }

    #[test]
    fn pop_never_reverts_but_the_next_splice_does() {
        let mut vec: PodVec<i32, 4, 2> = PodVec::new();
        vec.extend([1, 2, 3, 4, 5]);
        assert!(!vec.is_inline());

        while vec.pop().is_some() {}
        // Popping is a plain length cut.
        assert!(!vec.is_inline());

        vec.push(7);
        // The push went through the selector: size 1 < R, so it landed
        // inline.
        assert!(vec.is_inline());
        assert_eq!(vec.as_slice(), [7]);
    }

    #[test]
    fn insert_at_end_splices_like_the_tail() {
        let mut vec: PodVec<i32, 4> = PodVec::new();
        vec.extend(1..=8);
        let former_len = vec.len();
        vec.insert_from_slice(former_len, &[9, 9, 9, 9, 9]);
        assert_eq!(vec.as_slice(), [1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 9, 9]);
    }

    #[test]
    fn insert_in_the_middle_across_the_boundary() {
        let mut vec: PodVec<i32, 4> = podvec![1, 3, 6, 7];
        assert!(vec.is_inline());
        vec.insert(1, 2); // forces the spill mid-splice
        assert!(!vec.is_inline());
        assert_eq!(vec.as_slice(), [1, 2, 3, 6, 7]);

        vec.insert(3, 5);
        vec.insert(3, 4);
        assert_eq!(vec.as_slice(), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn erase_range_keeps_the_head() {
        let mut vec: PodVec<i32, 4> = PodVec::new();
        vec.extend(1..=8);
        vec.extend_from_slice(&[9, 9, 9, 9, 9]);
        vec.remove_range(1..);
        assert_eq!(vec.as_slice(), [1]);
    }

    #[test]
    fn remove_single_elements() {
        let mut vec: PodVec<i32, 4> = podvec![2, 3];
        vec.push(5);
        vec.push(6);
        vec.push(7);
        assert_eq!(vec.as_slice(), [2, 3, 5, 6, 7]);

        assert_eq!(vec.remove(0), 2);
        assert_eq!(vec.as_slice(), [3, 5, 6, 7]);
        assert_eq!(vec.remove(1), 5);
        assert_eq!(vec.as_slice(), [3, 6, 7]);
    }

    #[test]
    fn empty_range_removal_is_a_no_op() {
        let mut vec: PodVec<i32, 4, 2> = PodVec::new();
        vec.extend([1, 2, 3, 4, 5]);
        vec.remove_range(2..2);
        assert_eq!(vec.as_slice(), [1, 2, 3, 4, 5]);
        assert!(!vec.is_inline());
    }

    #[test]
    #[should_panic(expected = "removal range out of bounds")]
    fn decreasing_range_panics() {
        let mut vec: PodVec<i32, 4> = podvec![1, 2, 3];
        vec.remove_range(2..1);
    }

    #[test]
    #[should_panic(expected = "insertion index should be <= len")]
    fn insert_past_len_panics() {
        let mut vec: PodVec<i32, 4> = podvec![1];
        vec.insert(2, 9);
    }

    #[test]
    fn allocator_accounting_matches_capacity_upgrades() {
        let counting = CountingAlloc::new();
        {
            let mut vec: PodVec<i32, 16, 8, CountingAlloc> = PodVec::new_in(counting.clone());

            let twenty: [i32; 20] = core::array::from_fn(|i| i as i32 + 1);
            vec.insert_from_slice(0, &twenty);
            assert_eq!(vec.len(), 20);
            // One promotion, one allocation.
            assert_eq!(counting.allocations(), 1);

            // Shrink inside the band, then below the mark.
            vec.remove_range(10..);
            assert!(!vec.is_inline());
            vec.remove_range(0..3);
            assert!(vec.is_inline());
            assert_eq!(vec.capacity(), 16);
            // The heap buffer is retained, not released.
            assert_eq!(counting.releases(), 0);

            // Spilling again fits in the retained buffer: no new allocation.
            vec.extend_from_slice(&[0; 10]);
            assert_eq!(vec.len(), 17);
            assert!(!vec.is_inline());
            assert_eq!(counting.allocations(), 1);

            // Growing past the retained capacity allocates and releases.
            vec.extend_from_slice(&[0; 12]);
            assert_eq!(vec.len(), 29);
            assert_eq!(counting.allocations(), 2);
            assert_eq!(counting.releases(), 1);
        }
        // Destruction balances the books.
        assert!(counting.balanced());
    }

    #[test]
    fn reserve_pre_warms_without_switching() {
        let counting = CountingAlloc::new();
        let mut vec: PodVec<i32, 4, 2, CountingAlloc> = PodVec::new_in(counting.clone());

        vec.reserve(10);
        assert_eq!(counting.allocations(), 1);
        // Below the low-water mark the inline region stays active.
        assert!(vec.is_inline());
        assert_eq!(vec.capacity(), 4);

        vec.extend([1, 2, 3, 4, 5]);
        // The promotion reused the pre-warmed buffer.
        assert!(!vec.is_inline());
        assert_eq!(counting.allocations(), 1);
        assert_eq!(vec.as_slice(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn reserve_activates_when_past_the_mark() {
        let mut vec: PodVec<i32, 4> = podvec![1, 2, 3];
        vec.reserve(8);
        // R = 0: no pre-warm band, the heap buffer becomes active at once.
        assert!(!vec.is_inline());
        assert!(vec.capacity() >= 8);
        assert_eq!(vec.as_slice(), [1, 2, 3]);

        let cap = vec.capacity();
        vec.reserve(5);
        assert_eq!(vec.capacity(), cap);
    }

    #[test]
    fn shrink_to_fit_is_idempotent() {
        let mut vec: PodVec<i32, 4> = PodVec::new();
        vec.extend(1..=13);
        assert!(vec.capacity() > 13);

        vec.shrink_to_fit();
        assert_eq!(vec.capacity(), 13);
        assert_eq!(vec.len(), 13);

        vec.shrink_to_fit();
        assert_eq!(vec.capacity(), 13);
        assert_eq!(vec.as_slice()[..4], [1, 2, 3, 4]);
    }

    #[test]
    fn shrink_to_fit_reverts_when_the_elements_fit() {
        let counting = CountingAlloc::new();
        let mut vec: PodVec<i32, 4, 0, CountingAlloc> = PodVec::new_in(counting.clone());
        vec.extend([1, 2, 3, 4, 5]);
        vec.remove_range(1..);
        // R = 0: still heap-backed after the erase.
        assert!(!vec.is_inline());

        vec.shrink_to_fit();
        assert!(vec.is_inline());
        assert_eq!(vec.capacity(), 4);
        assert_eq!(vec.as_slice(), [1]);
        assert!(counting.balanced());

        vec.shrink_to_fit();
        assert!(vec.is_inline());
    }

    #[test]
    fn clear_semantics_depend_on_the_mark() {
        let mut sticky: PodVec<i32, 4> = PodVec::new();
        sticky.extend([1, 2, 3, 4, 5]);
        sticky.clear();
        assert!(sticky.is_empty());
        assert!(!sticky.is_inline());

        let mut reverting: PodVec<i32, 4, 2> = PodVec::new();
        reverting.extend([1, 2, 3, 4, 5]);
        reverting.clear();
        assert!(reverting.is_empty());
        assert!(reverting.is_inline());
        assert_eq!(reverting.capacity(), 4);
    }

    #[test]
    fn clear_retains_the_heap_buffer_for_reuse() {
        let counting = CountingAlloc::new();
        let mut vec: PodVec<i32, 4, 2, CountingAlloc> = PodVec::new_in(counting.clone());
        vec.extend([1, 2, 3, 4, 5]);
        assert_eq!(counting.allocations(), 1);

        vec.clear();
        assert_eq!(counting.releases(), 0);

        vec.extend([1, 2, 3, 4, 5]);
        // The retained buffer served the second spill.
        assert_eq!(counting.allocations(), 1);
    }

    #[test]
    fn resize_grows_and_shrinks_through_the_selector() {
        let mut vec: PodVec<i32, 4, 2> = podvec![1, 2, 3];
        vec.resize(6, 9);
        assert_eq!(vec.as_slice(), [1, 2, 3, 9, 9, 9]);
        assert!(!vec.is_inline());

        vec.resize(3, 0);
        assert_eq!(vec.as_slice(), [1, 2, 3]);
        assert!(!vec.is_inline()); // inside the band

        vec.resize(1, 0);
        assert_eq!(vec.as_slice(), [1]);
        assert!(vec.is_inline()); // below the mark
    }

    #[test]
    fn resize_with_fills_in_order() {
        let mut vec: PodVec<i32, 4> = podvec![];
        let mut p = 1;
        vec.resize_with(4, || {
            p *= 2;
            p
        });
        assert_eq!(vec.as_slice(), [2, 4, 8, 16]);
        assert!(vec.is_inline());
    }

    #[test]
    fn assign_replaces_contents() {
        let mut vec: PodVec<i32, 4> = podvec![1, 2, 3];
        vec.assign(6, 4);
        assert_eq!(vec.as_slice(), [4, 4, 4, 4, 4, 4]);
        assert!(!vec.is_inline());

        vec.assign_from_slice(&[1, 2]);
        assert_eq!(vec.as_slice(), [1, 2]);
    }

    #[test]
    fn clone_is_independent_of_the_source() {
        let mut vec: PodVec<i32, 2> = PodVec::from_elem(4, 6);
        let mut copy = vec.clone();
        assert_eq!(copy.as_slice(), [4, 4, 4, 4, 4, 4]);
        // An exact-size duplicate, not a capacity duplicate.
        assert_eq!(copy.capacity(), 6);

        copy.push(5);
        copy[0] = 0;
        assert_eq!(vec.as_slice(), [4, 4, 4, 4, 4, 4]);
        assert_eq!(copy.as_slice(), [0, 4, 4, 4, 4, 4, 5]);

        vec.clone_from(&copy);
        assert_eq!(vec.as_slice(), [0, 4, 4, 4, 4, 4, 5]);
    }

    #[test]
    fn clone_from_releases_the_old_buffer() {
        let counting = CountingAlloc::new();
        {
            let mut a: PodVec<i32, 2, 0, CountingAlloc> = PodVec::new_in(counting.clone());
            a.extend([1, 2, 3, 4]);
            let b: PodVec<i32, 2, 0, CountingAlloc> = PodVec::new_in(counting.clone());
            a.clone_from(&b);
            assert!(a.is_empty());
            assert!(a.is_inline());
        }
        assert!(counting.balanced());
    }

    #[test]
    fn take_leaves_an_empty_inline_vector() {
        let mut vec: PodVec<i32, 2> = PodVec::new();
        vec.extend([1, 2, 3, 4]);
        assert!(!vec.is_inline());

        let moved = mem::take(&mut vec);
        assert_eq!(moved.as_slice(), [1, 2, 3, 4]);
        assert!(!moved.is_inline());

        assert!(vec.is_empty());
        assert!(vec.is_inline());
        assert_eq!(vec.capacity(), 2);
    }

    #[test]
    fn struct_elements_round_trip() {
        #[derive(Clone, Copy, Debug, PartialEq)]
        struct S {
            t: i32,
            h: i32,
            g: i32,
        }

        let mut vec: PodVec<S, 4> = PodVec::new();
        vec.push(S { t: 1, h: 10, g: 100 });
        assert_eq!(vec.len(), 1);
        assert_eq!(vec[0], S { t: 1, h: 10, g: 100 });
    }

    #[test]
    fn zero_sized_elements() {
        let mut vec: PodVec<(), 2> = PodVec::new();
        for _ in 0..100 {
            vec.push(());
        }
        assert_eq!(vec.len(), 100);
        assert!(!vec.is_inline());
        assert_eq!(vec.pop(), Some(()));
        vec.remove_range(10..);
        assert_eq!(vec.len(), 10);
    }

    #[test]
    fn into_iter_is_double_ended() {
        let vec: PodVec<i32, 4> = podvec![1, 2, 3, 4];
        let mut iter = vec.into_iter();
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.as_slice(), [2, 3]);
        assert_eq!(iter.len(), 2);
        let rest: alloc::vec::Vec<i32> = iter.collect();
        assert_eq!(rest, [2, 3]);
    }

    #[test]
    fn iterate_erase_pattern_flips_to_inline() {
        // Mirrors the classic erase-while-iterating loop, by index.
        let mut vec: PodVec<i32, 6, 3> = PodVec::new();
        vec.extend(1..=7);

        let mut index = 0;
        while index < vec.len() {
            if vec[index] % 2 == 0 {
                vec.remove(index);
            } else {
                index += 1;
            }
        }
        assert_eq!(vec.as_slice(), [1, 3, 5, 7]);
        assert!(!vec.is_inline());

        let mut index = 0;
        while index < vec.len() {
            if vec[index] == 1 || vec[index] == 5 {
                vec.remove(index);
            } else {
                index += 1;
            }
        }
        assert_eq!(vec.as_slice(), [3, 7]);
        assert!(vec.is_inline());
    }

    #[test]
    fn spare_capacity_raw_fill() {
        let mut vec: PodVec<u32, 8> = PodVec::new();
        vec.reserve(16);
        let spare = vec.spare_capacity_mut();
        assert!(spare.len() >= 16);
        for (i, slot) in spare.iter_mut().take(10).enumerate() {
            slot.write(i as u32);
        }
        unsafe { vec.set_len(10) };
        assert_eq!(vec.as_slice(), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn comparisons_and_ordering() {
        let a: PodVec<i32, 4> = podvec![1, 2, 3];
        let b: PodVec<i32, 4> = podvec![1, 2, 4];
        assert!(a < b);
        assert_eq!(a, [1, 2, 3]);
        assert_eq!(a, &[1, 2, 3][..]);
        assert_ne!(a, b);
    }
}
