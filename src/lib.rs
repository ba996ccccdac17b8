//! ## Intro
//!
//! A small-buffer vector for plain-old-data element types.
//!
//! [`PodVec`] keeps up to `N` elements inline in the container value, with no
//! heap allocation, and transparently moves to a heap buffer once that
//! capacity is exceeded. Because the element type is required to be trivially
//! copyable (`T: Copy`), every relocation is a flat byte copy; there are no
//! element constructors, destructors or assignment hooks to run.
//!
//! Many workloads have collections that fit comfortably in a fixed inline
//! buffer but occasionally need to grow larger. Inline storage is much faster
//! than heap allocation, both for cache locality and allocator overhead, and
//! `PodVec` gives you that for the common case with zero cost.
//!
//! ```
//! use podvec::{podvec, PodVec};
//!
//! let mut vec: PodVec<i32, 4> = podvec![1, 2, 3];
//! assert!(vec.is_inline());
//!
//! // Pushing past the inline capacity spills to the heap.
//! vec.extend([4, 5, 6]);
//! assert!(!vec.is_inline());
//! assert_eq!(vec, [1, 2, 3, 4, 5, 6]);
//! ```
//!
//! ## Hysteresis
//!
//! The second const parameter `R` is a revert-to-inline low-water mark.
//! While a heap-backed vector shrinks, it does **not** flip back to inline
//! storage as soon as the elements would fit again, only once the size drops
//! below `R`. This keeps workloads that oscillate around the capacity
//! boundary from copying the buffer back and forth on every step.
//!
//! ```
//! # use podvec::PodVec;
//! let mut vec: PodVec<i32, 4, 2> = PodVec::new();
//! vec.extend([1, 2, 3, 4, 5]);
//! assert!(!vec.is_inline());
//!
//! vec.remove_range(3..);      // size 3: inside the hysteresis band
//! assert!(!vec.is_inline());
//!
//! vec.remove_range(1..);      // size 1: below the mark, back inline
//! assert!(vec.is_inline());
//! assert_eq!(vec.capacity(), 4);
//! ```
//!
//! With `R = 0` (the default) the vector never reverts implicitly; once
//! promoted it stays heap-backed until an explicit [`shrink_to_fit`].
//!
//! ## Allocators
//!
//! All heap traffic flows through the [`PodAlloc`] boundary. The default
//! [`SysAlloc`] uses the global allocator and aborts on failure; a
//! [`CountingAlloc`] is provided for instrumenting allocation traffic, and
//! any substitute can be injected per instance via [`PodVec::new_in`].
//!
//! ## Error handling
//!
//! This crate is fail-fast: out-of-range indices and malformed ranges panic,
//! and allocation failure aborts the process. `pop` and the slice accessors
//! (`get`, `first`, `last`) are the checked alternatives. There is no
//! `Result` channel at this layer.
//!
//! ## `no_std` support
//!
//! This crate requires only `core` and `alloc`, making it suitable for
//! embedded and no_std environments.
//!
//! ## Optional features
//!
//! ### `serde`
//!
//! When this optional dependency is enabled, [`PodVec`] implements the
//! [`serde::Serialize`] and [`serde::Deserialize`] traits, encoding itself
//! as a plain sequence.
//!
//! [`shrink_to_fit`]: PodVec::shrink_to_fit
//! [`serde::Serialize`]: https://docs.rs/serde/latest/serde/trait.Serialize.html
//! [`serde::Deserialize`]: https://docs.rs/serde/latest/serde/trait.Deserialize.html
#![no_std]

extern crate alloc;

mod utils;

pub mod allocator;

#[cfg(feature = "serde")]
mod serde;

#[doc(inline)]
pub use allocator::{CountingAlloc, PodAlloc, SysAlloc};

pub mod pod_vec;
#[doc(inline)]
pub use pod_vec::PodVec;
