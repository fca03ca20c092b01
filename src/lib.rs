//! # Fallible Memory Runtime
//!
//! A memory management runtime in which every allocation, construction,
//! growth, and deep copy is an explicit, recoverable operation. Nothing in
//! this crate aborts on resource exhaustion; every fallible path surfaces a
//! typed [`Error`] the caller can handle.
//!
//! ## Design goals
//!
//! __Recoverable__
//! Out-of-memory is an ordinary error value, not a process abort. Failed
//! operations leave their target observably unchanged.
//!
//! __Explicit__
//! Every owning type names the [`Hold`] it allocates from and returns its
//! memory there. No allocation happens behind an innocuous-looking call.
//!
//! __Transactional__
//! Compound operations either complete or roll back: a failed element
//! construction destroys already-built elements in reverse order and
//! releases the memory before the error propagates.
//!
//! __Address-stability aware__
//! Growth first asks the allocator to extend a block in place; element
//! types opt into bulk byte relocation through the [`Relocatable`] marker,
//! and everything else moves one element at a time.
//!
//! __Concurrent__
//! Reference counting uses lock-free atomics; handles may be shared and
//! dropped from any thread.
//!
//! ## Components
//!
//! __Physical memory model__
//! Types for working with extents of raw memory:
//!
//! - __[`Block`]__: the address and size of a particular memory block.
//! - __[`Layout`]__: size and alignment constraints for a memory block.
//!
//! __Logical memory model__
//! The allocator contract and its backends:
//!
//! - __[`Hold`]__: the fallible allocator every owning type draws from.
//! - __[`Heap`]__: process-lifetime `Hold` backed by the system allocator.
//! - __[`Metered`]__: accounting wrapper tracking live blocks and bytes.
//!
//! __Construction model__
//! Uniform fallible construction and deep copy:
//!
//! - __[`Construct`]__: strategy dispatcher for building values in place.
//! - __[`TryClone`]__ / __[`CloneIntoHold`]__: fallible deep copy, within
//!   one hold or across holds.
//!
//! __Managed containers__
//! Owning types that store their hold alongside their block:
//!
//! - __[`RawBuf`]__: growable element buffer.
//! - __[`RawString`]__: growable NUL-terminated UTF-8 string.
//! - __[`RawBox`]__: single value allocation.
//!
//! __Reference counting__
//! Atomically counted handles:
//!
//! - __[`Shared`]__: strong handle; keeps the value alive.
//! - __[`Weak`]__: observing handle; upgraded before use.
//! - __[`SharedFromSelf`]__: lets a value hand out handles to itself.
//!
//! [`Error`]: error::Error
//! [`Block`]: block::Block
//! [`Layout`]: block::Layout
//! [`Hold`]: alloc::Hold
//! [`Heap`]: alloc::Heap
//! [`Metered`]: alloc::Metered
//! [`Construct`]: construct::Construct
//! [`TryClone`]: construct::TryClone
//! [`CloneIntoHold`]: construct::CloneIntoHold
//! [`Relocatable`]: raw::Relocatable
//! [`RawBuf`]: raw::RawBuf
//! [`RawString`]: raw::RawString
//! [`RawBox`]: raw::RawBox
//! [`Shared`]: shared::Shared
//! [`Weak`]: shared::Weak
//! [`SharedFromSelf`]: shared::SharedFromSelf

pub mod alloc;
pub mod block;
pub mod construct;
pub mod error;
pub mod raw;
pub mod shared;
pub mod trap;

pub use crate::error::{Error, Result};
