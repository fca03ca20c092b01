use core::cmp;
use core::ptr;

use crate::block::{Block, Layout};
use crate::error::Result;

use super::heap::Heap;

/// Best-effort usage hint passed to [`Hold::advise`].
///
/// Hints never affect correctness; a backend without support for a hint
/// silently ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hint {
    /// Default behavior.
    Normal,
    /// Expecting to read from start to finish.
    Sequential,
    /// No predictable access pattern.
    Random,
    /// Load the pages now.
    WillNeed,
    /// The memory may be reclaimed if the system is under pressure.
    DontNeed,
    /// The memory is unlikely to be touched soon.
    Cold,
    /// Attempt to back the region with huge pages.
    HugePages,
}

/// Fallible memory allocator.
///
/// Every managed entity in this crate obtains memory exclusively through a
/// `Hold`. All growth paths are explicit: `alloc` and `realloc` fail with
/// `AllocationFailed`, `resize_in_place` fails with `InPlaceGrowthFailed`
/// when the backend cannot keep the address stable (most backends
/// legitimately always fail it; it is an optimization hook, not a
/// requirement), and `dealloc` is infallible.
///
/// Implementations must honor the requested alignment of every `Layout`.
/// Backends shared between threads must themselves be safe for concurrent
/// calls; the trait does not impose that bound.
///
/// # Safety
///
/// Implementations must return blocks that are valid for the requested
/// layout, and must accept back exactly the blocks they produced. Callers
/// must pass each block back to the hold instance that produced it.
pub unsafe trait Hold {
    /// Returns an uninitialized memory block sized and aligned to `layout`;
    /// fails with `AllocationFailed` if the request cannot be satisfied.
    ///
    /// # Safety
    ///
    /// The caller takes ownership of the returned block and must eventually
    /// pass it back to this hold.
    unsafe fn alloc(&self, layout: Layout) -> Result<Block>;

    /// Attempts to grow `block` to `new_size` bytes without moving it;
    /// returns the resulting size on success, or `InPlaceGrowthFailed` if
    /// the backend cannot guarantee a stable address.
    ///
    /// # Safety
    ///
    /// `block` must have been produced by this hold and still be live.
    unsafe fn resize_in_place(&self, block: Block, new_size: usize) -> Result<usize>;

    /// Resizes `block` to fit `new_layout`, moving it if necessary. May
    /// return the same address (when in-place growth succeeded internally)
    /// or a new block holding a copy of the old bytes; fails with
    /// `AllocationFailed`.
    ///
    /// # Safety
    ///
    /// `block` must have been produced by this hold and still be live, and
    /// `new_layout` must carry the alignment the block was allocated with.
    /// On success ownership of the old block has been released.
    unsafe fn realloc(&self, block: Block, new_layout: Layout) -> Result<Block> {
        if let Ok(new_size) = self.resize_in_place(block, new_layout.size()) {
            return Ok(Block::from_raw_parts(block.as_ptr(), new_size));
        }
        let new_block = self.alloc(new_layout)?;
        ptr::copy_nonoverlapping(
            block.as_ptr(),
            new_block.as_ptr(),
            cmp::min(block.size(), new_layout.size()),
        );
        self.dealloc(block, new_layout.resized(block.size()));
        Ok(new_block)
    }

    /// Releases a memory `block` allocated by this hold. Infallible: a
    /// failure here is unrecoverable and must not be signaled through the
    /// result type.
    ///
    /// # Safety
    ///
    /// `block` must have been produced by this hold with `layout`, must be
    /// live, and must not be used after this call.
    unsafe fn dealloc(&self, block: Block, layout: Layout);

    /// Advises the backend about the expected usage of `block`. Optional,
    /// infallible, best-effort.
    fn advise(&self, _block: Block, _hint: Hint) {}
}

static GLOBAL: Heap = Heap::new();

/// Returns the process-lifetime default `Hold`.
///
/// This is the single convenience entry point for callers that do not
/// thread an explicit hold; everything else in the public API takes the
/// hold as an argument.
#[inline]
pub fn global() -> &'static dyn Hold {
    &GLOBAL
}
