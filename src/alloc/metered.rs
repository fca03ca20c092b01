use core::sync::atomic::{AtomicUsize, Ordering};

use crate::block::{Block, Layout};
use crate::error::Result;

use super::heap::Heap;
use super::hold::{Hint, Hold};

/// Accounting wrapper around another [`Hold`].
///
/// Tracks the number of live allocations, the number of bytes currently
/// allocated, and the high-water mark of allocated bytes. Counters are
/// updated with relaxed atomics; they observe a consistent total but
/// impose no ordering on the underlying allocations.
#[derive(Debug)]
pub struct Metered<H: Hold = Heap> {
    base: H,
    /// Number of currently allocated blocks.
    live: AtomicUsize,
    /// Number of currently allocated bytes.
    used: AtomicUsize,
    /// Most bytes ever concurrently allocated.
    peak: AtomicUsize,
}

impl<H: Hold> Metered<H> {
    #[inline]
    pub const fn new(base: H) -> Metered<H> {
        Metered {
            base,
            live: AtomicUsize::new(0),
            used: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Returns the number of blocks currently allocated and not yet freed.
    #[inline]
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes currently allocated and not yet freed.
    #[inline]
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    /// Returns the most bytes ever concurrently allocated.
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Returns a reference to the wrapped hold.
    #[inline]
    pub fn base(&self) -> &H {
        &self.base
    }

    #[inline]
    fn credit(&self, size: usize) {
        self.live.fetch_add(1, Ordering::Relaxed);
        let used = self.used.fetch_add(size, Ordering::Relaxed) + size;
        self.peak.fetch_max(used, Ordering::Relaxed);
    }

    #[inline]
    fn debit(&self, size: usize) {
        self.live.fetch_sub(1, Ordering::Relaxed);
        self.used.fetch_sub(size, Ordering::Relaxed);
    }
}

impl Default for Metered<Heap> {
    #[inline]
    fn default() -> Metered<Heap> {
        Metered::new(Heap::new())
    }
}

unsafe impl<H: Hold> Hold for Metered<H> {
    unsafe fn alloc(&self, layout: Layout) -> Result<Block> {
        let block = self.base.alloc(layout)?;
        self.credit(block.size());
        Ok(block)
    }

    unsafe fn resize_in_place(&self, block: Block, new_size: usize) -> Result<usize> {
        let size = self.base.resize_in_place(block, new_size)?;
        if size >= block.size() {
            let grown = size - block.size();
            let used = self.used.fetch_add(grown, Ordering::Relaxed) + grown;
            self.peak.fetch_max(used, Ordering::Relaxed);
        } else {
            self.used.fetch_sub(block.size() - size, Ordering::Relaxed);
        }
        Ok(size)
    }

    unsafe fn realloc(&self, block: Block, new_layout: Layout) -> Result<Block> {
        let new_block = self.base.realloc(block, new_layout)?;
        self.debit(block.size());
        self.credit(new_block.size());
        Ok(new_block)
    }

    unsafe fn dealloc(&self, block: Block, layout: Layout) {
        self.debit(block.size());
        self.base.dealloc(block, layout);
    }

    fn advise(&self, block: Block, hint: Hint) {
        self.base.advise(block, hint);
    }
}
